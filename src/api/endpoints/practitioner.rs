//! Practitioner workspace endpoints.
//!
//! - `GET /api/practitioner/dashboard` — practitioner role gate
//! - `GET /api/practitioner/profile` — practitioner role gate
//! - `PATCH /api/practitioner/update-profile/:id` — self or admin

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::account::{self, ProfileUpdate};
use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::types::{parse_id, ApiContext};
use crate::authorization::CallerContext;
use crate::dashboard::{self, PractitionerDashboard};
use crate::models::Account;

#[derive(Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub dashboard: PractitionerDashboard,
}

/// `GET /api/practitioner/dashboard`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let today = chrono::Utc::now().date_naive();
    let dashboard = dashboard::practitioner_dashboard(&conn, &caller, today)?;
    Ok(Json(DashboardResponse {
        success: true,
        dashboard,
    }))
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub practitioner: Account,
}

/// `GET /api/practitioner/profile` — the caller's own account.
pub async fn profile(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let practitioner = account::get_account(&conn, &caller.account_id)?;
    Ok(Json(ProfileResponse {
        success: true,
        practitioner,
    }))
}

/// `PATCH /api/practitioner/update-profile/:id`
pub async fn update_profile(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let practitioner = account::update_profile(&conn, &caller, &id, update)?;
    Ok(Json(ProfileResponse {
        success: true,
        practitioner,
    }))
}
