//! Administrator endpoints, behind the admin role gate.
//!
//! - `GET /api/admin/dashboard`
//! - `GET /api/admin/payments`
//! - `PUT /api/admin/users/:id` — change role
//! - `DELETE /api/admin/users/:id` (shared with `users::delete`)
//! - `PUT /api/admin/appointments/:id` — status and date

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::account;
use crate::api::endpoints::payments::PaymentsResponse;
use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::types::{parse_id, ApiContext};
use crate::appointment::{self, AdminAppointmentUpdate};
use crate::authorization::CallerContext;
use crate::dashboard::{self, AdminDashboard};
use crate::models::{Account, Appointment};
use crate::payment;

#[derive(Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub dashboard: AdminDashboard,
}

/// `GET /api/admin/dashboard` — all figures computed per call.
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let dashboard = dashboard::admin_dashboard(&conn, &caller)?;
    Ok(Json(DashboardResponse {
        success: true,
        dashboard,
    }))
}

/// `GET /api/admin/payments` — every payment, newest first.
pub async fn payments(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<PaymentsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let payments = payment::list_all(&conn, &caller)?;
    Ok(Json(PaymentsResponse::new(payments)))
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RoleChange {
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: Account,
}

/// `PUT /api/admin/users/:id`
pub async fn change_role(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(change): ApiJson<RoleChange>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let user = account::change_role(&conn, &caller, &id, change.role.as_deref())?;
    Ok(Json(UserResponse { success: true, user }))
}

#[derive(Serialize)]
pub struct AppointmentResponse {
    pub success: bool,
    pub appointment: Appointment,
}

/// `PUT /api/admin/appointments/:id`
pub async fn update_appointment(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<AdminAppointmentUpdate>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let appointment = appointment::admin_update(&conn, &caller, &id, input)?;
    Ok(Json(AppointmentResponse {
        success: true,
        appointment,
    }))
}
