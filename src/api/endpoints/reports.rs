//! Medical report endpoints.
//!
//! - `POST /api/reports` — practitioners and admins
//! - `GET /api/reports/user/:id`

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::types::{parse_id, ApiContext};
use crate::authorization::CallerContext;
use crate::models::{Report, ReportWithPractitioner};
use crate::report::{self, DocumentSink, ReportInput};

#[derive(Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub report: Report,
}

/// `POST /api/reports`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(input): ApiJson<ReportInput>,
) -> Result<Json<ReportResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let dir = ctx.core.config.reports_dir();
    let sink = DocumentSink {
        renderer: ctx.core.renderer(),
        dir: &dir,
    };
    let report = report::create(&conn, &caller, input, &sink)?;
    Ok(Json(ReportResponse {
        success: true,
        report,
    }))
}

#[derive(Serialize)]
pub struct ReportsResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<ReportWithPractitioner>,
}

/// `GET /api/reports/user/:id` — newest first.
pub async fn list_for_account(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<ReportsResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let data = report::list_for_account(&conn, &id, ctx.empty_as_not_found())?;
    Ok(Json(ReportsResponse {
        success: true,
        count: data.len(),
        data,
    }))
}
