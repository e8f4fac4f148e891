//! Unauthenticated practitioner directory.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::account;
use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext};
use crate::models::PractitionerCard;

#[derive(Serialize)]
pub struct DirectoryResponse {
    pub success: bool,
    pub count: usize,
    pub practitioners: Vec<PractitionerCard>,
}

/// `GET /api/public/practitioners`
pub async fn practitioners(State(ctx): State<ApiContext>) -> Result<Json<DirectoryResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let practitioners = account::public_directory(&conn, ctx.empty_as_not_found())?;
    Ok(Json(DirectoryResponse {
        success: true,
        count: practitioners.len(),
        practitioners,
    }))
}

#[derive(Serialize)]
pub struct PractitionerResponse {
    pub success: bool,
    pub practitioner: PractitionerCard,
}

/// `GET /api/public/practitioners/:id`
pub async fn practitioner(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<PractitionerResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let practitioner = account::public_practitioner(&conn, &id)?;
    Ok(Json(PractitionerResponse {
        success: true,
        practitioner,
    }))
}
