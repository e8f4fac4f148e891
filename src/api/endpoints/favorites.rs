//! Favorite practitioner endpoints.
//!
//! - `GET /api/favorites/user/:id` — favorites as practitioner cards
//! - `POST /api/favorites/user/:id/add`, `POST /api/favorites/user/:id/remove`

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::account::{self, FavoriteInput};
use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::types::{parse_id, ApiContext};
use crate::authorization::CallerContext;
use crate::models::PractitionerCard;

#[derive(Serialize)]
pub struct FavoritesResponse {
    pub success: bool,
    pub favorites: Vec<PractitionerCard>,
}

/// `GET /api/favorites/user/:id`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let favorites = account::list_favorites(&conn, &id)?;
    Ok(Json(FavoritesResponse {
        success: true,
        favorites,
    }))
}

#[derive(Serialize)]
pub struct FavoriteIdsResponse {
    pub success: bool,
    pub favorites: Vec<Uuid>,
}

/// `POST /api/favorites/user/:id/add` — adding twice keeps one entry.
pub async fn add(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<FavoriteInput>,
) -> Result<Json<FavoriteIdsResponse>, ApiError> {
    let id = parse_id(&id)?;
    let mut conn = ctx.core.open_db()?;
    let favorites = account::add_favorite(&mut conn, &caller, &id, input)?;
    Ok(Json(FavoriteIdsResponse {
        success: true,
        favorites,
    }))
}

/// `POST /api/favorites/user/:id/remove`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<FavoriteInput>,
) -> Result<Json<FavoriteIdsResponse>, ApiError> {
    let id = parse_id(&id)?;
    let mut conn = ctx.core.open_db()?;
    let favorites = account::remove_favorite(&mut conn, &caller, &id, input)?;
    Ok(Json(FavoriteIdsResponse {
        success: true,
        favorites,
    }))
}
