//! Account endpoints for authenticated callers.
//!
//! - `GET /api/users` — list, optional `?role=`
//! - `GET /api/users/:id`, `PUT /api/users/:id`, `DELETE /api/users/:id`
//! - `POST /api/users/:id/family` — append a family member

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::account::{self, FamilyMemberInput, ProfileUpdate};
use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::types::{parse_id, ApiContext};
use crate::authorization::CallerContext;
use crate::models::{Account, FamilyMember};

#[derive(Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub count: usize,
    pub users: Vec<Account>,
}

/// `GET /api/users`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<UsersResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let users = account::list_accounts(&conn, &caller, query.role.as_deref())?;
    Ok(Json(UsersResponse {
        success: true,
        count: users.len(),
        users,
    }))
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: Account,
}

/// `GET /api/users/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let user = account::get_account(&conn, &id)?;
    Ok(Json(UserResponse { success: true, user }))
}

/// `PUT /api/users/:id` — self or admin. Any `password` key is ignored.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let user = account::update_profile(&conn, &caller, &id, update)?;
    Ok(Json(UserResponse { success: true, user }))
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `DELETE /api/users/:id` — admin only. Other collections are untouched.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    account::delete_account(&conn, &caller, &id)?;
    Ok(Json(DeletedResponse {
        success: true,
        message: "User deleted",
    }))
}

#[derive(Serialize)]
pub struct FamilyResponse {
    pub success: bool,
    pub family_members: Vec<FamilyMember>,
}

/// `POST /api/users/:id/family`
pub async fn add_family_member(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<FamilyMemberInput>,
) -> Result<Json<FamilyResponse>, ApiError> {
    let id = parse_id(&id)?;
    let mut conn = ctx.core.open_db()?;
    let family_members = account::add_family_member(&mut conn, &caller, &id, input)?;
    Ok(Json(FamilyResponse {
        success: true,
        family_members,
    }))
}
