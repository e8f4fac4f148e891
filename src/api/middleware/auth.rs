//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, verifies it, loads the account
//! it names and injects `CallerContext` into request extensions for
//! downstream handlers.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::authorization::CallerContext;
use crate::crypto::TokenError;
use crate::db;

/// Require a valid bearer token naming an existing account.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    // 1. Extract bearer token
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("No token provided".into()))?
        .to_string();

    // 2. Verify signature and expiry
    let claims = ctx.core.tokens().verify(&token).map_err(|e| match e {
        TokenError::Expired => ApiError::TokenExpired,
        TokenError::Invalid => ApiError::Unauthorized("Invalid token".into()),
    })?;

    // 3. The account must still exist; its stored role wins over the claim
    let caller = {
        let conn = ctx.core.open_db()?;
        let account = db::get_account(&conn, &claims.sub)?
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".into()))?;
        CallerContext::from(&account)
    }; // Connection dropped here, before any .await

    // 4. Inject caller context for downstream handlers
    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}
