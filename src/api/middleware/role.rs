//! Role gates for the admin and practitioner route groups.
//!
//! Run after `require_auth`, which has injected `CallerContext`.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::authorization::{CallerContext, Capability};

/// Admit callers holding `AdminDashboard` (administrators).
pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    gate(req, next, Capability::AdminDashboard).await
}

/// Admit callers holding `PractitionerWorkspace` (practitioners).
pub async fn require_practitioner(req: Request<axum::body::Body>, next: Next) -> Response {
    gate(req, next, Capability::PractitionerWorkspace).await
}

async fn gate(req: Request<axum::body::Body>, next: Next, capability: Capability) -> Response {
    let allowed = match req.extensions().get::<CallerContext>() {
        Some(caller) => caller.require(capability).is_ok(),
        None => return ApiError::Unauthorized("No token provided".into()).into_response(),
    };
    if !allowed {
        return ApiError::Forbidden.into_response();
    }
    next.run(req).await
}
