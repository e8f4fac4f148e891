//! Audit logging middleware.
//!
//! Logs every protected request with account id, method, path and
//! response status. Runs innermost (after auth has injected `CallerContext`).

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::authorization::CallerContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let account_id = req
        .extensions()
        .get::<CallerContext>()
        .map(|c| c.account_id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let response = next.run(req).await;

    tracing::info!(
        target: "audit",
        %method,
        path = %path,
        status = response.status().as_u16(),
        account_id = %account_id,
        "API access"
    );
    response
}
