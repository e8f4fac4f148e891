//! Clinic REST API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`; generated prescriptions are served
//! under `/reports/`.
//!
//! Middleware stack on protected routes (outermost → innermost):
//! 1. Cache-Control → 2. Auth validator → 3. Audit logger → 4. Role gate

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints::{
    admin, appointments, auth, favorites, health, messages, payments, practitioner, public,
    reports, users,
};
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;
use crate::report::REPORTS_URL_PREFIX;

/// Build the clinic API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // Unauthenticated routes
    let open = Router::new()
        .route("/health", get(health::check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/public/practitioners", get(public::practitioners))
        .route("/public/practitioners/:id", get(public::practitioner))
        .with_state(ctx.clone());

    let admin_only = Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/payments", get(admin::payments))
        .route(
            "/admin/users/:id",
            put(admin::change_role).delete(users::delete),
        )
        .route("/admin/appointments/:id", put(admin::update_appointment))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::role::require_admin));

    let practitioner_only = Router::new()
        .route("/practitioner/dashboard", get(practitioner::dashboard))
        .route("/practitioner/profile", get(practitioner::profile))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::role::require_practitioner));

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/users", get(users::list))
        .route(
            "/users/:id",
            get(users::detail).put(users::update).delete(users::delete),
        )
        .route("/users/:id/family", post(users::add_family_member))
        // Self or admin, enforced by the ownership cascade
        .route(
            "/practitioner/update-profile/:id",
            patch(practitioner::update_profile),
        )
        .route("/favorites/user/:id", get(favorites::list))
        .route("/favorites/user/:id/add", post(favorites::add))
        .route("/favorites/user/:id/remove", post(favorites::remove))
        .route("/appointments", post(appointments::create))
        .route(
            "/appointments/:id",
            get(appointments::detail)
                .put(appointments::update)
                .delete(appointments::delete),
        )
        .route("/appointments/:id/payments", post(appointments::pay))
        .route("/appointments/user/:id", get(appointments::list_for_account))
        .route(
            "/appointments/practitioner/:id",
            get(appointments::list_for_practitioner),
        )
        .route("/payments", post(payments::create))
        .route("/payments/:id", put(payments::update))
        .route("/payments/user/:id", get(payments::list_for_account))
        .route("/receipt/:id", get(payments::receipt))
        .route("/reports", post(reports::create))
        .route("/reports/user/:id", get(reports::list_for_account))
        .route("/messages", post(messages::send))
        .route("/messages/inbox", get(messages::inbox))
        .route("/messages/:id/read", put(messages::mark_read))
        .with_state(ctx.clone())
        .merge(admin_only)
        .merge(practitioner_only)
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    let documents = ServeDir::new(ctx.core.config.reports_dir());

    Router::new()
        .nest("/api", open.merge(protected))
        .nest_service(REPORTS_URL_PREFIX, documents)
        .layer(CorsLayer::permissive())
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx))
}
