//! Clinic REST API.
//!
//! Exposes the clinic services as HTTP endpoints. Routes are nested under
//! `/api/`; protected routes run behind a middleware stack:
//! Auth → Audit → (Role gate) → Handler.
//!
//! The router is composable — `api_router()` returns a `Router` that can be
//! mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ServerError, ServerSession};
pub use types::ApiContext;
