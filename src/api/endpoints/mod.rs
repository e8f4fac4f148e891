//! API endpoint handlers.
//!
//! Each module covers one resource. Handlers open a connection, call the
//! matching service and wrap the result in a `{"success": true, ...}` body.

pub mod admin;
pub mod appointments;
pub mod auth;
pub mod favorites;
pub mod health;
pub mod messages;
pub mod payments;
pub mod practitioner;
pub mod public;
pub mod reports;
pub mod users;
