//! API middleware stack.
//!
//! Execution order (outermost → innermost) on protected routes:
//! 1. Auth validator — bearer token → `CallerContext`
//! 2. Role gate — admin and practitioner groups only
//! 3. Audit logger — logs after auth, has the account id

pub mod audit;
pub mod auth;
pub mod role;
