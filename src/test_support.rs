//! Fixtures shared by unit tests.

use chrono::Duration;
use rusqlite::Connection;

use crate::authorization::CallerContext;
use crate::crypto::TokenService;
use crate::db;
use crate::models::*;

/// Low PBKDF2 cost so tests stay fast. Verification reads the cost from the
/// stored hash, so these hashes behave like production ones.
pub const TEST_ROUNDS: u32 = 1_000;

pub const TEST_SECRET: &str = "test-secret-0123456789abcdef-0123456789";

pub fn memory_conn() -> Connection {
    db::open_memory_database().unwrap()
}

pub fn test_tokens() -> TokenService {
    TokenService::new(TEST_SECRET, Duration::days(7))
}

pub fn seed_account(conn: &Connection, name: &str, email: &str, role: Role) -> Account {
    db::insert_account(
        conn,
        &NewAccount {
            name: name.into(),
            email: email.into(),
            password_hash: "unused".into(),
            role,
            specialization: (role == Role::Practitioner).then(|| "General Medicine".to_string()),
            fees: (role == Role::Practitioner).then_some(500.0),
            experience: None,
        },
    )
    .unwrap()
}

pub fn caller_for(account: &Account) -> CallerContext {
    CallerContext::from(account)
}

/// A `CoreState` over a fresh data directory with storage initialised and
/// cheap password hashing. Keep the returned guard alive for the test.
pub fn test_core() -> (std::sync::Arc<crate::core_state::CoreState>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = crate::config::ServerConfig::for_data_dir(dir.path().join("data"), TEST_SECRET);
    config.password_rounds = TEST_ROUNDS;
    let core = crate::core_state::CoreState::new(config);
    core.initialize_storage().unwrap();
    (std::sync::Arc::new(core), dir)
}
