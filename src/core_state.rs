//! Shared application state.
//!
//! `CoreState` is built once at startup and shared behind an `Arc` by every
//! request. It holds configuration and long-lived services only; all clinic
//! data lives in SQLite and is reached through a fresh connection per request.

use std::sync::Arc;

use chrono::Duration;

use crate::config::{self, ServerConfig};
use crate::crypto::TokenService;
use crate::db;
use crate::documents::{DocumentRenderer, PdfRenderer};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub config: ServerConfig,
    tokens: TokenService,
    renderer: Arc<dyn DocumentRenderer>,
}

impl CoreState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_renderer(config, Arc::new(PdfRenderer))
    }

    pub fn with_renderer(config: ServerConfig, renderer: Arc<dyn DocumentRenderer>) -> Self {
        let tokens = TokenService::new(
            &config.jwt_secret,
            Duration::days(config::ACCESS_TOKEN_LIFETIME_DAYS),
        );
        Self {
            config,
            tokens,
            renderer,
        }
    }

    /// Create the data directories and bring the schema up to date.
    pub fn initialize_storage(&self) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.config.data_dir)?;
        std::fs::create_dir_all(self.config.reports_dir())?;
        let conn = db::open_database(&self.config.database_path())?;
        let tables = db::count_tables(&conn)?;
        tracing::info!(
            path = %self.config.database_path().display(),
            tables,
            "Database ready"
        );
        Ok(())
    }

    /// Open a connection to the clinic database.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.config.database_path()).map_err(CoreError::Database)
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn renderer(&self) -> &dyn DocumentRenderer {
        self.renderer.as_ref()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
