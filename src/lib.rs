pub mod account; // Registration, credentials, profiles, favorites
pub mod api; // REST API router, middleware and server
pub mod appointment;
pub mod authorization; // Role → capability table, ownership cascade
pub mod config;
pub mod core_state; // Shared state behind every request
pub mod crypto;
pub mod dashboard; // Admin and practitioner aggregates
pub mod db;
pub mod documents; // Receipt and prescription rendering
pub mod error;
pub mod messaging;
pub mod models;
pub mod payment;
pub mod report;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Storage(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Load configuration, prepare storage and serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::ServerConfig::from_env()?;
    let bind_addr = config.bind_addr;
    let core = Arc::new(core_state::CoreState::new(config));
    core.initialize_storage()?;

    let mut server = api::start_api_server(core, bind_addr).await?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.stopped().await;
    Ok(())
}
