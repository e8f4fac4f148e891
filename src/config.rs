use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Clinic Server";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bearer tokens are valid for a fixed 7-day window.
pub const ACCESS_TOKEN_LIFETIME_DAYS: i64 = 7;

/// Password-reset tokens expire 15 minutes after issue.
pub const RESET_TOKEN_LIFETIME_MINUTES: i64 = 15;

pub const DEFAULT_PORT: u16 = 3000;

/// PBKDF2 iterations for newly stored password hashes.
pub const DEFAULT_PASSWORD_ROUNDS: u32 = 600_000;

/// HS256 keys shorter than the digest size are rejected at startup.
pub const MIN_JWT_SECRET_LEN: usize = 32;

const DATABASE_FILE: &str = "clinic.db";

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "clinic_server=info,tower_http=info"
}

/// Default data directory: `~/ClinicServer/`.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ClinicServer")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Runtime configuration, read from `CLINIC_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub password_rounds: u32,
    /// An empty report list or practitioner directory answers 404 instead
    /// of an empty success list.
    pub empty_results_as_not_found: bool,
}

impl ServerConfig {
    /// Configuration with defaults for everything except the data directory
    /// and signing secret.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>, jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            data_dir: data_dir.into(),
            jwt_secret: jwt_secret.into(),
            password_rounds: DEFAULT_PASSWORD_ROUNDS,
            empty_results_as_not_found: true,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("CLINIC_JWT_SECRET").ok_or(ConfigError::Missing("CLINIC_JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "CLINIC_JWT_SECRET",
                reason: format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
            });
        }

        let data_dir = lookup("CLINIC_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let mut config = Self::for_data_dir(data_dir, jwt_secret);

        if let Some(addr) = lookup("CLINIC_BIND_ADDR") {
            config.bind_addr = addr.parse().map_err(|e| ConfigError::Invalid {
                var: "CLINIC_BIND_ADDR",
                reason: format!("{e}"),
            })?;
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port.parse().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: format!("{e}"),
            })?;
            config.bind_addr.set_port(port);
        }

        if let Some(rounds) = lookup("CLINIC_PASSWORD_ROUNDS") {
            config.password_rounds = match rounds.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "CLINIC_PASSWORD_ROUNDS",
                        reason: format!("expected a positive integer, got {rounds:?}"),
                    })
                }
            };
        }

        if let Some(flag) = lookup("CLINIC_EMPTY_AS_NOT_FOUND") {
            config.empty_results_as_not_found = parse_flag(&flag).ok_or(ConfigError::Invalid {
                var: "CLINIC_EMPTY_AS_NOT_FOUND",
                reason: format!("expected true/false, got {flag:?}"),
            })?;
        }

        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join("documents")
    }

    /// Generated prescription documents, served under `/reports/`.
    pub fn reports_dir(&self) -> PathBuf {
        self.documents_dir().join("reports")
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
