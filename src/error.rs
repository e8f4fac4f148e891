//! Domain error shared by the clinic services.

use thiserror::Error;

use crate::crypto::CryptoError;
use crate::db::DatabaseError;
use crate::documents::RenderError;

#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("{0}")]
    Validation(String),

    /// A uniqueness rule would be broken (e.g. a registered email).
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Access denied")]
    Forbidden,

    /// Unknown email and wrong password share this variant so callers cannot
    /// tell them apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidResetToken,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Document rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClinicError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Parse a client-supplied enum value (role, status, method...).
pub(crate) fn parse_choice<T>(raw: &str, field: &str) -> Result<T, ClinicError>
where
    T: std::str::FromStr<Err = DatabaseError>,
{
    T::from_str(raw.trim()).map_err(|_| ClinicError::validation(format!("Invalid {field}: {raw}")))
}

/// Require a non-blank string field.
pub(crate) fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ClinicError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ClinicError::validation(format!("{field} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank() {
        assert!(required(&None, "name").is_err());
        assert!(required(&Some("   ".into()), "name").is_err());
        assert_eq!(required(&Some(" Riya ".into()), "name").unwrap(), "Riya");
    }

    #[test]
    fn parse_choice_names_field() {
        use crate::models::Role;
        assert_eq!(parse_choice::<Role>(" admin ", "role").unwrap(), Role::Admin);
        let err = parse_choice::<Role>("doctor", "role").unwrap_err();
        assert_eq!(err.to_string(), "Invalid role: doctor");
    }

    #[test]
    fn messages_are_client_safe() {
        assert_eq!(ClinicError::InvalidCredentials.to_string(), "Invalid credentials");
        assert_eq!(ClinicError::Forbidden.to_string(), "Access denied");
        let err = required(&None, "email").unwrap_err();
        assert_eq!(err.to_string(), "email is required");
    }
}
