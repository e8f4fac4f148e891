//! Credential handling: password hashing, bearer tokens and password-reset
//! tokens.

pub mod password;
pub mod token;

pub use password::*;
pub use token::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Stored password hash is malformed")]
    MalformedHash,

    #[error("Token signing failed: {0}")]
    TokenSigning(String),
}
