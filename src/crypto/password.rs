use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};

use super::CryptoError;

pub const SALT_LENGTH: usize = 16;
pub const HASH_LENGTH: usize = 32;

/// Generate a cryptographically random salt
fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Hash a password with PBKDF2-SHA256 into a PHC string
/// (`$pbkdf2-sha256$i=<rounds>,l=32$<salt>$<hash>`).
pub fn hash_password(password: &str, rounds: u32) -> Result<String, CryptoError> {
    let salt = SaltString::encode_b64(&generate_salt())
        .map_err(|e| CryptoError::PasswordHash(e.to_string()))?;
    let params = Params {
        rounds,
        output_length: HASH_LENGTH,
    };
    let hash = Pbkdf2
        .hash_password_customized(password.as_bytes(), None, None, params, &salt)
        .map_err(|e| CryptoError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string. The iteration count is read
/// from the stored hash.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CryptoError> {
    let parsed = PasswordHash::new(stored).map_err(|_| CryptoError::MalformedHash)?;
    match Pbkdf2.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(pbkdf2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CryptoError::PasswordHash(e.to_string())),
    }
}

/// Derive a key for `password` against a fixed salt and report no match.
/// Stands in for `verify_password` when no account exists, so both paths
/// cost the same number of rounds.
pub fn verify_absent_password(password: &str, rounds: u32) -> Result<bool, CryptoError> {
    let salt = SaltString::encode_b64(&[0u8; SALT_LENGTH])
        .map_err(|e| CryptoError::PasswordHash(e.to_string()))?;
    let params = Params {
        rounds,
        output_length: HASH_LENGTH,
    };
    Pbkdf2
        .hash_password_customized(password.as_bytes(), None, None, params, &salt)
        .map_err(|e| CryptoError::PasswordHash(e.to_string()))?;
    Ok(false)
}
