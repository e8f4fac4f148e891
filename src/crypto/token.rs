use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CryptoError;
use crate::models::Role;

/// Claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

/// Issues and verifies HS256 bearer tokens with a fixed lifetime.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    pub fn issue(&self, account_id: Uuid, role: Role) -> Result<String, CryptoError> {
        self.issue_at(account_id, role, Utc::now())
    }

    /// Issue a token as if the current time were `issued_at`.
    pub fn issue_at(
        &self,
        account_id: Uuid,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, CryptoError> {
        let iat = issued_at.timestamp().max(0) as u64;
        let exp = (issued_at + self.lifetime).timestamp().max(0) as u64;
        let claims = Claims {
            sub: account_id,
            role,
            iat,
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| CryptoError::TokenSigning(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// Generate an opaque password-reset token (URL-safe base64, 32 bytes of entropy).
pub fn generate_reset_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 of a reset token, base64-encoded for storage.
pub fn hash_reset_token(token: &str) -> String {
    use base64::Engine;
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(token.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::days(7))
    }

    #[test]
    fn issued_token_verifies() {
        let id = Uuid::new_v4();
        let token = service().issue(id, Role::Practitioner).unwrap();
        let claims = service().verify(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Practitioner);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn expired_token_rejected() {
        let issued = Utc::now() - Duration::days(8);
        let token = service().issue_at(Uuid::new_v4(), Role::Patient, issued).unwrap();
        assert_eq!(service().verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn token_within_window_accepted() {
        let issued = Utc::now() - Duration::days(6);
        let token = service().issue_at(Uuid::new_v4(), Role::Patient, issued).unwrap();
        assert!(service().verify(&token).is_ok());
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = service().issue(Uuid::new_v4(), Role::Admin).unwrap();
        let other = TokenService::new("ffffffffffffffffffffffffffffffff", Duration::days(7));
        assert_eq!(other.verify(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn garbage_rejected() {
        assert_eq!(service().verify("not.a.jwt").unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn reset_tokens_unique_and_hash_deterministic() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_ne!(a, b);
        assert_eq!(hash_reset_token(&a), hash_reset_token(&a));
        assert_ne!(hash_reset_token(&a), hash_reset_token(&b));
        assert_ne!(hash_reset_token(&a), a);
    }
}
