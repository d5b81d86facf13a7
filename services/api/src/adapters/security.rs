//! services/api/src/adapters/security.rs
//!
//! Concrete implementations of the `SecretHasher` and `TokenCodec` ports:
//! argon2 for slow one-way secret hashing, and HS256 JWTs for the signed,
//! expiring session token.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use publishing_core::{EngineError, EngineResult, SecretHasher, TokenCodec};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

//=========================================================================================
// Secret hashing
//=========================================================================================

/// Hashes account secrets with argon2 and a per-secret random salt.
pub struct ArgonHasher;

impl SecretHasher for ArgonHasher {
    fn hash(&self, secret: &str) -> EngineResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Failed to hash secret: {:?}", e);
                EngineError::Unexpected("failed to hash secret".to_string())
            })
    }

    fn verify(&self, secret: &str, hashed: &str) -> EngineResult<bool> {
        let parsed = PasswordHash::new(hashed).map_err(|e| {
            error!("Failed to parse stored secret hash: {:?}", e);
            EngineError::Unexpected("stored secret hash is malformed".to_string())
        })?;
        Ok(Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok())
    }
}

//=========================================================================================
// Session tokens
//=========================================================================================

/// The payload carried by a session token: the account id and an expiry.
/// Nothing mutable rides along, so revocation happens only through expiry or
/// account deactivation.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    iat: i64,
    exp: i64,
}

/// Issues and verifies HS256 session tokens.
pub struct JwtTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokens {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }
}

impl TokenCodec for JwtTokens {
    fn issue(&self, account_id: Uuid) -> EngineResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: account_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            error!("Failed to sign session token: {:?}", e);
            EngineError::Unexpected("failed to issue session token".to_string())
        })
    }

    fn decode(&self, token: &str) -> EngineResult<Uuid> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims.sub)
            .map_err(|_| EngineError::Unauthorized("invalid or expired session token".into()))
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip_preserves_the_account_id() {
        let tokens = JwtTokens::new("a-test-secret-that-is-long-enough!!", 1);
        let account_id = Uuid::new_v4();

        let token = tokens.issue(account_id).unwrap();
        assert_eq!(tokens.decode(&token).unwrap(), account_id);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let tokens = JwtTokens::new("a-test-secret-that-is-long-enough!!", 1);
        let other = JwtTokens::new("a-different-secret-also-long-enough", 1);

        let token = tokens.issue(Uuid::new_v4()).unwrap();
        assert!(other.decode(&token).is_err());
        assert!(tokens.decode("garbage").is_err());
    }

    #[test]
    fn hash_verifies_only_the_original_secret() {
        let hasher = ArgonHasher;
        let hashed = hasher.hash("correct horse").unwrap();

        assert!(hasher.verify("correct horse", &hashed).unwrap());
        assert!(!hasher.verify("wrong pony", &hashed).unwrap());
    }
}
