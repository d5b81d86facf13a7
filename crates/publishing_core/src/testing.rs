//! crates/publishing_core/src/testing.rs
//!
//! Cheap fakes and fixture builders shared by the engine's unit and
//! integration tests. The fakes stand in for the argon2 and jsonwebtoken
//! adapters that live in the api service.

use uuid::Uuid;

use crate::domain::ContentStatus;
use crate::identity::Registration;
use crate::lifecycle::NewContent;
use crate::ports::{EngineError, EngineResult, SecretHasher, TokenCodec};

/// A reversible "hash" that keeps identity tests fast and deterministic.
pub struct FakeHasher;

impl SecretHasher for FakeHasher {
    fn hash(&self, secret: &str) -> EngineResult<String> {
        Ok(format!("hashed:{}", secret))
    }

    fn verify(&self, secret: &str, hashed: &str) -> EngineResult<bool> {
        Ok(hashed == format!("hashed:{}", secret))
    }
}

/// Encodes the account id directly into the token string.
#[derive(Default)]
pub struct FakeTokens;

impl TokenCodec for FakeTokens {
    fn issue(&self, account_id: Uuid) -> EngineResult<String> {
        Ok(format!("token:{}", account_id))
    }

    fn decode(&self, token: &str) -> EngineResult<Uuid> {
        token
            .strip_prefix("token:")
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(|| EngineError::Unauthorized("invalid session token".into()))
    }
}

/// A valid registration for `handle` with a fixed secret (`correct horse`).
pub fn registration(handle: &str, email: &str) -> Registration {
    Registration {
        handle: handle.into(),
        email: email.into(),
        secret: "correct horse".into(),
        first_name: "Test".into(),
        last_name: "Account".into(),
    }
}

/// A minimal published-content input against `category_id`.
pub fn new_content(title: &str, category_id: Uuid) -> NewContent {
    NewContent {
        title: title.into(),
        body: format!("Body of {}.", title),
        excerpt: None,
        cover_image: None,
        category_id,
        tags: vec![],
        status: Some(ContentStatus::Published),
        featured: false,
    }
}
