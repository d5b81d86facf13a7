//! crates/publishing_core/src/identity.rs
//!
//! Owns accounts, secret hashing, and session-token issuance/verification.
//! Hashing and token crypto sit behind the `SecretHasher` and `TokenCodec`
//! ports so this module stays free of concrete crypto crates.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Account, AuthContext, FollowStats};
use crate::ports::{ContentStore, EngineError, EngineResult, NewAccount, SecretHasher, TokenCodec};

/// Registration input, pre-hash. The secret is moved in and consumed.
#[derive(Debug, Clone)]
pub struct Registration {
    pub handle: String,
    pub email: String,
    pub secret: String,
    pub first_name: String,
    pub last_name: String,
}

/// The caller-editable slice of a profile. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

const MIN_SECRET_LEN: usize = 8;

/// Owns identity: registration, login, and token verification.
#[derive(Clone)]
pub struct IdentityStore {
    store: Arc<dyn ContentStore>,
    hasher: Arc<dyn SecretHasher>,
    tokens: Arc<dyn TokenCodec>,
}

impl IdentityStore {
    pub fn new(
        store: Arc<dyn ContentStore>,
        hasher: Arc<dyn SecretHasher>,
        tokens: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Creates an account and returns it with a freshly issued session token.
    /// Duplicate handle or email surfaces as `Conflict` from the store.
    pub async fn register(&self, reg: Registration) -> EngineResult<(Account, String)> {
        let handle = reg.handle.trim().to_lowercase();
        let email = reg.email.trim().to_lowercase();
        if handle.is_empty() {
            return Err(EngineError::Validation("handle is required".into()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(EngineError::Validation("a valid email is required".into()));
        }
        if reg.secret.len() < MIN_SECRET_LEN {
            return Err(EngineError::Validation(format!(
                "secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        if reg.first_name.trim().is_empty() || reg.last_name.trim().is_empty() {
            return Err(EngineError::Validation("first and last name are required".into()));
        }

        let hashed_secret = self.hasher.hash(&reg.secret)?;
        let account = self
            .store
            .create_account(NewAccount {
                handle,
                email,
                hashed_secret,
                first_name: reg.first_name.trim().to_string(),
                last_name: reg.last_name.trim().to_string(),
            })
            .await?;

        let token = self.tokens.issue(account.id)?;
        Ok((account, token))
    }

    /// Verifies an email/secret pair and issues a session token. Any failure
    /// mode (unknown email, deactivated account, bad secret) collapses into
    /// the same `Unauthorized` so callers cannot probe which part failed.
    pub async fn authenticate(&self, email: &str, secret: &str) -> EngineResult<(Account, String)> {
        let email = email.trim().to_lowercase();
        let creds = match self.store.credentials_by_email(&email).await {
            Ok(creds) => creds,
            Err(EngineError::NotFound(_)) => return Err(invalid_credentials()),
            Err(e) => return Err(e),
        };
        if !creds.is_active {
            return Err(invalid_credentials());
        }
        if !self.hasher.verify(secret, &creds.hashed_secret)? {
            return Err(invalid_credentials());
        }

        let account = self.store.account_by_id(creds.account_id).await?;
        let token = self.tokens.issue(account.id)?;
        Ok((account, token))
    }

    /// Resolves a bearer token to a full, active account. Tokens carry no
    /// mutable state, so deactivating the account is the only way to revoke
    /// one before it expires.
    pub async fn verify_token(&self, token: &str) -> EngineResult<AuthContext> {
        let account_id = self.tokens.decode(token)?;
        let account = match self.store.account_by_id(account_id).await {
            Ok(account) => account,
            Err(EngineError::NotFound(_)) => {
                return Err(EngineError::Unauthorized("account no longer exists".into()))
            }
            Err(e) => return Err(e),
        };
        if !account.is_active {
            return Err(EngineError::Unauthorized("account is deactivated".into()));
        }
        Ok(AuthContext { account })
    }

    /// The public profile plus derived follow-graph counts, with `viewer`
    /// membership when a viewer is supplied.
    pub async fn profile(
        &self,
        account_id: Uuid,
        viewer: Option<Uuid>,
    ) -> EngineResult<(Account, FollowStats)> {
        let account = self.store.account_by_id(account_id).await?;
        let stats = self.store.follow_stats(account_id, viewer).await?;
        Ok((account, stats))
    }

    /// Applies a profile patch to the caller's own account.
    pub async fn update_profile(
        &self,
        ctx: &AuthContext,
        patch: ProfilePatch,
    ) -> EngineResult<Account> {
        let mut account = self.store.account_by_id(ctx.account_id()).await?;
        if let Some(first_name) = patch.first_name {
            if first_name.trim().is_empty() {
                return Err(EngineError::Validation("first name cannot be empty".into()));
            }
            account.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = patch.last_name {
            if last_name.trim().is_empty() {
                return Err(EngineError::Validation("last name cannot be empty".into()));
            }
            account.last_name = last_name.trim().to_string();
        }
        if let Some(bio) = patch.bio {
            account.bio = if bio.trim().is_empty() { None } else { Some(bio) };
        }
        if let Some(avatar_url) = patch.avatar_url {
            account.avatar_url = if avatar_url.trim().is_empty() {
                None
            } else {
                Some(avatar_url)
            };
        }
        self.store.update_account(&account).await?;
        Ok(account)
    }
}

fn invalid_credentials() -> EngineError {
    EngineError::Unauthorized("invalid email or secret".into())
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_mem::MemoryStore;
    use crate::testing::{registration, FakeHasher, FakeTokens};

    fn identity() -> IdentityStore {
        let store = Arc::new(MemoryStore::new());
        IdentityStore::new(store, Arc::new(FakeHasher), Arc::new(FakeTokens::default()))
    }

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let identity = identity();
        let (account, token) = identity
            .register(registration("alice", "a@x.com"))
            .await
            .unwrap();
        assert_eq!(account.handle, "alice");
        assert!(!token.is_empty());

        let (again, _) = identity.authenticate("a@x.com", "correct horse").await.unwrap();
        assert_eq!(again.id, account.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let identity = identity();
        identity.register(registration("alice", "a@x.com")).await.unwrap();

        let err = identity
            .register(registration("bob", "a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_handle_is_a_conflict() {
        let identity = identity();
        identity.register(registration("alice", "a@x.com")).await.unwrap();

        let err = identity
            .register(registration("alice", "b@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[tokio::test]
    async fn wrong_secret_is_unauthorized() {
        let identity = identity();
        identity.register(registration("alice", "a@x.com")).await.unwrap();

        let err = identity.authenticate("a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn short_secret_is_rejected() {
        let identity = identity();
        let mut reg = registration("alice", "a@x.com");
        reg.secret = "short".into();
        let err = identity.register(reg).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn verify_token_resolves_the_account() {
        let identity = identity();
        let (account, token) = identity
            .register(registration("alice", "a@x.com"))
            .await
            .unwrap();

        let ctx = identity.verify_token(&token).await.unwrap();
        assert_eq!(ctx.account_id(), account.id);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let identity = identity();
        let err = identity.verify_token("not-a-token").await.unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));
    }
}
