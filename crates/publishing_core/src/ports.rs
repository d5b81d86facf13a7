//! crates/publishing_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the engine's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete document store and of the crypto
//! used for secret hashing and session tokens.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Account, AccountCredentials, BookmarkOutcome, Category, Comment, Content, FollowStats,
    LikeOutcome,
};
use crate::query::ContentQuery;

//=========================================================================================
// Engine Error and Result Types
//=========================================================================================

/// The error taxonomy every public engine operation maps into before
/// returning. Internal storage or crypto failures never cross this boundary
/// unwrapped; they become `Unexpected` with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl EngineError {
    /// The stable, machine-checkable kind string for the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::Unauthorized(_) => "unauthorized",
            EngineError::Forbidden(_) => "forbidden",
            EngineError::NotFound(_) => "not_found",
            EngineError::Conflict(_) => "conflict",
            EngineError::Unexpected(_) => "internal",
        }
    }
}

/// A convenience type alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;

//=========================================================================================
// New-record inputs
//=========================================================================================

/// The fields the store needs to persist a freshly registered account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub handle: String,
    pub email: String,
    pub hashed_secret: String,
    pub first_name: String,
    pub last_name: String,
}

/// The fields the store needs to persist a category (slug already derived).
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

//=========================================================================================
// Store Port
//=========================================================================================

/// The document-store port. One handle is opened at startup and injected into
/// every engine component at construction; there is no global connection
/// state. Toggle methods are single logical read-modify-write operations: the
/// adapter must make the membership flip atomic (e.g. a conditional insert
/// followed by a delete inside one transaction), so that one call flips the
/// edge exactly once even under concurrent invocations.
#[async_trait]
pub trait ContentStore: Send + Sync {
    // --- Accounts ---

    /// Persists a new account. Fails with `Conflict` when the handle or the
    /// email is already taken.
    async fn create_account(&self, new: NewAccount) -> EngineResult<Account>;

    async fn account_by_id(&self, id: Uuid) -> EngineResult<Account>;

    async fn credentials_by_email(&self, email: &str) -> EngineResult<AccountCredentials>;

    /// Writes back mutable profile fields (names, bio, avatar).
    async fn update_account(&self, account: &Account) -> EngineResult<()>;

    /// Derived follower/following counts, plus membership for `viewer`.
    async fn follow_stats(&self, account_id: Uuid, viewer: Option<Uuid>)
        -> EngineResult<FollowStats>;

    /// Atomically flips the `follower -> followee` edge. Both directions are
    /// views of the same edge row, so they cannot diverge. Returns the new
    /// membership state.
    async fn toggle_follow(&self, follower: Uuid, followee: Uuid) -> EngineResult<bool>;

    // --- Content ---

    /// Persists a new content row. Fails with `Conflict` on a slug collision.
    async fn insert_content(&self, content: &Content) -> EngineResult<()>;

    /// Fetches by id, soft-deleted rows included; callers decide visibility.
    async fn content_by_id(&self, id: Uuid) -> EngineResult<Content>;

    async fn content_by_slug(&self, slug: &str) -> EngineResult<Content>;

    async fn update_content(&self, content: &Content) -> EngineResult<()>;

    /// Adds exactly one to the view counter in a single atomic update and
    /// returns the new value.
    async fn increment_views(&self, id: Uuid) -> EngineResult<i64>;

    /// Reports whether `slug` is taken by a content row other than `exclude`.
    async fn content_slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> EngineResult<bool>;

    async fn toggle_content_like(&self, content_id: Uuid, account_id: Uuid)
        -> EngineResult<LikeOutcome>;

    /// Flips the bookmark edge between an account and a content row. The
    /// account-side `bookmarks` set and the content-side set are both derived
    /// from this one edge, so a partial mutation is impossible.
    async fn toggle_content_bookmark(
        &self,
        content_id: Uuid,
        account_id: Uuid,
    ) -> EngineResult<BookmarkOutcome>;

    /// Runs a composed filter/sort/page query over published, non-deleted
    /// content. Returns the page of rows and the total filtered count.
    async fn list_content(&self, query: &ContentQuery) -> EngineResult<(Vec<Content>, i64)>;

    /// Everything the account has bookmarked, newest bookmark first,
    /// excluding soft-deleted content.
    async fn list_bookmarked_content(&self, account_id: Uuid) -> EngineResult<Vec<Content>>;

    // --- Categories ---

    /// Persists a category (administrative path). Fails with `Conflict` when
    /// the name or slug is already taken.
    async fn create_category(&self, new: NewCategory) -> EngineResult<Category>;

    async fn category_by_id(&self, id: Uuid) -> EngineResult<Category>;

    async fn category_by_slug(&self, slug: &str) -> EngineResult<Category>;

    async fn list_categories(&self) -> EngineResult<Vec<Category>>;

    async fn category_slug_exists(&self, slug: &str, exclude: Option<Uuid>)
        -> EngineResult<bool>;

    // --- Comments ---

    async fn insert_comment(&self, comment: &Comment) -> EngineResult<()>;

    /// Fetches by id, soft-deleted rows included; callers decide visibility.
    async fn comment_by_id(&self, id: Uuid) -> EngineResult<Comment>;

    async fn update_comment(&self, comment: &Comment) -> EngineResult<()>;

    async fn toggle_comment_like(&self, comment_id: Uuid, account_id: Uuid)
        -> EngineResult<LikeOutcome>;

    /// Top-level (parentless) comments for a content row, soft-deleted rows
    /// excluded, newest first.
    async fn top_level_comments(&self, content_id: Uuid) -> EngineResult<Vec<Comment>>;

    /// Replies to one comment, soft-deleted rows excluded, oldest first.
    async fn comment_replies(&self, parent_id: Uuid) -> EngineResult<Vec<Comment>>;
}

//=========================================================================================
// Security Ports
//=========================================================================================

/// Slow one-way hashing of account secrets. Implemented with argon2 in the
/// api service; tests plug in a cheap fake.
pub trait SecretHasher: Send + Sync {
    fn hash(&self, secret: &str) -> EngineResult<String>;

    fn verify(&self, secret: &str, hashed: &str) -> EngineResult<bool>;
}

/// Issues and verifies the opaque, signed, expiring session token. Tokens
/// carry only the account id and an expiry; revocation happens through expiry
/// or account deactivation, never through server-side state.
pub trait TokenCodec: Send + Sync {
    fn issue(&self, account_id: Uuid) -> EngineResult<String>;

    /// Returns the account id for a well-formed, correctly signed, unexpired
    /// token, and `Unauthorized` otherwise.
    fn decode(&self, token: &str) -> EngineResult<Uuid>;
}
