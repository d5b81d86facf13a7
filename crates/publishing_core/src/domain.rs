//! crates/publishing_core/src/domain.rs
//!
//! Defines the pure, core data structures for the publishing platform.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Upper bound for a content excerpt, enforced at the boundary.
pub const MAX_EXCERPT_LEN: usize = 300;
/// Upper bound for a comment body, enforced at the boundary.
pub const MAX_COMMENT_LEN: usize = 1000;

//=========================================================================================
// Accounts
//=========================================================================================

/// The role granted to an account. Admins may edit or soft-delete any
/// content; everything else is owner-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Reader,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "reader" => Some(Role::Reader),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Represents a registered account - used throughout the app.
/// Never carries the hashed secret; that lives only in `AccountCredentials`.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub handle: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// Only used internally for login - contains sensitive data.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub account_id: Uuid,
    pub email: String,
    pub hashed_secret: String,
    pub is_active: bool,
}

/// Derived follow-graph numbers for one account. Always computed from the
/// edge set, never stored, so the counts cannot drift.
#[derive(Debug, Clone, Copy)]
pub struct FollowStats {
    pub follower_count: i64,
    pub following_count: i64,
    /// Whether the (optional) viewing account currently follows this one.
    pub is_following: bool,
}

/// An identity resolved from a verified session token, threaded explicitly
/// into every operation that needs an authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account: Account,
}

impl AuthContext {
    pub fn account_id(&self) -> Uuid {
        self.account.id
    }

    pub fn is_admin(&self) -> bool {
        self.account.is_admin()
    }

    /// Ownership rule shared by content mutations: the author, or an admin.
    pub fn may_modify(&self, author_id: Uuid) -> bool {
        self.account.id == author_id || self.is_admin()
    }
}

//=========================================================================================
// Content
//=========================================================================================

/// The publication state of a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStatus {
    Draft,
    Published,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<ContentStatus> {
        match s {
            "draft" => Some(ContentStatus::Draft),
            "published" => Some(ContentStatus::Published),
            _ => None,
        }
    }
}

/// An authored work. `like_count` and `bookmark_count` are derived from the
/// edge sets at query time and are never written back.
#[derive(Debug, Clone)]
pub struct Content {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub tags: Vec<String>,
    pub status: ContentStatus,
    /// Set exactly once, on the first transition to `Published`.
    pub published_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub featured: bool,
    pub is_deleted: bool,
    pub like_count: i64,
    pub bookmark_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Content {
    /// The denormalized `is_published` flag of the source schema, kept as a
    /// computed accessor so it can never disagree with `status`.
    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }
}

/// A content row joined with its author and category, for wire responses.
#[derive(Debug, Clone)]
pub struct ContentDetail {
    pub content: Content,
    pub author: Account,
    pub category: Category,
}

//=========================================================================================
// Categories
//=========================================================================================

/// A content category. Created by an administrative process; the engine only
/// reads them and keeps `content_count` in step with the content lifecycle.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub content_count: i64,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Comments
//=========================================================================================

/// A reader comment attached to one piece of content. `parent_id` is a single
/// parent pointer (one level), not a full tree structure; replies are fetched
/// by parent reference. `like_count` is derived, like the content counts.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: Uuid,
    pub content_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub parent_id: Option<Uuid>,
    pub is_deleted: bool,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment joined with its author, for wire responses.
#[derive(Debug, Clone)]
pub struct CommentDetail {
    pub comment: Comment,
    pub author: Account,
}

//=========================================================================================
// Toggle outcomes
//=========================================================================================

/// The post-toggle state of a like set.
#[derive(Debug, Clone, Copy)]
pub struct LikeOutcome {
    pub like_count: i64,
    pub is_liked: bool,
}

/// The post-toggle state of a bookmark set.
#[derive(Debug, Clone, Copy)]
pub struct BookmarkOutcome {
    pub bookmark_count: i64,
    pub is_bookmarked: bool,
}

/// The post-toggle state of a follow edge, with both derived counts.
#[derive(Debug, Clone, Copy)]
pub struct FollowOutcome {
    pub is_following: bool,
    pub follower_count: i64,
    pub following_count: i64,
}
