//! services/api/src/web/types.rs
//!
//! Shared response payload structs and their conversions from the core
//! domain types. Wire field names are camelCase.

use chrono::{DateTime, Utc};
use publishing_core::domain::{Account, Category, Comment, CommentDetail, ContentDetail};
use publishing_core::query::Pagination;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Accounts
//=========================================================================================

/// The public shape of an account.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub handle: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            handle: account.handle,
            first_name: account.first_name,
            last_name: account.last_name,
            bio: account.bio,
            avatar_url: account.avatar_url,
            role: account.role.as_str().to_string(),
            created_at: account.created_at,
        }
    }
}

//=========================================================================================
// Categories
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub content_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            color: category.color,
            is_active: category.is_active,
            content_count: category.content_count,
            created_at: category.created_at,
        }
    }
}

//=========================================================================================
// Content
//=========================================================================================

/// One content row joined with its author and category.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub author: AccountResponse,
    pub category: CategoryResponse,
    pub tags: Vec<String>,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub featured: bool,
    pub like_count: i64,
    pub bookmark_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContentDetail> for ContentResponse {
    fn from(detail: ContentDetail) -> Self {
        let content = detail.content;
        Self {
            id: content.id,
            title: content.title,
            slug: content.slug,
            body: content.body,
            excerpt: content.excerpt,
            cover_image: content.cover_image,
            author: detail.author.into(),
            category: detail.category.into(),
            tags: content.tags,
            status: content.status.as_str().to_string(),
            published_at: content.published_at,
            views: content.views,
            featured: content.featured,
            like_count: content.like_count,
            bookmark_count: content.bookmark_count,
            created_at: content.created_at,
            updated_at: content.updated_at,
        }
    }
}

/// The paging envelope around a listing.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl From<Pagination> for PaginationMeta {
    fn from(p: Pagination) -> Self {
        Self {
            page: p.page,
            page_size: p.page_size,
            total: p.total,
            total_pages: p.total_pages,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ContentPageResponse {
    pub data: Vec<ContentResponse>,
    pub pagination: PaginationMeta,
}

//=========================================================================================
// Comments
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub content_id: Uuid,
    pub body: String,
    pub parent_id: Option<Uuid>,
    pub author: AccountResponse,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentDetail> for CommentResponse {
    fn from(detail: CommentDetail) -> Self {
        let comment = detail.comment;
        Self {
            id: comment.id,
            content_id: comment.content_id,
            body: comment.body,
            parent_id: comment.parent_id,
            author: detail.author.into(),
            like_count: comment.like_count,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// The bare comment shape used for mutations, where joining the author is
/// redundant (it is always the caller).
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnCommentResponse {
    pub id: Uuid,
    pub content_id: Uuid,
    pub body: String,
    pub parent_id: Option<Uuid>,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Comment> for OwnCommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            content_id: comment.content_id,
            body: comment.body,
            parent_id: comment.parent_id,
            like_count: comment.like_count,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

//=========================================================================================
// Social outcomes
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub like_count: i64,
    pub is_liked: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkResponse {
    pub bookmark_count: i64,
    pub is_bookmarked: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub is_following: bool,
    pub follower_count: i64,
    pub following_count: i64,
}
