//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `ContentStore` port from the `core` crate. It
//! handles all interactions with the PostgreSQL database using `sqlx`.
//!
//! Relationship edges (follows, likes, bookmarks) are single tables; both
//! "sides" of every relationship are derived from the same rows, and each
//! toggle runs as one transaction (conditional insert, then delete when the
//! insert found an existing row), so a logical call flips the edge exactly
//! once even under concurrent invocations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use publishing_core::domain::{
    Account, AccountCredentials, BookmarkOutcome, Category, Comment, Content, ContentStatus,
    FollowStats, LikeOutcome, Role,
};
use publishing_core::ports::{
    ContentStore, EngineError, EngineResult, NewAccount, NewCategory,
};
use publishing_core::query::{ContentQuery, SortKey};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ContentStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> EngineError {
    EngineError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: &str, key: &str) -> EngineError {
    match e {
        sqlx::Error::RowNotFound => EngineError::NotFound(format!("{} {} not found", what, key)),
        _ => unexpected(e),
    }
}

/// Maps a unique-constraint violation to `Conflict`, everything else to
/// `Unexpected`. `message` may depend on which constraint tripped.
fn conflict_or_unexpected(e: sqlx::Error, message: impl Fn(Option<&str>) -> String) -> EngineError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return EngineError::Conflict(message(db.constraint()));
        }
    }
    unexpected(e)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct AccountRecord {
    id: Uuid,
    handle: String,
    email: String,
    first_name: String,
    last_name: String,
    bio: Option<String>,
    avatar_url: Option<String>,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl AccountRecord {
    fn to_domain(self) -> EngineResult<Account> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| EngineError::Unexpected(format!("unknown role '{}'", self.role)))?;
        Ok(Account {
            id: self.id,
            handle: self.handle,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            bio: self.bio,
            avatar_url: self.avatar_url,
            role,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    hashed_secret: String,
    is_active: bool,
}

impl CredentialsRecord {
    fn to_domain(self) -> AccountCredentials {
        AccountCredentials {
            account_id: self.id,
            email: self.email,
            hashed_secret: self.hashed_secret,
            is_active: self.is_active,
        }
    }
}

#[derive(FromRow)]
struct ContentRecord {
    id: Uuid,
    title: String,
    slug: String,
    body: String,
    excerpt: Option<String>,
    cover_image: Option<String>,
    author_id: Uuid,
    category_id: Uuid,
    tags: Vec<String>,
    status: String,
    published_at: Option<DateTime<Utc>>,
    views: i64,
    featured: bool,
    is_deleted: bool,
    like_count: i64,
    bookmark_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ContentRecord {
    fn to_domain(self) -> EngineResult<Content> {
        let status = ContentStatus::parse(&self.status)
            .ok_or_else(|| EngineError::Unexpected(format!("unknown status '{}'", self.status)))?;
        Ok(Content {
            id: self.id,
            title: self.title,
            slug: self.slug,
            body: self.body,
            excerpt: self.excerpt,
            cover_image: self.cover_image,
            author_id: self.author_id,
            category_id: self.category_id,
            tags: self.tags,
            status,
            published_at: self.published_at,
            views: self.views,
            featured: self.featured,
            is_deleted: self.is_deleted,
            like_count: self.like_count,
            bookmark_count: self.bookmark_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CategoryRecord {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    color: Option<String>,
    is_active: bool,
    content_count: i64,
    created_at: DateTime<Utc>,
}

impl CategoryRecord {
    fn to_domain(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            color: self.color,
            is_active: self.is_active,
            content_count: self.content_count,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CommentRecord {
    id: Uuid,
    content_id: Uuid,
    author_id: Uuid,
    body: String,
    parent_id: Option<Uuid>,
    is_deleted: bool,
    like_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CommentRecord {
    fn to_domain(self) -> Comment {
        Comment {
            id: self.id,
            content_id: self.content_id,
            author_id: self.author_id,
            body: self.body,
            parent_id: self.parent_id,
            is_deleted: self.is_deleted,
            like_count: self.like_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const ACCOUNT_COLS: &str =
    "id, handle, email, first_name, last_name, bio, avatar_url, role, is_active, created_at";

const CONTENT_COLS: &str = "c.id, c.title, c.slug, c.body, c.excerpt, c.cover_image, \
     c.author_id, c.category_id, c.tags, c.status, c.published_at, c.views, c.featured, \
     c.is_deleted, \
     COALESCE((SELECT COUNT(*) FROM content_likes l WHERE l.content_id = c.id), 0) AS like_count, \
     COALESCE((SELECT COUNT(*) FROM content_bookmarks b WHERE b.content_id = c.id), 0) AS bookmark_count, \
     c.created_at, c.updated_at";

const COMMENT_COLS: &str = "m.id, m.content_id, m.author_id, m.body, m.parent_id, m.is_deleted, \
     COALESCE((SELECT COUNT(*) FROM comment_likes l WHERE l.comment_id = m.id), 0) AS like_count, \
     m.created_at, m.updated_at";

//=========================================================================================
// `ContentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentStore for PgStore {
    // --- Accounts ---

    async fn create_account(&self, new: NewAccount) -> EngineResult<Account> {
        let record = sqlx::query_as::<Postgres, AccountRecord>(
            "INSERT INTO accounts (id, handle, email, hashed_secret, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, handle, email, first_name, last_name, bio, avatar_url, role, is_active, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new.handle)
        .bind(&new.email)
        .bind(&new.hashed_secret)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_or_unexpected(e, |constraint| match constraint {
                Some("accounts_handle_key") => "handle is already taken".to_string(),
                Some("accounts_email_key") => "email is already registered".to_string(),
                _ => "handle or email is already taken".to_string(),
            })
        })?;
        record.to_domain()
    }

    async fn account_by_id(&self, id: Uuid) -> EngineResult<Account> {
        let record = sqlx::query_as::<Postgres, AccountRecord>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Account", &id.to_string()))?;
        record.to_domain()
    }

    async fn credentials_by_email(&self, email: &str) -> EngineResult<AccountCredentials> {
        let record = sqlx::query_as::<Postgres, CredentialsRecord>(
            "SELECT id, email, hashed_secret, is_active FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Account", email))?;
        Ok(record.to_domain())
    }

    async fn update_account(&self, account: &Account) -> EngineResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET first_name = $2, last_name = $3, bio = $4, avatar_url = $5, \
             is_active = $6 WHERE id = $1",
        )
        .bind(account.id)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.bio)
        .bind(&account.avatar_url)
        .bind(account.is_active)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(EngineError::NotFound(format!(
                "Account {} not found",
                account.id
            )));
        }
        Ok(())
    }

    async fn follow_stats(
        &self,
        account_id: Uuid,
        viewer: Option<Uuid>,
    ) -> EngineResult<FollowStats> {
        let (follower_count, following_count, is_following): (i64, i64, bool) =
            sqlx::query_as(
                "SELECT \
                 (SELECT COUNT(*) FROM follows WHERE followee_id = $1), \
                 (SELECT COUNT(*) FROM follows WHERE follower_id = $1), \
                 EXISTS(SELECT 1 FROM follows WHERE follower_id = $2 AND followee_id = $1)",
            )
            .bind(account_id)
            .bind(viewer.unwrap_or(Uuid::nil()))
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(FollowStats {
            follower_count,
            following_count,
            is_following,
        })
    }

    async fn toggle_follow(&self, follower: Uuid, followee: Uuid) -> EngineResult<bool> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let inserted = sqlx::query(
            "INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(follower)
        .bind(followee)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?
        .rows_affected();

        let is_following = if inserted == 0 {
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
                .bind(follower)
                .bind(followee)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
            false
        } else {
            true
        };
        tx.commit().await.map_err(unexpected)?;
        Ok(is_following)
    }

    // --- Content ---

    async fn insert_content(&self, content: &Content) -> EngineResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query(
            "INSERT INTO contents (id, title, slug, body, excerpt, cover_image, author_id, \
             category_id, tags, status, published_at, views, featured, is_deleted, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(content.id)
        .bind(&content.title)
        .bind(&content.slug)
        .bind(&content.body)
        .bind(&content.excerpt)
        .bind(&content.cover_image)
        .bind(content.author_id)
        .bind(content.category_id)
        .bind(&content.tags)
        .bind(content.status.as_str())
        .bind(content.published_at)
        .bind(content.views)
        .bind(content.featured)
        .bind(content.is_deleted)
        .bind(content.created_at)
        .bind(content.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            conflict_or_unexpected(e, |_| format!("slug '{}' is already taken", content.slug))
        })?;

        sqlx::query("UPDATE categories SET content_count = content_count + 1 WHERE id = $1")
            .bind(content.category_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn content_by_id(&self, id: Uuid) -> EngineResult<Content> {
        let record = sqlx::query_as::<Postgres, ContentRecord>(&format!(
            "SELECT {} FROM contents c WHERE c.id = $1",
            CONTENT_COLS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Content", &id.to_string()))?;
        record.to_domain()
    }

    async fn content_by_slug(&self, slug: &str) -> EngineResult<Content> {
        let record = sqlx::query_as::<Postgres, ContentRecord>(&format!(
            "SELECT {} FROM contents c WHERE c.slug = $1",
            CONTENT_COLS
        ))
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Content", slug))?;
        record.to_domain()
    }

    async fn update_content(&self, content: &Content) -> EngineResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let (old_category, old_deleted): (Uuid, bool) =
            sqlx::query_as("SELECT category_id, is_deleted FROM contents WHERE id = $1 FOR UPDATE")
                .bind(content.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| not_found_or_unexpected(e, "Content", &content.id.to_string()))?;

        // `views` is deliberately not written here; it is owned by
        // `increment_views`.
        sqlx::query(
            "UPDATE contents SET title = $2, slug = $3, body = $4, excerpt = $5, \
             cover_image = $6, category_id = $7, tags = $8, status = $9, published_at = $10, \
             featured = $11, is_deleted = $12, updated_at = $13 WHERE id = $1",
        )
        .bind(content.id)
        .bind(&content.title)
        .bind(&content.slug)
        .bind(&content.body)
        .bind(&content.excerpt)
        .bind(&content.cover_image)
        .bind(content.category_id)
        .bind(&content.tags)
        .bind(content.status.as_str())
        .bind(content.published_at)
        .bind(content.featured)
        .bind(content.is_deleted)
        .bind(content.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            conflict_or_unexpected(e, |_| format!("slug '{}' is already taken", content.slug))
        })?;

        // Keep the denormalized category counters in step with visibility
        // and category moves.
        let counted_before = !old_deleted;
        let counted_after = !content.is_deleted;
        if counted_before != counted_after || old_category != content.category_id {
            if counted_before {
                sqlx::query(
                    "UPDATE categories SET content_count = content_count - 1 WHERE id = $1",
                )
                .bind(old_category)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
            }
            if counted_after {
                sqlx::query(
                    "UPDATE categories SET content_count = content_count + 1 WHERE id = $1",
                )
                .bind(content.category_id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
            }
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> EngineResult<i64> {
        sqlx::query_scalar("UPDATE contents SET views = views + 1 WHERE id = $1 RETURNING views")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| not_found_or_unexpected(e, "Content", &id.to_string()))
    }

    async fn content_slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> EngineResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM contents WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn toggle_content_like(
        &self,
        content_id: Uuid,
        account_id: Uuid,
    ) -> EngineResult<LikeOutcome> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let inserted = sqlx::query(
            "INSERT INTO content_likes (content_id, account_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(content_id)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?
        .rows_affected();

        let is_liked = if inserted == 0 {
            sqlx::query("DELETE FROM content_likes WHERE content_id = $1 AND account_id = $2")
                .bind(content_id)
                .bind(account_id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
            false
        } else {
            true
        };
        let like_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM content_likes WHERE content_id = $1")
                .bind(content_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(LikeOutcome {
            like_count,
            is_liked,
        })
    }

    async fn toggle_content_bookmark(
        &self,
        content_id: Uuid,
        account_id: Uuid,
    ) -> EngineResult<BookmarkOutcome> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let inserted = sqlx::query(
            "INSERT INTO content_bookmarks (content_id, account_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(content_id)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?
        .rows_affected();

        let is_bookmarked = if inserted == 0 {
            sqlx::query("DELETE FROM content_bookmarks WHERE content_id = $1 AND account_id = $2")
                .bind(content_id)
                .bind(account_id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
            false
        } else {
            true
        };
        let bookmark_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM content_bookmarks WHERE content_id = $1")
                .bind(content_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(BookmarkOutcome {
            bookmark_count,
            is_bookmarked,
        })
    }

    async fn list_content(&self, query: &ContentQuery) -> EngineResult<(Vec<Content>, i64)> {
        let total: i64 = {
            let mut qb = QueryBuilder::<Postgres>::new(
                "SELECT COUNT(*) FROM contents c JOIN categories cat ON cat.id = c.category_id",
            );
            push_filters(&mut qb, query);
            qb.build_query_scalar()
                .fetch_one(&self.pool)
                .await
                .map_err(unexpected)?
        };

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM contents c JOIN categories cat ON cat.id = c.category_id",
            CONTENT_COLS
        ));
        push_filters(&mut qb, query);
        qb.push(match query.sort {
            SortKey::Newest => " ORDER BY c.created_at DESC",
            SortKey::Oldest => " ORDER BY c.created_at ASC",
            SortKey::Popular => " ORDER BY like_count DESC, c.created_at DESC",
            SortKey::Views => " ORDER BY c.views DESC, c.created_at DESC",
        });
        qb.push(" LIMIT ");
        qb.push_bind(query.limit);
        qb.push(" OFFSET ");
        qb.push_bind(query.offset);

        let records: Vec<ContentRecord> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        let rows = records
            .into_iter()
            .map(|r| r.to_domain())
            .collect::<EngineResult<Vec<Content>>>()?;
        Ok((rows, total))
    }

    async fn list_bookmarked_content(&self, account_id: Uuid) -> EngineResult<Vec<Content>> {
        let records = sqlx::query_as::<Postgres, ContentRecord>(&format!(
            "SELECT {} FROM contents c \
             JOIN content_bookmarks b ON b.content_id = c.id \
             WHERE b.account_id = $1 AND c.is_deleted = FALSE \
             ORDER BY b.created_at DESC",
            CONTENT_COLS
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    // --- Categories ---

    async fn create_category(&self, new: NewCategory) -> EngineResult<Category> {
        let record = sqlx::query_as::<Postgres, CategoryRecord>(
            "INSERT INTO categories (id, name, slug, description, color) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, slug, description, color, is_active, content_count, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(&new.color)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, |_| "category already exists".to_string()))?;
        Ok(record.to_domain())
    }

    async fn category_by_id(&self, id: Uuid) -> EngineResult<Category> {
        let record = sqlx::query_as::<Postgres, CategoryRecord>(
            "SELECT id, name, slug, description, color, is_active, content_count, created_at \
             FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Category", &id.to_string()))?;
        Ok(record.to_domain())
    }

    async fn category_by_slug(&self, slug: &str) -> EngineResult<Category> {
        let record = sqlx::query_as::<Postgres, CategoryRecord>(
            "SELECT id, name, slug, description, color, is_active, content_count, created_at \
             FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Category", slug))?;
        Ok(record.to_domain())
    }

    async fn list_categories(&self) -> EngineResult<Vec<Category>> {
        let records = sqlx::query_as::<Postgres, CategoryRecord>(
            "SELECT id, name, slug, description, color, is_active, content_count, created_at \
             FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn category_slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> EngineResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    // --- Comments ---

    async fn insert_comment(&self, comment: &Comment) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO comments (id, content_id, author_id, body, parent_id, is_deleted, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(comment.id)
        .bind(comment.content_id)
        .bind(comment.author_id)
        .bind(&comment.body)
        .bind(comment.parent_id)
        .bind(comment.is_deleted)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn comment_by_id(&self, id: Uuid) -> EngineResult<Comment> {
        let record = sqlx::query_as::<Postgres, CommentRecord>(&format!(
            "SELECT {} FROM comments m WHERE m.id = $1",
            COMMENT_COLS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Comment", &id.to_string()))?;
        Ok(record.to_domain())
    }

    async fn update_comment(&self, comment: &Comment) -> EngineResult<()> {
        let result = sqlx::query(
            "UPDATE comments SET body = $2, is_deleted = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(comment.id)
        .bind(&comment.body)
        .bind(comment.is_deleted)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(EngineError::NotFound(format!(
                "Comment {} not found",
                comment.id
            )));
        }
        Ok(())
    }

    async fn toggle_comment_like(
        &self,
        comment_id: Uuid,
        account_id: Uuid,
    ) -> EngineResult<LikeOutcome> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let inserted = sqlx::query(
            "INSERT INTO comment_likes (comment_id, account_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(comment_id)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?
        .rows_affected();

        let is_liked = if inserted == 0 {
            sqlx::query("DELETE FROM comment_likes WHERE comment_id = $1 AND account_id = $2")
                .bind(comment_id)
                .bind(account_id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
            false
        } else {
            true
        };
        let like_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM comment_likes WHERE comment_id = $1")
                .bind(comment_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(LikeOutcome {
            like_count,
            is_liked,
        })
    }

    async fn top_level_comments(&self, content_id: Uuid) -> EngineResult<Vec<Comment>> {
        let records = sqlx::query_as::<Postgres, CommentRecord>(&format!(
            "SELECT {} FROM comments m \
             WHERE m.content_id = $1 AND m.parent_id IS NULL AND m.is_deleted = FALSE \
             ORDER BY m.created_at DESC, m.id DESC",
            COMMENT_COLS
        ))
        .bind(content_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn comment_replies(&self, parent_id: Uuid) -> EngineResult<Vec<Comment>> {
        let records = sqlx::query_as::<Postgres, CommentRecord>(&format!(
            "SELECT {} FROM comments m \
             WHERE m.parent_id = $1 AND m.is_deleted = FALSE \
             ORDER BY m.created_at ASC, m.id ASC",
            COMMENT_COLS
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

/// Escapes LIKE metacharacters so free text matches literally. `%`, `_`,
/// and the `\` escape character itself carry meaning inside an ILIKE
/// pattern; the search contract is a plain substring match.
fn escape_like(search: &str) -> String {
    search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Appends the shared WHERE clauses for listing queries: published and
/// non-deleted always, plus the composed (conjunctive) filters.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ContentQuery) {
    qb.push(" WHERE c.is_deleted = FALSE AND c.status = 'published'");
    if let Some(slug) = &query.filter.category_slug {
        qb.push(" AND cat.slug = ");
        qb.push_bind(slug.clone());
    }
    if let Some(search) = &query.filter.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (c.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR c.body ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR EXISTS (SELECT 1 FROM unnest(c.tags) AS t WHERE t ILIKE ");
        qb.push_bind(pattern);
        qb.push("))");
    }
    if let Some(featured) = query.filter.featured {
        qb.push(" AND c.featured = ");
        qb.push_bind(featured);
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped_for_literal_matching() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_c"), "a\\_c");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain text"), "plain text");
    }
}
