//! crates/publishing_core/src/lifecycle.rs
//!
//! Owns the content aggregate: draft/publish transitions, soft delete, view
//! counting, and the like/bookmark toggles scoped to content. Slug derivation
//! runs synchronously before any persist.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    AuthContext, BookmarkOutcome, Category, Content, ContentDetail, ContentStatus, LikeOutcome,
    MAX_EXCERPT_LEN,
};
use crate::ports::{ContentStore, EngineError, EngineResult, NewCategory};
use crate::slug::SlugRegistry;

/// Authoring input for new content. `status` defaults to draft.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub title: String,
    pub body: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category_id: Uuid,
    pub tags: Vec<String>,
    pub status: Option<ContentStatus>,
    pub featured: bool,
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ContentStatus>,
    pub featured: Option<bool>,
}

/// Owns the content aggregate and its lifecycle rules.
#[derive(Clone)]
pub struct ContentLifecycle {
    store: Arc<dyn ContentStore>,
    slugs: SlugRegistry,
}

impl ContentLifecycle {
    pub fn new(store: Arc<dyn ContentStore>, slugs: SlugRegistry) -> Self {
        Self { store, slugs }
    }

    /// Validates, derives a unique slug, and persists new content. The slug
    /// is settled before the insert; a successful save implies the slug held.
    pub async fn create(&self, ctx: &AuthContext, new: NewContent) -> EngineResult<Content> {
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(EngineError::Validation("title is required".into()));
        }
        if new.body.trim().is_empty() {
            return Err(EngineError::Validation("body is required".into()));
        }
        if let Some(excerpt) = &new.excerpt {
            if excerpt.chars().count() > MAX_EXCERPT_LEN {
                return Err(EngineError::Validation(format!(
                    "excerpt cannot exceed {} characters",
                    MAX_EXCERPT_LEN
                )));
            }
        }
        // The category must resolve; a dangling reference is a caller error.
        let category = self.store.category_by_id(new.category_id).await.map_err(|e| {
            match e {
                EngineError::NotFound(_) => {
                    EngineError::Validation("category does not exist".into())
                }
                other => other,
            }
        })?;

        let slug = self.slugs.derive_content_slug(&title, None).await?;
        let status = new.status.unwrap_or(ContentStatus::Draft);
        let now = Utc::now();
        let content = Content {
            id: Uuid::new_v4(),
            title,
            slug,
            body: new.body,
            excerpt: new.excerpt,
            cover_image: new.cover_image,
            author_id: ctx.account_id(),
            category_id: category.id,
            tags: normalize_tags(new.tags),
            status,
            published_at: (status == ContentStatus::Published).then_some(now),
            views: 0,
            featured: new.featured,
            is_deleted: false,
            like_count: 0,
            bookmark_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_content(&content).await?;
        Ok(content)
    }

    /// Applies a patch under the ownership rule (author or admin). The slug
    /// is re-derived only when the title actually changes, and `published_at`
    /// is set exactly once, on the first transition to published.
    pub async fn update(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        patch: ContentPatch,
    ) -> EngineResult<Content> {
        let mut content = self.visible_by_id(id).await?;
        if !ctx.may_modify(content.author_id) {
            return Err(EngineError::Forbidden(
                "only the author or an admin may modify this content".into(),
            ));
        }

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(EngineError::Validation("title cannot be empty".into()));
            }
            if title != content.title {
                content.slug = self.slugs.derive_content_slug(&title, Some(id)).await?;
                content.title = title;
            }
        }
        if let Some(body) = patch.body {
            if body.trim().is_empty() {
                return Err(EngineError::Validation("body cannot be empty".into()));
            }
            content.body = body;
        }
        if let Some(excerpt) = patch.excerpt {
            if excerpt.chars().count() > MAX_EXCERPT_LEN {
                return Err(EngineError::Validation(format!(
                    "excerpt cannot exceed {} characters",
                    MAX_EXCERPT_LEN
                )));
            }
            content.excerpt = if excerpt.is_empty() { None } else { Some(excerpt) };
        }
        if let Some(cover_image) = patch.cover_image {
            content.cover_image = if cover_image.is_empty() {
                None
            } else {
                Some(cover_image)
            };
        }
        if let Some(category_id) = patch.category_id {
            let category = self.store.category_by_id(category_id).await.map_err(|e| {
                match e {
                    EngineError::NotFound(_) => {
                        EngineError::Validation("category does not exist".into())
                    }
                    other => other,
                }
            })?;
            content.category_id = category.id;
        }
        if let Some(tags) = patch.tags {
            content.tags = normalize_tags(tags);
        }
        if let Some(status) = patch.status {
            if status == ContentStatus::Published && content.published_at.is_none() {
                content.published_at = Some(Utc::now());
            }
            content.status = status;
        }
        if let Some(featured) = patch.featured {
            content.featured = featured;
        }

        content.updated_at = Utc::now();
        self.store.update_content(&content).await?;
        Ok(content)
    }

    /// Marks content deleted under the ownership rule. Comments and social
    /// edges are left in place; reads of deleted content exclude them.
    pub async fn soft_delete(&self, ctx: &AuthContext, id: Uuid) -> EngineResult<()> {
        let mut content = self.visible_by_id(id).await?;
        if !ctx.may_modify(content.author_id) {
            return Err(EngineError::Forbidden(
                "only the author or an admin may delete this content".into(),
            ));
        }
        content.is_deleted = true;
        content.updated_at = Utc::now();
        self.store.update_content(&content).await
    }

    /// Resolves a slug or textual id to non-deleted content and counts the
    /// read: every successful fetch adds exactly one view, with no
    /// deduplication by viewer.
    pub async fn fetch_by_slug_or_id(&self, key: &str) -> EngineResult<Content> {
        let mut content = match Uuid::parse_str(key) {
            Ok(id) => self.visible_by_id(id).await?,
            Err(_) => {
                let found = self.store.content_by_slug(key).await?;
                if found.is_deleted {
                    return Err(not_found(key));
                }
                found
            }
        };
        content.views = self.store.increment_views(content.id).await?;
        Ok(content)
    }

    /// Flips the reader's membership in the content's like set. Two calls in
    /// sequence restore the original state.
    pub async fn toggle_like(&self, ctx: &AuthContext, id: Uuid) -> EngineResult<LikeOutcome> {
        let content = self.visible_by_id(id).await?;
        self.store.toggle_content_like(content.id, ctx.account_id()).await
    }

    /// Flips the bookmark edge. The reader's `bookmarks` set and the
    /// content's bookmark set are both views of the same edge, so they end in
    /// a consistent state or the operation fails with no visible mutation.
    pub async fn toggle_bookmark(
        &self,
        ctx: &AuthContext,
        id: Uuid,
    ) -> EngineResult<BookmarkOutcome> {
        let content = self.visible_by_id(id).await?;
        self.store
            .toggle_content_bookmark(content.id, ctx.account_id())
            .await
    }

    /// The caller's bookmarked content, newest bookmark first.
    pub async fn bookmarks(&self, ctx: &AuthContext) -> EngineResult<Vec<Content>> {
        self.store.list_bookmarked_content(ctx.account_id()).await
    }

    /// Creates a category (administrative path, admin role required).
    pub async fn create_category(
        &self,
        ctx: &AuthContext,
        name: String,
        description: Option<String>,
        color: Option<String>,
    ) -> EngineResult<Category> {
        if !ctx.is_admin() {
            return Err(EngineError::Forbidden("admin role required".into()));
        }
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::Validation("name is required".into()));
        }
        let slug = self.slugs.derive_category_slug(&name, None).await?;
        self.store
            .create_category(NewCategory {
                name,
                slug,
                description,
                color,
            })
            .await
    }

    /// All categories, for listing surfaces.
    pub async fn categories(&self) -> EngineResult<Vec<Category>> {
        self.store.list_categories().await
    }

    /// Joins one content row with its author and category.
    pub async fn detail(&self, content: Content) -> EngineResult<ContentDetail> {
        let author = self.store.account_by_id(content.author_id).await?;
        let category = self.store.category_by_id(content.category_id).await?;
        Ok(ContentDetail {
            content,
            author,
            category,
        })
    }

    /// Joins a page of content rows, deduplicating author/category lookups.
    pub async fn details(&self, rows: Vec<Content>) -> EngineResult<Vec<ContentDetail>> {
        let mut authors = HashMap::new();
        let mut categories = HashMap::new();
        let mut out = Vec::with_capacity(rows.len());
        for content in rows {
            if !authors.contains_key(&content.author_id) {
                let account = self.store.account_by_id(content.author_id).await?;
                authors.insert(content.author_id, account);
            }
            if !categories.contains_key(&content.category_id) {
                let category = self.store.category_by_id(content.category_id).await?;
                categories.insert(content.category_id, category);
            }
            out.push(ContentDetail {
                author: authors[&content.author_id].clone(),
                category: categories[&content.category_id].clone(),
                content,
            });
        }
        Ok(out)
    }

    /// Fetches by id and hides soft-deleted rows behind `NotFound`.
    async fn visible_by_id(&self, id: Uuid) -> EngineResult<Content> {
        let content = self.store.content_by_id(id).await?;
        if content.is_deleted {
            return Err(not_found(&id.to_string()));
        }
        Ok(content)
    }
}

fn not_found(key: &str) -> EngineError {
    EngineError::NotFound(format!("Content {} not found", key))
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_mem::MemoryStore;
    use crate::testing::new_content;
    use crate::domain::Role;

    fn fixture() -> (ContentLifecycle, AuthContext, Uuid, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let slugs = SlugRegistry::new(store.clone());
        let lifecycle = ContentLifecycle::new(store.clone(), slugs);

        let account = store.seed_account("author", "author@x.com", Role::Reader);
        let category = store.seed_category("General");
        (lifecycle, AuthContext { account }, category.id, store)
    }

    fn ctx_for(store: &MemoryStore, handle: &str, role: Role) -> AuthContext {
        AuthContext {
            account: store.seed_account(handle, &format!("{}@x.com", handle), role),
        }
    }

    #[tokio::test]
    async fn same_title_twice_gets_distinct_slugs() {
        let (lifecycle, ctx, category, _store) = fixture();
        let first = lifecycle.create(&ctx, new_content("Hello World", category)).await.unwrap();
        let second = lifecycle.create(&ctx, new_content("Hello World", category)).await.unwrap();

        assert_eq!(first.slug, "hello-world");
        assert!(second.slug.starts_with("hello-world-"));
        assert_ne!(first.slug, second.slug);
    }

    #[tokio::test]
    async fn create_defaults_to_draft_without_published_at() {
        let (lifecycle, ctx, category, _store) = fixture();
        let mut input = new_content("Draft piece", category);
        input.status = None;
        let content = lifecycle.create(&ctx, input).await.unwrap();

        assert_eq!(content.status, ContentStatus::Draft);
        assert!(!content.is_published());
        assert!(content.published_at.is_none());
    }

    #[tokio::test]
    async fn first_publish_sets_published_at_exactly_once() {
        let (lifecycle, ctx, category, _store) = fixture();
        let mut input = new_content("Evolving piece", category);
        input.status = None;
        let content = lifecycle.create(&ctx, input).await.unwrap();

        let published = lifecycle
            .update(
                &ctx,
                content.id,
                ContentPatch {
                    status: Some(ContentStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let stamp = published.published_at.unwrap();

        // Unpublish and re-publish: the original timestamp survives.
        lifecycle
            .update(
                &ctx,
                content.id,
                ContentPatch {
                    status: Some(ContentStatus::Draft),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let republished = lifecycle
            .update(
                &ctx,
                content.id,
                ContentPatch {
                    status: Some(ContentStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(republished.published_at.unwrap(), stamp);
    }

    #[tokio::test]
    async fn slug_is_rederived_only_when_title_changes() {
        let (lifecycle, ctx, category, _store) = fixture();
        let content = lifecycle.create(&ctx, new_content("Stable Title", category)).await.unwrap();

        let body_only = lifecycle
            .update(
                &ctx,
                content.id,
                ContentPatch {
                    body: Some("new body".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(body_only.slug, content.slug);

        let retitled = lifecycle
            .update(
                &ctx,
                content.id,
                ContentPatch {
                    title: Some("Fresh Title".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(retitled.slug, "fresh-title");
    }

    #[tokio::test]
    async fn strangers_cannot_update_but_admins_can() {
        let (lifecycle, ctx, category, store) = fixture();
        let content = lifecycle.create(&ctx, new_content("Mine", category)).await.unwrap();

        let stranger = ctx_for(&store, "stranger", Role::Reader);
        let err = lifecycle
            .update(
                &stranger,
                content.id,
                ContentPatch {
                    body: Some("hijacked".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));

        let admin = ctx_for(&store, "root", Role::Admin);
        lifecycle
            .update(
                &admin,
                content.id,
                ContentPatch {
                    featured: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn soft_deleted_content_is_hidden_but_kept() {
        let (lifecycle, ctx, category, store) = fixture();
        let content = lifecycle.create(&ctx, new_content(" Phantom", category)).await.unwrap();

        lifecycle.soft_delete(&ctx, content.id).await.unwrap();

        let err = lifecycle.fetch_by_slug_or_id("phantom").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));

        // Still present in storage, only flagged.
        let raw = store.content_by_id(content.id).await.unwrap();
        assert!(raw.is_deleted);
    }

    #[tokio::test]
    async fn every_fetch_adds_exactly_one_view() {
        let (lifecycle, ctx, category, _store) = fixture();
        let content = lifecycle.create(&ctx, new_content("Counted", category)).await.unwrap();

        let first = lifecycle.fetch_by_slug_or_id("counted").await.unwrap();
        let second = lifecycle
            .fetch_by_slug_or_id(&content.id.to_string())
            .await
            .unwrap();
        assert_eq!(first.views, 1);
        assert_eq!(second.views, 2);
    }

    #[tokio::test]
    async fn like_toggle_pair_restores_original_state() {
        let (lifecycle, ctx, category, _store) = fixture();
        let content = lifecycle.create(&ctx, new_content("Likeable", category)).await.unwrap();

        let on = lifecycle.toggle_like(&ctx, content.id).await.unwrap();
        assert!(on.is_liked);
        assert_eq!(on.like_count, 1);

        let off = lifecycle.toggle_like(&ctx, content.id).await.unwrap();
        assert!(!off.is_liked);
        assert_eq!(off.like_count, 0);
    }

    #[tokio::test]
    async fn bookmark_toggle_mirrors_into_the_account_side() {
        let (lifecycle, ctx, category, _store) = fixture();
        let content = lifecycle.create(&ctx, new_content("Keeper", category)).await.unwrap();

        let on = lifecycle.toggle_bookmark(&ctx, content.id).await.unwrap();
        assert!(on.is_bookmarked);

        let mine = lifecycle.bookmarks(&ctx).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, content.id);

        lifecycle.toggle_bookmark(&ctx, content.id).await.unwrap();
        assert!(lifecycle.bookmarks(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn category_counters_follow_moves_and_deletion() {
        let (lifecycle, ctx, category, store) = fixture();
        let other = store.seed_category("Elsewhere");
        let content = lifecycle.create(&ctx, new_content("Roving", category)).await.unwrap();
        assert_eq!(store.category_by_id(category).await.unwrap().content_count, 1);

        // Moving to another category shifts both counters.
        lifecycle
            .update(
                &ctx,
                content.id,
                ContentPatch {
                    category_id: Some(other.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(store.category_by_id(category).await.unwrap().content_count, 0);
        assert_eq!(store.category_by_id(other.id).await.unwrap().content_count, 1);

        // Soft delete drops the count in the new home.
        lifecycle.soft_delete(&ctx, content.id).await.unwrap();
        assert_eq!(store.category_by_id(other.id).await.unwrap().content_count, 0);
    }

    #[tokio::test]
    async fn missing_category_fails_validation() {
        let (lifecycle, ctx, _, _store) = fixture();
        let err = lifecycle
            .create(&ctx, new_content("Orphan", Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
