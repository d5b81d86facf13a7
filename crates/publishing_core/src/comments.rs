//! crates/publishing_core/src/comments.rs
//!
//! Owns threaded, soft-deletable reader comments. Threading is a single
//! parent pointer: replies are fetched by parent reference, never embedded,
//! so deep threads take repeated lookups by the caller.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    AuthContext, Comment, CommentDetail, LikeOutcome, MAX_COMMENT_LEN,
};
use crate::ports::{ContentStore, EngineError, EngineResult};

/// Input for a new comment. `parent_id` must point at a comment on the same
/// content; cross-content parenting is rejected.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content_id: Uuid,
    pub body: String,
    pub parent_id: Option<Uuid>,
}

/// Owns the comment threads attached to content.
#[derive(Clone)]
pub struct CommentThread {
    store: Arc<dyn ContentStore>,
}

impl CommentThread {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Adds a comment to non-deleted content.
    pub async fn add(&self, ctx: &AuthContext, new: NewComment) -> EngineResult<Comment> {
        let body = validate_body(&new.body)?;

        let content = self.store.content_by_id(new.content_id).await?;
        if content.is_deleted {
            return Err(EngineError::NotFound(format!(
                "Content {} not found",
                new.content_id
            )));
        }

        if let Some(parent_id) = new.parent_id {
            let parent = self.store.comment_by_id(parent_id).await?;
            if parent.is_deleted {
                return Err(EngineError::NotFound(format!(
                    "Comment {} not found",
                    parent_id
                )));
            }
            if parent.content_id != new.content_id {
                return Err(EngineError::Validation(
                    "parent comment belongs to different content".into(),
                ));
            }
        }

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            content_id: new.content_id,
            author_id: ctx.account_id(),
            body,
            parent_id: new.parent_id,
            is_deleted: false,
            like_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_comment(&comment).await?;
        Ok(comment)
    }

    /// Rewrites a comment's body. Author only; unlike content there is no
    /// admin override for comments.
    pub async fn edit(&self, ctx: &AuthContext, comment_id: Uuid, body: String) -> EngineResult<Comment> {
        let mut comment = self.visible_by_id(comment_id).await?;
        if comment.author_id != ctx.account_id() {
            return Err(forbidden());
        }
        comment.body = validate_body(&body)?;
        comment.updated_at = Utc::now();
        self.store.update_comment(&comment).await?;
        Ok(comment)
    }

    /// Soft-deletes a comment. Author only.
    pub async fn remove(&self, ctx: &AuthContext, comment_id: Uuid) -> EngineResult<()> {
        let mut comment = self.visible_by_id(comment_id).await?;
        if comment.author_id != ctx.account_id() {
            return Err(forbidden());
        }
        comment.is_deleted = true;
        comment.updated_at = Utc::now();
        self.store.update_comment(&comment).await
    }

    /// Flips the reader's membership in the comment's like set.
    pub async fn toggle_like(
        &self,
        ctx: &AuthContext,
        comment_id: Uuid,
    ) -> EngineResult<LikeOutcome> {
        let comment = self.visible_by_id(comment_id).await?;
        self.store
            .toggle_comment_like(comment.id, ctx.account_id())
            .await
    }

    /// Top-level comments for a content row, newest first, with authors.
    pub async fn top_level(&self, content_id: Uuid) -> EngineResult<Vec<CommentDetail>> {
        let content = self.store.content_by_id(content_id).await?;
        if content.is_deleted {
            return Err(EngineError::NotFound(format!(
                "Content {} not found",
                content_id
            )));
        }
        let comments = self.store.top_level_comments(content_id).await?;
        self.with_authors(comments).await
    }

    /// Direct replies to one comment, oldest first, with authors.
    pub async fn replies(&self, parent_id: Uuid) -> EngineResult<Vec<CommentDetail>> {
        self.visible_by_id(parent_id).await?;
        let comments = self.store.comment_replies(parent_id).await?;
        self.with_authors(comments).await
    }

    async fn with_authors(&self, comments: Vec<Comment>) -> EngineResult<Vec<CommentDetail>> {
        let mut authors = HashMap::new();
        let mut out = Vec::with_capacity(comments.len());
        for comment in comments {
            if !authors.contains_key(&comment.author_id) {
                let account = self.store.account_by_id(comment.author_id).await?;
                authors.insert(comment.author_id, account);
            }
            out.push(CommentDetail {
                author: authors[&comment.author_id].clone(),
                comment,
            });
        }
        Ok(out)
    }

    async fn visible_by_id(&self, id: Uuid) -> EngineResult<Comment> {
        let comment = self.store.comment_by_id(id).await?;
        if comment.is_deleted {
            return Err(EngineError::NotFound(format!("Comment {} not found", id)));
        }
        Ok(comment)
    }
}

fn forbidden() -> EngineError {
    EngineError::Forbidden("only the comment author may do this".into())
}

fn validate_body(body: &str) -> EngineResult<String> {
    let body = body.trim();
    if body.is_empty() {
        return Err(EngineError::Validation("comment body is required".into()));
    }
    if body.chars().count() > MAX_COMMENT_LEN {
        return Err(EngineError::Validation(format!(
            "comment body cannot exceed {} characters",
            MAX_COMMENT_LEN
        )));
    }
    Ok(body.to_string())
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::lifecycle::ContentLifecycle;
    use crate::slug::SlugRegistry;
    use crate::store_mem::MemoryStore;
    use crate::testing::new_content;

    struct Fixture {
        thread: CommentThread,
        author: AuthContext,
        reader: AuthContext,
        content_id: Uuid,
        store: Arc<MemoryStore>,
        lifecycle: ContentLifecycle,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let thread = CommentThread::new(store.clone());
        let lifecycle = ContentLifecycle::new(store.clone(), SlugRegistry::new(store.clone()));

        let author = AuthContext {
            account: store.seed_account("author", "author@x.com", Role::Reader),
        };
        let reader = AuthContext {
            account: store.seed_account("reader", "reader@x.com", Role::Reader),
        };
        let category = store.seed_category("General");
        let content = lifecycle
            .create(&author, new_content("Discussed", category.id))
            .await
            .unwrap();

        Fixture {
            thread,
            author,
            reader,
            content_id: content.id,
            store,
            lifecycle,
        }
    }

    fn top_comment(content_id: Uuid, body: &str) -> NewComment {
        NewComment {
            content_id,
            body: body.into(),
            parent_id: None,
        }
    }

    #[tokio::test]
    async fn top_level_listing_is_newest_first_and_skips_deleted() {
        let f = fixture().await;
        let first = f
            .thread
            .add(&f.reader, top_comment(f.content_id, "first"))
            .await
            .unwrap();
        let second = f
            .thread
            .add(&f.reader, top_comment(f.content_id, "second"))
            .await
            .unwrap();
        f.thread.remove(&f.reader, first.id).await.unwrap();

        let listed = f.thread.top_level(f.content_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].comment.id, second.id);

        // The deleted comment is excluded from reads but still stored.
        let raw = f.store.comment_by_id(first.id).await.unwrap();
        assert!(raw.is_deleted);
    }

    #[tokio::test]
    async fn replies_must_stay_on_the_same_content() {
        let f = fixture().await;
        let parent = f
            .thread
            .add(&f.reader, top_comment(f.content_id, "root"))
            .await
            .unwrap();

        let other_category = f.store.seed_category("Other");
        let other = f
            .lifecycle
            .create(&f.author, new_content("Elsewhere", other_category.id))
            .await
            .unwrap();

        let err = f
            .thread
            .add(
                &f.reader,
                NewComment {
                    content_id: other.id,
                    body: "cross-thread".into(),
                    parent_id: Some(parent.id),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let reply = f
            .thread
            .add(
                &f.reader,
                NewComment {
                    content_id: f.content_id,
                    body: "on-thread".into(),
                    parent_id: Some(parent.id),
                },
            )
            .await
            .unwrap();
        let replies = f.thread.replies(parent.id).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].comment.id, reply.id);
    }

    #[tokio::test]
    async fn only_the_author_may_remove_and_no_admin_override() {
        let f = fixture().await;
        let comment = f
            .thread
            .add(&f.reader, top_comment(f.content_id, "mine"))
            .await
            .unwrap();

        let admin = AuthContext {
            account: f.store.seed_account("root", "root@x.com", Role::Admin),
        };
        let err = f.thread.remove(&admin, comment.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));

        // Still visible after the failed removal.
        assert_eq!(f.thread.top_level(f.content_id).await.unwrap().len(), 1);

        f.thread.remove(&f.reader, comment.id).await.unwrap();
        assert!(f.thread.top_level(f.content_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_like_toggle_pair_restores_state() {
        let f = fixture().await;
        let comment = f
            .thread
            .add(&f.reader, top_comment(f.content_id, "likeable"))
            .await
            .unwrap();

        let on = f.thread.toggle_like(&f.author, comment.id).await.unwrap();
        assert!(on.is_liked);
        assert_eq!(on.like_count, 1);

        let off = f.thread.toggle_like(&f.author, comment.id).await.unwrap();
        assert!(!off.is_liked);
        assert_eq!(off.like_count, 0);
    }

    #[tokio::test]
    async fn commenting_on_deleted_content_is_not_found() {
        let f = fixture().await;
        f.lifecycle.soft_delete(&f.author, f.content_id).await.unwrap();

        let err = f
            .thread
            .add(&f.reader, top_comment(f.content_id, "too late"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn oversized_body_fails_validation() {
        let f = fixture().await;
        let err = f
            .thread
            .add(&f.reader, top_comment(f.content_id, &"x".repeat(MAX_COMMENT_LEN + 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
