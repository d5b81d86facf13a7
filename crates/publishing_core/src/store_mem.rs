//! crates/publishing_core/src/store_mem.rs
//!
//! An in-memory `ContentStore` used by the engine's tests. Edges (follows,
//! likes, bookmarks) live in single relation sets, mirroring the schema the
//! SQL adapter uses, so derived counts can never disagree between the two
//! sides of a relationship.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Account, AccountCredentials, BookmarkOutcome, Category, Comment, Content, FollowStats,
    LikeOutcome, Role,
};
use crate::ports::{
    ContentStore, EngineError, EngineResult, NewAccount, NewCategory,
};
use crate::query::{ContentQuery, SortKey};
use crate::slug::slugify;

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    credentials: Vec<AccountCredentials>,
    contents: Vec<Content>,
    categories: Vec<Category>,
    comments: Vec<Comment>,
    /// (follower, followee)
    follows: HashSet<(Uuid, Uuid)>,
    /// (account, content), insertion-ordered so "newest bookmark first" holds.
    bookmarks: Vec<(Uuid, Uuid)>,
    /// (content, account) -> liked-at
    content_likes: HashMap<(Uuid, Uuid), DateTime<Utc>>,
    /// (comment, account)
    comment_likes: HashSet<(Uuid, Uuid)>,
    /// Insertion sequence per comment id, for stable newest-first ordering.
    comment_seq: HashMap<Uuid, u64>,
    next_seq: u64,
}

/// The in-memory store. All trait methods take the single lock for their
/// whole body, which makes every toggle an atomic read-modify-write.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an account directly, bypassing registration. Test seeding.
    pub fn seed_account(&self, handle: &str, email: &str, role: Role) -> Account {
        let account = Account {
            id: Uuid::new_v4(),
            handle: handle.to_string(),
            email: email.to_string(),
            first_name: "Seed".to_string(),
            last_name: handle.to_string(),
            bio: None,
            avatar_url: None,
            role,
            is_active: true,
            created_at: Utc::now(),
        };
        let mut inner = self.inner.lock().unwrap();
        inner.credentials.push(AccountCredentials {
            account_id: account.id,
            email: account.email.clone(),
            hashed_secret: String::new(),
            is_active: true,
        });
        inner.accounts.push(account.clone());
        account
    }

    /// Inserts a category directly. Test seeding.
    pub fn seed_category(&self, name: &str) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
            description: None,
            color: None,
            is_active: true,
            content_count: 0,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().categories.push(category.clone());
        category
    }

    /// Flips deactivation on an account. Test seeding.
    pub fn deactivate_account(&self, id: Uuid) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(account) = inner.accounts.iter_mut().find(|a| a.id == id) {
            account.is_active = false;
        }
        if let Some(creds) = inner.credentials.iter_mut().find(|c| c.account_id == id) {
            creds.is_active = false;
        }
    }
}

/// Fills the derived like/bookmark counts on a content row at read time.
fn filled(inner: &Inner, mut content: Content) -> Content {
    content.like_count = inner
        .content_likes
        .keys()
        .filter(|(c, _)| *c == content.id)
        .count() as i64;
    content.bookmark_count = inner
        .bookmarks
        .iter()
        .filter(|(_, c)| *c == content.id)
        .count() as i64;
    content
}

fn filled_comment(inner: &Inner, mut comment: Comment) -> Comment {
    comment.like_count = inner
        .comment_likes
        .iter()
        .filter(|(c, _)| *c == comment.id)
        .count() as i64;
    comment
}

#[async_trait]
impl ContentStore for MemoryStore {
    // --- Accounts ---

    async fn create_account(&self, new: NewAccount) -> EngineResult<Account> {
        let mut inner = self.inner.lock().unwrap();
        if inner.accounts.iter().any(|a| a.handle == new.handle) {
            return Err(EngineError::Conflict("handle is already taken".into()));
        }
        if inner.accounts.iter().any(|a| a.email == new.email) {
            return Err(EngineError::Conflict("email is already registered".into()));
        }
        let account = Account {
            id: Uuid::new_v4(),
            handle: new.handle,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            bio: None,
            avatar_url: None,
            role: Role::Reader,
            is_active: true,
            created_at: Utc::now(),
        };
        inner.credentials.push(AccountCredentials {
            account_id: account.id,
            email: account.email.clone(),
            hashed_secret: new.hashed_secret,
            is_active: true,
        });
        inner.accounts.push(account.clone());
        Ok(account)
    }

    async fn account_by_id(&self, id: Uuid) -> EngineResult<Account> {
        let inner = self.inner.lock().unwrap();
        inner
            .accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("Account {} not found", id)))
    }

    async fn credentials_by_email(&self, email: &str) -> EngineResult<AccountCredentials> {
        let inner = self.inner.lock().unwrap();
        inner
            .credentials
            .iter()
            .find(|c| c.email == email)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("Account {} not found", email)))
    }

    async fn update_account(&self, account: &Account) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner
            .accounts
            .iter_mut()
            .find(|a| a.id == account.id)
            .ok_or_else(|| EngineError::NotFound(format!("Account {} not found", account.id)))?;
        *slot = account.clone();
        Ok(())
    }

    async fn follow_stats(
        &self,
        account_id: Uuid,
        viewer: Option<Uuid>,
    ) -> EngineResult<FollowStats> {
        let inner = self.inner.lock().unwrap();
        Ok(FollowStats {
            follower_count: inner.follows.iter().filter(|(_, f)| *f == account_id).count() as i64,
            following_count: inner.follows.iter().filter(|(f, _)| *f == account_id).count() as i64,
            is_following: viewer
                .map(|v| inner.follows.contains(&(v, account_id)))
                .unwrap_or(false),
        })
    }

    async fn toggle_follow(&self, follower: Uuid, followee: Uuid) -> EngineResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let edge = (follower, followee);
        if inner.follows.remove(&edge) {
            Ok(false)
        } else {
            inner.follows.insert(edge);
            Ok(true)
        }
    }

    // --- Content ---

    async fn insert_content(&self, content: &Content) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.contents.iter().any(|c| c.slug == content.slug) {
            return Err(EngineError::Conflict(format!(
                "slug '{}' is already taken",
                content.slug
            )));
        }
        if let Some(category) = inner
            .categories
            .iter_mut()
            .find(|c| c.id == content.category_id)
        {
            category.content_count += 1;
        }
        inner.contents.push(content.clone());
        Ok(())
    }

    async fn content_by_id(&self, id: Uuid) -> EngineResult<Content> {
        let inner = self.inner.lock().unwrap();
        inner
            .contents
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .map(|c| filled(&inner, c))
            .ok_or_else(|| EngineError::NotFound(format!("Content {} not found", id)))
    }

    async fn content_by_slug(&self, slug: &str) -> EngineResult<Content> {
        let inner = self.inner.lock().unwrap();
        inner
            .contents
            .iter()
            .find(|c| c.slug == slug)
            .cloned()
            .map(|c| filled(&inner, c))
            .ok_or_else(|| EngineError::NotFound(format!("Content {} not found", slug)))
    }

    async fn update_content(&self, content: &Content) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .contents
            .iter()
            .any(|c| c.slug == content.slug && c.id != content.id)
        {
            return Err(EngineError::Conflict(format!(
                "slug '{}' is already taken",
                content.slug
            )));
        }
        let (old_category, was_deleted) = inner
            .contents
            .iter()
            .find(|c| c.id == content.id)
            .map(|c| (c.category_id, c.is_deleted))
            .ok_or_else(|| EngineError::NotFound(format!("Content {} not found", content.id)))?;
        // Keep category counters in step with visibility and category moves,
        // matching the SQL adapter.
        let counted_before = !was_deleted;
        let counted_after = !content.is_deleted;
        if counted_before != counted_after || old_category != content.category_id {
            if counted_before {
                if let Some(category) =
                    inner.categories.iter_mut().find(|c| c.id == old_category)
                {
                    category.content_count -= 1;
                }
            }
            if counted_after {
                if let Some(category) = inner
                    .categories
                    .iter_mut()
                    .find(|c| c.id == content.category_id)
                {
                    category.content_count += 1;
                }
            }
        }
        let views = inner
            .contents
            .iter()
            .find(|c| c.id == content.id)
            .map(|c| c.views)
            .unwrap_or(content.views);
        let slot = inner
            .contents
            .iter_mut()
            .find(|c| c.id == content.id)
            .expect("checked above");
        *slot = content.clone();
        // The view counter is owned by `increment_views`; writes never clobber it.
        slot.views = views;
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> EngineResult<i64> {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner
            .contents
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("Content {} not found", id)))?;
        slot.views += 1;
        Ok(slot.views)
    }

    async fn content_slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> EngineResult<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .contents
            .iter()
            .any(|c| c.slug == slug && Some(c.id) != exclude))
    }

    async fn toggle_content_like(
        &self,
        content_id: Uuid,
        account_id: Uuid,
    ) -> EngineResult<LikeOutcome> {
        let mut inner = self.inner.lock().unwrap();
        let key = (content_id, account_id);
        let is_liked = if inner.content_likes.remove(&key).is_some() {
            false
        } else {
            inner.content_likes.insert(key, Utc::now());
            true
        };
        let like_count = inner
            .content_likes
            .keys()
            .filter(|(c, _)| *c == content_id)
            .count() as i64;
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
        let mut inner = self.inner.lock().unwrap();
        let pos = inner
            .bookmarks
            .iter()
            .position(|&(a, c)| a == account_id && c == content_id);
        let is_bookmarked = match pos {
            Some(pos) => {
                inner.bookmarks.remove(pos);
                false
            }
            None => {
                inner.bookmarks.push((account_id, content_id));
                true
            }
        };
        let bookmark_count = inner
            .bookmarks
            .iter()
            .filter(|(_, c)| *c == content_id)
            .count() as i64;
        Ok(BookmarkOutcome {
            bookmark_count,
            is_bookmarked,
        })
    }

    async fn list_content(&self, query: &ContentQuery) -> EngineResult<(Vec<Content>, i64)> {
        let inner = self.inner.lock().unwrap();

        let category_id = match &query.filter.category_slug {
            Some(slug) => match inner.categories.iter().find(|c| &c.slug == slug) {
                Some(category) => Some(category.id),
                // Unknown category matches nothing.
                None => return Ok((vec![], 0)),
            },
            None => None,
        };
        let needle = query.filter.search.as_ref().map(|s| s.to_lowercase());

        let mut rows: Vec<Content> = inner
            .contents
            .iter()
            .filter(|c| c.is_published() && !c.is_deleted)
            .filter(|c| category_id.map_or(true, |id| c.category_id == id))
            .filter(|c| {
                needle.as_ref().map_or(true, |needle| {
                    c.title.to_lowercase().contains(needle)
                        || c.body.to_lowercase().contains(needle)
                        || c.tags.iter().any(|t| t.to_lowercase().contains(needle))
                })
            })
            .filter(|c| query.filter.featured.map_or(true, |f| c.featured == f))
            .cloned()
            .map(|c| filled(&inner, c))
            .collect();

        match query.sort {
            SortKey::Newest => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortKey::Oldest => rows.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortKey::Popular => rows.sort_by(|a, b| {
                b.like_count
                    .cmp(&a.like_count)
                    .then(b.created_at.cmp(&a.created_at))
            }),
            SortKey::Views => rows.sort_by(|a, b| {
                b.views.cmp(&a.views).then(b.created_at.cmp(&a.created_at))
            }),
        }

        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn list_bookmarked_content(&self, account_id: Uuid) -> EngineResult<Vec<Content>> {
        let inner = self.inner.lock().unwrap();
        let rows = inner
            .bookmarks
            .iter()
            .rev()
            .filter(|(a, _)| *a == account_id)
            .filter_map(|(_, content_id)| {
                inner
                    .contents
                    .iter()
                    .find(|c| c.id == *content_id && !c.is_deleted)
                    .cloned()
                    .map(|c| filled(&inner, c))
            })
            .collect();
        Ok(rows)
    }

    // --- Categories ---

    async fn create_category(&self, new: NewCategory) -> EngineResult<Category> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .categories
            .iter()
            .any(|c| c.name == new.name || c.slug == new.slug)
        {
            return Err(EngineError::Conflict("category already exists".into()));
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: new.name,
            slug: new.slug,
            description: new.description,
            color: new.color,
            is_active: true,
            content_count: 0,
            created_at: Utc::now(),
        };
        inner.categories.push(category.clone());
        Ok(category)
    }

    async fn category_by_id(&self, id: Uuid) -> EngineResult<Category> {
        let inner = self.inner.lock().unwrap();
        inner
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("Category {} not found", id)))
    }

    async fn category_by_slug(&self, slug: &str) -> EngineResult<Category> {
        let inner = self.inner.lock().unwrap();
        inner
            .categories
            .iter()
            .find(|c| c.slug == slug)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("Category {} not found", slug)))
    }

    async fn list_categories(&self) -> EngineResult<Vec<Category>> {
        let inner = self.inner.lock().unwrap();
        let mut rows = inner.categories.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn category_slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> EngineResult<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .categories
            .iter()
            .any(|c| c.slug == slug && Some(c.id) != exclude))
    }

    // --- Comments ---

    async fn insert_comment(&self, comment: &Comment) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.comment_seq.insert(comment.id, seq);
        inner.comments.push(comment.clone());
        Ok(())
    }

    async fn comment_by_id(&self, id: Uuid) -> EngineResult<Comment> {
        let inner = self.inner.lock().unwrap();
        inner
            .comments
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .map(|c| filled_comment(&inner, c))
            .ok_or_else(|| EngineError::NotFound(format!("Comment {} not found", id)))
    }

    async fn update_comment(&self, comment: &Comment) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner
            .comments
            .iter_mut()
            .find(|c| c.id == comment.id)
            .ok_or_else(|| EngineError::NotFound(format!("Comment {} not found", comment.id)))?;
        *slot = comment.clone();
        Ok(())
    }

    async fn toggle_comment_like(
        &self,
        comment_id: Uuid,
        account_id: Uuid,
    ) -> EngineResult<LikeOutcome> {
        let mut inner = self.inner.lock().unwrap();
        let key = (comment_id, account_id);
        let is_liked = if inner.comment_likes.remove(&key) {
            false
        } else {
            inner.comment_likes.insert(key);
            true
        };
        let like_count = inner
            .comment_likes
            .iter()
            .filter(|(c, _)| *c == comment_id)
            .count() as i64;
        Ok(LikeOutcome {
            like_count,
            is_liked,
        })
    }

    async fn top_level_comments(&self, content_id: Uuid) -> EngineResult<Vec<Comment>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Comment> = inner
            .comments
            .iter()
            .filter(|c| c.content_id == content_id && c.parent_id.is_none() && !c.is_deleted)
            .cloned()
            .map(|c| filled_comment(&inner, c))
            .collect();
        // Newest first; the insertion sequence breaks same-instant ties.
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(inner.comment_seq[&b.id].cmp(&inner.comment_seq[&a.id]))
        });
        Ok(rows)
    }

    async fn comment_replies(&self, parent_id: Uuid) -> EngineResult<Vec<Comment>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Comment> = inner
            .comments
            .iter()
            .filter(|c| c.parent_id == Some(parent_id) && !c.is_deleted)
            .cloned()
            .map(|c| filled_comment(&inner, c))
            .collect();
        rows.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(inner.comment_seq[&a.id].cmp(&inner.comment_seq[&b.id]))
        });
        Ok(rows)
    }
}
