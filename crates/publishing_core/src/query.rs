//! crates/publishing_core/src/query.rs
//!
//! Composes filter, sort, and pagination parameters into store queries over
//! content and owns the pagination contract returned to callers.

use std::sync::Arc;

use crate::domain::Content;
use crate::ports::{ContentStore, EngineResult};

/// The sort orders a listing may request. Ties are always broken by creation
/// time descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    /// By like-set size.
    Popular,
    /// By the view counter.
    Views,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<SortKey> {
        match s {
            "newest" => Some(SortKey::Newest),
            "oldest" => Some(SortKey::Oldest),
            "popular" => Some(SortKey::Popular),
            "views" => Some(SortKey::Views),
            _ => None,
        }
    }
}

/// Conjunctive content filters. Free text is a case-insensitive substring
/// match across title, body, and tags; never a ranked search.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub category_slug: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

/// A caller-requested page, before clamping.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

/// The stable pagination envelope: `total` is the filtered count and
/// `total_pages = ceil(total / page_size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// One page of results plus the envelope.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// The fully resolved query handed to the store: filters, sort, and a
/// limit/offset window. Listings only ever surface published, non-deleted
/// content.
#[derive(Debug, Clone)]
pub struct ContentQuery {
    pub filter: ContentFilter,
    pub sort: SortKey,
    pub limit: i64,
    pub offset: i64,
}

/// Composes listing queries over the content collection.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn ContentStore>,
    default_page_size: i64,
    max_page_size: i64,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn ContentStore>, default_page_size: i64, max_page_size: i64) -> Self {
        Self {
            store,
            default_page_size,
            max_page_size,
        }
    }

    pub fn default_page_size(&self) -> i64 {
        self.default_page_size
    }

    /// Runs a composed listing. A page past the end yields an empty page
    /// inside a well-formed envelope, not an error.
    pub async fn list(
        &self,
        filter: ContentFilter,
        sort: SortKey,
        page: PageRequest,
    ) -> EngineResult<Page<Content>> {
        let page_size = page.page_size.clamp(1, self.max_page_size);
        let page_no = page.page.max(1);

        let query = ContentQuery {
            filter,
            sort,
            limit: page_size,
            offset: (page_no - 1) * page_size,
        };
        let (data, total) = self.store.list_content(&query).await?;

        let total_pages = if total == 0 {
            0
        } else {
            (total + page_size - 1) / page_size
        };

        Ok(Page {
            data,
            pagination: Pagination {
                page: page_no,
                page_size,
                total,
                total_pages,
            },
        })
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuthContext, ContentStatus, Role};
    use crate::lifecycle::ContentLifecycle;
    use crate::slug::SlugRegistry;
    use crate::store_mem::MemoryStore;
    use crate::testing::new_content;
    use std::sync::Arc;
    use uuid::Uuid;

    struct Fixture {
        engine: QueryEngine,
        lifecycle: ContentLifecycle,
        ctx: AuthContext,
        category_id: Uuid,
        store: Arc<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let engine = QueryEngine::new(store.clone() as Arc<dyn ContentStore>, 10, 50);
        let lifecycle = ContentLifecycle::new(store.clone(), SlugRegistry::new(store.clone()));
        let ctx = AuthContext {
            account: store.seed_account("author", "author@x.com", Role::Reader),
        };
        let category_id = store.seed_category("General").id;
        Fixture {
            engine,
            lifecycle,
            ctx,
            category_id,
            store,
        }
    }

    fn page(n: i64, size: i64) -> PageRequest {
        PageRequest {
            page: n,
            page_size: size,
        }
    }

    #[tokio::test]
    async fn pages_partition_the_filtered_set() {
        let f = fixture();
        for i in 0..12 {
            f.lifecycle
                .create(&f.ctx, new_content(&format!("Piece {}", i), f.category_id))
                .await
                .unwrap();
        }

        let mut seen = 0;
        let mut page_no = 1;
        loop {
            let result = f
                .engine
                .list(ContentFilter::default(), SortKey::Newest, page(page_no, 5))
                .await
                .unwrap();
            assert_eq!(result.pagination.total, 12);
            assert_eq!(result.pagination.total_pages, 3);
            if result.data.is_empty() {
                break;
            }
            seen += result.data.len();
            page_no += 1;
        }
        assert_eq!(seen, 12);
    }

    #[tokio::test]
    async fn page_beyond_the_end_is_empty_not_an_error() {
        let f = fixture();
        f.lifecycle
            .create(&f.ctx, new_content("Only one", f.category_id))
            .await
            .unwrap();

        let result = f
            .engine
            .list(ContentFilter::default(), SortKey::Newest, page(9, 5))
            .await
            .unwrap();
        assert!(result.data.is_empty());
        assert_eq!(result.pagination.total, 1);
        assert_eq!(result.pagination.total_pages, 1);
        assert_eq!(result.pagination.page, 9);
    }

    #[tokio::test]
    async fn search_matches_wildcard_characters_literally() {
        let f = fixture();
        f.lifecycle
            .create(&f.ctx, new_content("Giving 100% Every Day", f.category_id))
            .await
            .unwrap();
        f.lifecycle
            .create(&f.ctx, new_content("100 Days of Code", f.category_id))
            .await
            .unwrap();

        // "%" is a plain character in a search, not a wildcard.
        let result = f
            .engine
            .list(
                ContentFilter {
                    search: Some("100%".into()),
                    ..Default::default()
                },
                SortKey::Newest,
                page(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(result.pagination.total, 1);
        assert_eq!(result.data[0].title, "Giving 100% Every Day");

        // Same for "_": it never matches an arbitrary character.
        let result = f
            .engine
            .list(
                ContentFilter {
                    search: Some("1_0".into()),
                    ..Default::default()
                },
                SortKey::Newest,
                page(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(result.pagination.total, 0);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_published_only() {
        let f = fixture();
        f.lifecycle
            .create(&f.ctx, new_content("Learning React Hooks", f.category_id))
            .await
            .unwrap();
        let mut draft = new_content("React for Draftsmen", f.category_id);
        draft.status = Some(ContentStatus::Draft);
        f.lifecycle.create(&f.ctx, draft).await.unwrap();
        f.lifecycle
            .create(&f.ctx, new_content("Unrelated Cooking", f.category_id))
            .await
            .unwrap();

        let result = f
            .engine
            .list(
                ContentFilter {
                    search: Some("REACT".into()),
                    ..Default::default()
                },
                SortKey::Newest,
                page(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(result.pagination.total, 1);
        assert_eq!(result.data[0].title, "Learning React Hooks");
    }

    #[tokio::test]
    async fn search_also_matches_tags() {
        let f = fixture();
        let mut tagged = new_content("Untelling Title", f.category_id);
        tagged.tags = vec!["Rust".into(), "systems".into()];
        f.lifecycle.create(&f.ctx, tagged).await.unwrap();

        let result = f
            .engine
            .list(
                ContentFilter {
                    search: Some("rust".into()),
                    ..Default::default()
                },
                SortKey::Newest,
                page(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(result.pagination.total, 1);
    }

    #[tokio::test]
    async fn filters_compose_conjunctively() {
        let f = fixture();
        let other = f.store.seed_category("Other");

        let mut featured = new_content("Featured Here", f.category_id);
        featured.featured = true;
        f.lifecycle.create(&f.ctx, featured).await.unwrap();

        let mut elsewhere = new_content("Featured Elsewhere", other.id);
        elsewhere.featured = true;
        f.lifecycle.create(&f.ctx, elsewhere).await.unwrap();

        f.lifecycle
            .create(&f.ctx, new_content("Plain Here", f.category_id))
            .await
            .unwrap();

        let result = f
            .engine
            .list(
                ContentFilter {
                    category_slug: Some("general".into()),
                    featured: Some(true),
                    ..Default::default()
                },
                SortKey::Newest,
                page(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(result.pagination.total, 1);
        assert_eq!(result.data[0].title, "Featured Here");
    }

    #[tokio::test]
    async fn popular_sort_orders_by_like_count() {
        let f = fixture();
        f.lifecycle
            .create(&f.ctx, new_content("Quiet", f.category_id))
            .await
            .unwrap();
        let loved = f
            .lifecycle
            .create(&f.ctx, new_content("Loved", f.category_id))
            .await
            .unwrap();
        let fan = AuthContext {
            account: f.store.seed_account("fan", "fan@x.com", Role::Reader),
        };
        f.lifecycle.toggle_like(&fan, loved.id).await.unwrap();

        let result = f
            .engine
            .list(ContentFilter::default(), SortKey::Popular, page(1, 10))
            .await
            .unwrap();
        assert_eq!(result.data[0].title, "Loved");
        assert_eq!(result.data[0].like_count, 1);
    }

    #[tokio::test]
    async fn page_size_is_clamped_to_the_maximum() {
        let f = fixture();
        let result = f
            .engine
            .list(ContentFilter::default(), SortKey::Newest, page(1, 9999))
            .await
            .unwrap();
        assert_eq!(result.pagination.page_size, 50);
    }
}
