//! crates/publishing_core/tests/engine.rs
//!
//! End-to-end engine scenarios wiring every component over one shared
//! in-memory store, the way the api service wires them over Postgres.

use std::sync::Arc;

use publishing_core::store_mem::MemoryStore;
use publishing_core::testing::{new_content, registration, FakeHasher, FakeTokens};
use publishing_core::{
    AuthContext, CommentThread, ContentFilter, ContentLifecycle, IdentityStore, NewComment,
    PageRequest, QueryEngine, Role, SlugRegistry, SocialGraph, SortKey,
};

struct Engine {
    identity: IdentityStore,
    lifecycle: ContentLifecycle,
    social: SocialGraph,
    comments: CommentThread,
    query: QueryEngine,
    store: Arc<MemoryStore>,
}

fn engine() -> Engine {
    let store = Arc::new(MemoryStore::new());
    let slugs = SlugRegistry::new(store.clone());
    Engine {
        identity: IdentityStore::new(
            store.clone(),
            Arc::new(FakeHasher),
            Arc::new(FakeTokens::default()),
        ),
        lifecycle: ContentLifecycle::new(store.clone(), slugs),
        social: SocialGraph::new(store.clone()),
        comments: CommentThread::new(store.clone()),
        query: QueryEngine::new(store.clone(), 10, 50),
        store,
    }
}

#[tokio::test]
async fn authored_content_flows_through_search() {
    let e = engine();
    let (_, token) = e.identity.register(registration("alice", "a@x.com")).await.unwrap();
    let ctx = e.identity.verify_token(&token).await.unwrap();
    let category = e.store.seed_category("Programming");

    for i in 0..7 {
        e.lifecycle
            .create(&ctx, new_content(&format!("React Patterns {}", i), category.id))
            .await
            .unwrap();
    }
    for i in 0..3 {
        e.lifecycle
            .create(&ctx, new_content(&format!("Gardening {}", i), category.id))
            .await
            .unwrap();
    }

    // Unauthenticated search, second page of five.
    let page = e
        .query
        .list(
            ContentFilter {
                search: Some("react".into()),
                ..Default::default()
            },
            SortKey::Newest,
            PageRequest {
                page: 2,
                page_size: 5,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 7);
    assert_eq!(page.pagination.total_pages, 2);
    assert_eq!(page.data.len(), 2);
    assert!(page.data.iter().all(|c| c.title.contains("React")));
}

#[tokio::test]
async fn social_interactions_stay_consistent_across_components() {
    let e = engine();
    let (alice, alice_token) = e.identity.register(registration("alice", "a@x.com")).await.unwrap();
    let (bob, bob_token) = e.identity.register(registration("bob", "b@x.com")).await.unwrap();
    let alice_ctx = e.identity.verify_token(&alice_token).await.unwrap();
    let bob_ctx = e.identity.verify_token(&bob_token).await.unwrap();

    let category = e.store.seed_category("General");
    let content = e
        .lifecycle
        .create(&alice_ctx, new_content("Worth Following", category.id))
        .await
        .unwrap();

    // Bob follows Alice; both sides agree.
    let follow = e.social.toggle_follow(&bob_ctx, alice.id).await.unwrap();
    assert!(follow.is_following);
    assert_eq!(follow.follower_count, 1);
    let (_, alice_stats) = e.identity.profile(alice.id, Some(bob.id)).await.unwrap();
    assert!(alice_stats.is_following);
    assert_eq!(alice_stats.follower_count, 1);

    // Bob bookmarks and likes, then comments; Alice replies.
    e.lifecycle.toggle_bookmark(&bob_ctx, content.id).await.unwrap();
    let like = e.lifecycle.toggle_like(&bob_ctx, content.id).await.unwrap();
    assert_eq!(like.like_count, 1);

    let comment = e
        .comments
        .add(
            &bob_ctx,
            NewComment {
                content_id: content.id,
                body: "Great piece".into(),
                parent_id: None,
            },
        )
        .await
        .unwrap();
    e.comments
        .add(
            &alice_ctx,
            NewComment {
                content_id: content.id,
                body: "Thanks!".into(),
                parent_id: Some(comment.id),
            },
        )
        .await
        .unwrap();

    let top = e.comments.top_level(content.id).await.unwrap();
    assert_eq!(top.len(), 1);
    let replies = e.comments.replies(comment.id).await.unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].author.handle, "alice");

    // Soft delete hides the content from fetch and search, edges remain.
    e.lifecycle.soft_delete(&alice_ctx, content.id).await.unwrap();
    assert!(e.lifecycle.fetch_by_slug_or_id("worth-following").await.is_err());
    let page = e
        .query
        .list(
            ContentFilter::default(),
            SortKey::Newest,
            PageRequest {
                page: 1,
                page_size: 10,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 0);
    assert!(e.lifecycle.bookmarks(&bob_ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn deactivated_accounts_cannot_use_live_tokens() {
    let e = engine();
    let (account, token) = e.identity.register(registration("alice", "a@x.com")).await.unwrap();
    e.store.deactivate_account(account.id);

    let err = e.identity.verify_token(&token).await.unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
}

#[tokio::test]
async fn admins_create_categories_readers_cannot() {
    let e = engine();
    let reader = AuthContext {
        account: e.store.seed_account("reader", "r@x.com", Role::Reader),
    };
    let admin = AuthContext {
        account: e.store.seed_account("root", "root@x.com", Role::Admin),
    };

    assert!(e
        .lifecycle
        .create_category(&reader, "Nope".into(), None, None)
        .await
        .is_err());

    let category = e
        .lifecycle
        .create_category(&admin, "Deep Dives".into(), Some("long reads".into()), None)
        .await
        .unwrap();
    assert_eq!(category.slug, "deep-dives");
}
