//! crates/publishing_core/src/social.rs
//!
//! Owns the symmetric follow relationship. Both directions of an edge are
//! views of the same stored row, and all counts are derived from the edge set
//! at read time, so neither side can drift.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{AuthContext, FollowOutcome, FollowStats};
use crate::ports::{ContentStore, EngineError, EngineResult};

/// Owns follow edges between accounts.
#[derive(Clone)]
pub struct SocialGraph {
    store: Arc<dyn ContentStore>,
}

impl SocialGraph {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Flips the caller's follow edge to `target` and returns the resulting
    /// membership plus both derived counts for the target. Self-follow is a
    /// caller error.
    pub async fn toggle_follow(
        &self,
        ctx: &AuthContext,
        target: Uuid,
    ) -> EngineResult<FollowOutcome> {
        if ctx.account_id() == target {
            return Err(EngineError::Validation("you cannot follow yourself".into()));
        }
        // Ensure the target exists before touching the edge.
        self.store.account_by_id(target).await?;

        let is_following = self.store.toggle_follow(ctx.account_id(), target).await?;
        let stats = self
            .store
            .follow_stats(target, Some(ctx.account_id()))
            .await?;
        Ok(FollowOutcome {
            is_following,
            follower_count: stats.follower_count,
            following_count: stats.following_count,
        })
    }

    /// Derived counts for one account, with membership for `viewer`.
    pub async fn stats(
        &self,
        account_id: Uuid,
        viewer: Option<Uuid>,
    ) -> EngineResult<FollowStats> {
        self.store.follow_stats(account_id, viewer).await
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::store_mem::MemoryStore;

    fn fixture() -> (SocialGraph, AuthContext, AuthContext, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let graph = SocialGraph::new(store.clone());
        let alice = AuthContext {
            account: store.seed_account("alice", "alice@x.com", Role::Reader),
        };
        let bob = AuthContext {
            account: store.seed_account("bob", "bob@x.com", Role::Reader),
        };
        (graph, alice, bob, store)
    }

    #[tokio::test]
    async fn follow_is_bidirectionally_consistent() {
        let (graph, alice, bob, store) = fixture();

        let outcome = graph.toggle_follow(&alice, bob.account_id()).await.unwrap();
        assert!(outcome.is_following);
        assert_eq!(outcome.follower_count, 1);

        // B in A.following <=> A in B.followers.
        let bob_stats = store
            .follow_stats(bob.account_id(), Some(alice.account_id()))
            .await
            .unwrap();
        assert!(bob_stats.is_following);
        assert_eq!(bob_stats.follower_count, 1);

        let alice_stats = store.follow_stats(alice.account_id(), None).await.unwrap();
        assert_eq!(alice_stats.following_count, 1);
        assert_eq!(alice_stats.follower_count, 0);
    }

    #[tokio::test]
    async fn toggle_pair_unfollows() {
        let (graph, alice, bob, _store) = fixture();

        graph.toggle_follow(&alice, bob.account_id()).await.unwrap();
        let outcome = graph.toggle_follow(&alice, bob.account_id()).await.unwrap();

        assert!(!outcome.is_following);
        assert_eq!(outcome.follower_count, 0);
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let (graph, alice, _bob, _store) = fixture();

        let err = graph
            .toggle_follow(&alice, alice.account_id())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn following_a_missing_account_is_not_found() {
        let (graph, alice, _bob, _store) = fixture();

        let err = graph.toggle_follow(&alice, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}
