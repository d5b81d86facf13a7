//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use publishing_core::comments::CommentThread;
use publishing_core::identity::IdentityStore;
use publishing_core::lifecycle::ContentLifecycle;
use publishing_core::query::QueryEngine;
use publishing_core::social::SocialGraph;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all
/// handlers. Each field is one engine component; they all borrow the same
/// store handle, so there is no per-request connection state.
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityStore,
    pub lifecycle: ContentLifecycle,
    pub social: SocialGraph,
    pub comments: CommentThread,
    pub query: QueryEngine,
    pub config: Arc<Config>,
}
