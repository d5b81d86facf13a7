pub mod comments;
pub mod domain;
pub mod identity;
pub mod lifecycle;
pub mod ports;
pub mod query;
pub mod slug;
pub mod social;
pub mod store_mem;
pub mod testing;

pub use comments::{CommentThread, NewComment};
pub use domain::{
    Account, AccountCredentials, AuthContext, BookmarkOutcome, Category, Comment, CommentDetail,
    Content, ContentDetail, ContentStatus, FollowOutcome, FollowStats, LikeOutcome, Role,
};
pub use identity::{IdentityStore, ProfilePatch, Registration};
pub use lifecycle::{ContentLifecycle, ContentPatch, NewContent};
pub use ports::{
    ContentStore, EngineError, EngineResult, NewAccount, NewCategory, SecretHasher, TokenCodec,
};
pub use query::{ContentFilter, ContentQuery, Page, PageRequest, Pagination, QueryEngine, SortKey};
pub use slug::SlugRegistry;
pub use social::SocialGraph;
