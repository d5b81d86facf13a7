//! services/api/src/web/accounts.rs
//!
//! Public account profiles and the follow toggle.

use axum::{
    extract::{Extension, Path, State},
    response::IntoResponse,
    Json,
};
use publishing_core::domain::AuthContext;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiFailure;
use crate::web::state::AppState;
use crate::web::types::{AccountResponse, FollowResponse};

//=========================================================================================
// Response Types
//=========================================================================================

/// A public profile: the account plus its derived follow counts. The
/// `is_following` flag describes the caller; it is always false for
/// anonymous requests.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
    pub follower_count: i64,
    pub following_count: i64,
    pub is_following: bool,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /accounts/{id} - A public account profile
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    params(("id" = Uuid, Path, description = "Account id")),
    responses(
        (status = 200, description = "The profile", body = ProfileResponse),
        (status = 404, description = "No such account")
    )
)]
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    let (account, stats) = state.identity.profile(id, None).await?;
    Ok(Json(ProfileResponse {
        account: account.into(),
        follower_count: stats.follower_count,
        following_count: stats.following_count,
        is_following: stats.is_following,
    }))
}

/// POST /accounts/{id}/follow - Toggle the caller's follow on an account
#[utoipa::path(
    post,
    path = "/accounts/{id}/follow",
    params(("id" = Uuid, Path, description = "Account id to follow or unfollow")),
    responses(
        (status = 200, description = "Post-toggle follow state", body = FollowResponse),
        (status = 400, description = "Cannot follow yourself"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_token" = []))
)]
pub async fn follow_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    let outcome = state.social.toggle_follow(&ctx, id).await?;
    Ok(Json(FollowResponse {
        is_following: outcome.is_following,
        follower_count: outcome.follower_count,
        following_count: outcome.following_count,
    }))
}
