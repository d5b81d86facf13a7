//! services/api/src/web/comments.rs
//!
//! Threaded comment endpoints: posting, editing, removal, likes, and the
//! two listing shapes (top-level newest first, replies oldest first).

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use publishing_core::comments::NewComment;
use publishing_core::domain::AuthContext;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiFailure;
use crate::web::state::AppState;
use crate::web::types::{CommentResponse, LikeResponse, OwnCommentResponse};

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content_id: Uuid,
    pub body: String,
    /// When set, posts a reply; the parent must belong to the same content.
    pub parent_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateCommentRequest {
    pub body: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /comments - Post a comment or a reply
#[utoipa::path(
    post,
    path = "/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment posted", body = OwnCommentResponse),
        (status = 400, description = "Invalid body or mismatched parent"),
        (status = 404, description = "No such content")
    ),
    security(("bearer_token" = []))
)]
pub async fn create_comment_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let comment = state
        .comments
        .add(
            &ctx,
            NewComment {
                content_id: req.content_id,
                body: req.body,
                parent_id: req.parent_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(OwnCommentResponse::from(comment))))
}

/// PUT /comments/{id} - Edit a comment (author only)
#[utoipa::path(
    put,
    path = "/comments/{id}",
    params(("id" = Uuid, Path, description = "Comment id")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Edited comment", body = OwnCommentResponse),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "No such comment")
    ),
    security(("bearer_token" = []))
)]
pub async fn update_comment_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let comment = state.comments.edit(&ctx, id, req.body).await?;
    Ok(Json(OwnCommentResponse::from(comment)))
}

/// DELETE /comments/{id} - Remove a comment (author only)
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(("id" = Uuid, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Comment removed"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "No such comment")
    ),
    security(("bearer_token" = []))
)]
pub async fn delete_comment_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    state.comments.remove(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /comments/{id}/like - Toggle the caller's like on a comment
#[utoipa::path(
    post,
    path = "/comments/{id}/like",
    params(("id" = Uuid, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Post-toggle like state", body = LikeResponse),
        (status = 404, description = "No such comment")
    ),
    security(("bearer_token" = []))
)]
pub async fn like_comment_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    let outcome = state.comments.toggle_like(&ctx, id).await?;
    Ok(Json(LikeResponse {
        like_count: outcome.like_count,
        is_liked: outcome.is_liked,
    }))
}

/// GET /comments/content/{id} - Top-level comments for content, newest first
#[utoipa::path(
    get,
    path = "/comments/content/{id}",
    params(("id" = Uuid, Path, description = "Content id")),
    responses(
        (status = 200, description = "Top-level comments with authors", body = [CommentResponse]),
        (status = 404, description = "No such content")
    )
)]
pub async fn list_comments_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    let comments = state.comments.top_level(id).await?;
    let payload: Vec<CommentResponse> = comments.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}

/// GET /comments/{id}/replies - Replies to one comment, oldest first
#[utoipa::path(
    get,
    path = "/comments/{id}/replies",
    params(("id" = Uuid, Path, description = "Parent comment id")),
    responses(
        (status = 200, description = "Replies with authors", body = [CommentResponse]),
        (status = 404, description = "No such comment")
    )
)]
pub async fn list_replies_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    let replies = state.comments.replies(id).await?;
    let payload: Vec<CommentResponse> = replies.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}
