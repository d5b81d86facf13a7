//! services/api/src/web/content.rs
//!
//! Content endpoints: authoring, filtered listing, single fetch, likes,
//! bookmarks, and categories.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use publishing_core::domain::{AuthContext, ContentStatus};
use publishing_core::lifecycle::{ContentPatch, NewContent};
use publishing_core::ports::EngineError;
use publishing_core::query::{ContentFilter, PageRequest, SortKey};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiFailure;
use crate::web::state::AppState;
use crate::web::types::{
    BookmarkResponse, CategoryResponse, ContentPageResponse, ContentResponse, LikeResponse,
};

//=========================================================================================
// Request/Query Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentRequest {
    pub title: String,
    pub body: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category_id: Uuid,
    #[serde(default)]
    pub tags: Vec<String>,
    /// `draft` or `published`; omitted means draft.
    pub status: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
    pub status: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListContentParams {
    /// 1-based page number; out-of-range values are clamped.
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    /// Category slug to filter by.
    pub category: Option<String>,
    /// Case-insensitive substring match over title, body, and tags.
    pub search: Option<String>,
    /// `newest` (default), `oldest`, `popular`, or `views`.
    pub sort: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

fn parse_status(s: &str) -> Result<ContentStatus, ApiFailure> {
    ContentStatus::parse(s).ok_or_else(|| {
        ApiFailure(EngineError::Validation(format!(
            "unknown status '{}', expected 'draft' or 'published'",
            s
        )))
    })
}

//=========================================================================================
// Content Handlers
//=========================================================================================

/// POST /content - Author new content
#[utoipa::path(
    post,
    path = "/content",
    request_body = CreateContentRequest,
    responses(
        (status = 201, description = "Content created", body = ContentResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid session token")
    ),
    security(("bearer_token" = []))
)]
pub async fn create_content_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateContentRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let status = req.status.as_deref().map(parse_status).transpose()?;
    let content = state
        .lifecycle
        .create(
            &ctx,
            NewContent {
                title: req.title,
                body: req.body,
                excerpt: req.excerpt,
                cover_image: req.cover_image,
                category_id: req.category_id,
                tags: req.tags,
                status,
                featured: req.featured,
            },
        )
        .await?;
    let detail = state.lifecycle.detail(content).await?;
    Ok((StatusCode::CREATED, Json(ContentResponse::from(detail))))
}

/// GET /content - Filtered, sorted, paginated listing of published content
#[utoipa::path(
    get,
    path = "/content",
    params(ListContentParams),
    responses(
        (status = 200, description = "One page of matching content", body = ContentPageResponse),
        (status = 400, description = "Invalid query parameter")
    )
)]
pub async fn list_content_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListContentParams>,
) -> Result<impl IntoResponse, ApiFailure> {
    let sort = match params.sort.as_deref() {
        None => SortKey::Newest,
        Some(s) => SortKey::parse(s).ok_or_else(|| {
            ApiFailure(EngineError::Validation(format!(
                "unknown sort key '{}'",
                s
            )))
        })?,
    };

    let page = state
        .query
        .list(
            ContentFilter {
                category_slug: params.category,
                search: params.search,
                featured: params.featured,
            },
            sort,
            PageRequest {
                page: params.page.unwrap_or(1),
                page_size: params
                    .page_size
                    .unwrap_or_else(|| state.query.default_page_size()),
            },
        )
        .await?;

    let pagination = page.pagination;
    let details = state.lifecycle.details(page.data).await?;
    Ok(Json(ContentPageResponse {
        data: details.into_iter().map(Into::into).collect(),
        pagination: pagination.into(),
    }))
}

/// GET /content/{key} - Fetch one content row by id or slug
///
/// Every successful fetch counts one view.
#[utoipa::path(
    get,
    path = "/content/{key}",
    params(("key" = String, Path, description = "Content id (UUID) or slug")),
    responses(
        (status = 200, description = "The content", body = ContentResponse),
        (status = 404, description = "No such content")
    )
)]
pub async fn get_content_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiFailure> {
    let content = state.lifecycle.fetch_by_slug_or_id(&key).await?;
    let detail = state.lifecycle.detail(content).await?;
    Ok(Json(ContentResponse::from(detail)))
}

/// PUT /content/{id} - Update content (author or admin only)
#[utoipa::path(
    put,
    path = "/content/{id}",
    params(("id" = Uuid, Path, description = "Content id")),
    request_body = UpdateContentRequest,
    responses(
        (status = 200, description = "Updated content", body = ContentResponse),
        (status = 403, description = "Caller is neither the author nor an admin"),
        (status = 404, description = "No such content")
    ),
    security(("bearer_token" = []))
)]
pub async fn update_content_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateContentRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let status = req.status.as_deref().map(parse_status).transpose()?;
    let content = state
        .lifecycle
        .update(
            &ctx,
            id,
            ContentPatch {
                title: req.title,
                body: req.body,
                excerpt: req.excerpt,
                cover_image: req.cover_image,
                category_id: req.category_id,
                tags: req.tags,
                status,
                featured: req.featured,
            },
        )
        .await?;
    let detail = state.lifecycle.detail(content).await?;
    Ok(Json(ContentResponse::from(detail)))
}

/// DELETE /content/{id} - Soft-delete content (author or admin only)
#[utoipa::path(
    delete,
    path = "/content/{id}",
    params(("id" = Uuid, Path, description = "Content id")),
    responses(
        (status = 204, description = "Content removed from all public surfaces"),
        (status = 403, description = "Caller is neither the author nor an admin"),
        (status = 404, description = "No such content")
    ),
    security(("bearer_token" = []))
)]
pub async fn delete_content_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    state.lifecycle.soft_delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /content/{id}/like - Toggle the caller's like on content
#[utoipa::path(
    post,
    path = "/content/{id}/like",
    params(("id" = Uuid, Path, description = "Content id")),
    responses(
        (status = 200, description = "Post-toggle like state", body = LikeResponse),
        (status = 404, description = "No such content")
    ),
    security(("bearer_token" = []))
)]
pub async fn like_content_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    let outcome = state.lifecycle.toggle_like(&ctx, id).await?;
    Ok(Json(LikeResponse {
        like_count: outcome.like_count,
        is_liked: outcome.is_liked,
    }))
}

/// POST /content/{id}/bookmark - Toggle the caller's bookmark on content
#[utoipa::path(
    post,
    path = "/content/{id}/bookmark",
    params(("id" = Uuid, Path, description = "Content id")),
    responses(
        (status = 200, description = "Post-toggle bookmark state", body = BookmarkResponse),
        (status = 404, description = "No such content")
    ),
    security(("bearer_token" = []))
)]
pub async fn bookmark_content_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    let outcome = state.lifecycle.toggle_bookmark(&ctx, id).await?;
    Ok(Json(BookmarkResponse {
        bookmark_count: outcome.bookmark_count,
        is_bookmarked: outcome.is_bookmarked,
    }))
}

//=========================================================================================
// Category Handlers
//=========================================================================================

/// GET /categories - All categories
#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "All categories", body = [CategoryResponse])
    )
)]
pub async fn list_categories_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiFailure> {
    let categories = state.lifecycle.categories().await?;
    let payload: Vec<CategoryResponse> = categories.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}

/// POST /categories - Create a category (admin only)
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Category already exists")
    ),
    security(("bearer_token" = []))
)]
pub async fn create_category_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let category = state
        .lifecycle
        .create_category(&ctx, req.name, req.description, req.color)
        .await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}
