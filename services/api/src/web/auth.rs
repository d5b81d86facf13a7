//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: registration, login, and the caller's own
//! profile. Sessions are stateless bearer tokens issued at registration and
//! login; there is no logout endpoint because revocation happens through
//! expiry or account deactivation.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use publishing_core::domain::AuthContext;
use publishing_core::identity::{ProfilePatch, Registration};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiFailure;
use crate::web::state::AppState;
use crate::web::types::{AccountResponse, ContentResponse};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub handle: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(serde::Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub account: AccountResponse,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created successfully", body = SessionResponse),
        (status = 400, description = "Invalid registration input"),
        (status = 409, description = "Handle or email already taken")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let (account, token) = state
        .identity
        .register(Registration {
            handle: req.handle,
            email: req.email,
            secret: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            account: account.into(),
        }),
    ))
}

/// POST /auth/login - Authenticate with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let (account, token) = state.identity.authenticate(&req.email, &req.password).await?;

    Ok(Json(SessionResponse {
        token,
        account: account.into(),
    }))
}

/// GET /auth/me - The calling account's own profile
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "The caller's account", body = AccountResponse),
        (status = 401, description = "Missing or invalid session token")
    ),
    security(("bearer_token" = []))
)]
pub async fn me_handler(
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiFailure> {
    Ok(Json(AccountResponse::from(ctx.account)))
}

/// PUT /auth/me - Update the calling account's profile
#[utoipa::path(
    put,
    path = "/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountResponse),
        (status = 401, description = "Missing or invalid session token")
    ),
    security(("bearer_token" = []))
)]
pub async fn update_me_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let account = state
        .identity
        .update_profile(
            &ctx,
            ProfilePatch {
                first_name: req.first_name,
                last_name: req.last_name,
                bio: req.bio,
                avatar_url: req.avatar_url,
            },
        )
        .await?;

    Ok(Json(AccountResponse::from(account)))
}

/// GET /auth/me/bookmarks - Everything the caller has bookmarked
#[utoipa::path(
    get,
    path = "/auth/me/bookmarks",
    responses(
        (status = 200, description = "Bookmarked content, newest bookmark first", body = [ContentResponse]),
        (status = 401, description = "Missing or invalid session token")
    ),
    security(("bearer_token" = []))
)]
pub async fn my_bookmarks_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiFailure> {
    let rows = state.lifecycle.bookmarks(&ctx).await?;
    let details = state.lifecycle.details(rows).await?;
    let payload: Vec<ContentResponse> = details.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}
