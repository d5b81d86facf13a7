//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use publishing_core::EngineError;
use std::sync::Arc;

use crate::error::ApiFailure;
use crate::web::state::AppState;

/// Middleware that validates the bearer session token and resolves the
/// calling account.
///
/// If valid, inserts the `AuthContext` into request extensions for handlers
/// to use. If invalid, missing, expired, or the account has been deactivated,
/// returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiFailure> {
    // 1. Extract the Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiFailure(EngineError::Unauthorized(
                "missing Authorization header".to_string(),
            ))
        })?;

    // 2. Parse the bearer token
    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiFailure(EngineError::Unauthorized(
            "Authorization header must use the Bearer scheme".to_string(),
        ))
    })?;

    // 3. Verify the token and load the account behind it
    let ctx = state.identity.verify_token(token).await?;

    // 4. Insert the auth context into request extensions
    req.extensions_mut().insert(ctx);

    // 5. Continue to the handler
    Ok(next.run(req).await)
}
