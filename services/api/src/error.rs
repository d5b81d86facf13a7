//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, plus the
//! handler-level failure type that maps engine errors onto the wire.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use publishing_core::EngineError;
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for the `api` service binary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the core engine.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failed schema migration at startup.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The stable wire shape of every failed request.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-checkable kind: `validation`, `unauthorized`, `forbidden`,
    /// `not_found`, `conflict`, or `internal`.
    pub kind: String,
    pub message: String,
}

/// A handler failure: one engine error kind plus a human-readable message,
/// rendered as `{ "kind", "message" }` with the matching status code.
#[derive(Debug)]
pub struct ApiFailure(pub EngineError);

impl From<EngineError> for ApiFailure {
    fn from(err: EngineError) -> Self {
        ApiFailure(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Internal detail stays in the log, not on the wire.
        let message = match &self.0 {
            EngineError::Unexpected(detail) => {
                tracing::error!("internal failure: {}", detail);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            kind: self.0.kind().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
