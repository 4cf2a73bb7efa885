// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use model_monitor_core::InvalidDimension;
use model_monitor_db::DbError;

/// Structured JSON error response for API errors.
///
/// `details` is operator diagnostics only — clients must not build on its
/// content.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes.
///
/// Both rejection variants fire before any store access; a store failure is
/// always the generic `Database` case — no retries, no partial results.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    InvalidDimension(#[from] InvalidDimension),

    #[error("database error: {0}")]
    Database(#[from] DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::MissingParameter(name) => {
                tracing::warn!(parameter = name, "Missing required parameter");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details(
                        "Missing required parameter",
                        format!("{name} is required"),
                    ),
                )
            }
            ApiError::InvalidDimension(err) => {
                tracing::warn!(dataset = err.dataset, field = %err.field, "Rejected groupBy field");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Invalid groupBy field", err.to_string()),
                )
            }
            ApiError::Database(db_err) => {
                tracing::error!(error = %db_err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Database error", db_err.to_string()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
