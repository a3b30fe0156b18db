//! Error types for the lead intake API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use pipeline::IntakeError;
use thiserror::Error;

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The intake pipeline rejected the submission.
    #[error(transparent)]
    Intake(#[from] IntakeError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Intake(IntakeError::RateLimitExceeded { .. }) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::Intake(IntakeError::PhoneNotVerified { .. })
            | ApiError::Intake(IntakeError::PhoneVerificationProvider(_))
            | ApiError::Intake(IntakeError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Intake(IntakeError::Database(DatabaseError::NotFound { .. }))
            | ApiError::Database(DatabaseError::NotFound { .. }) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", message);
        }

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
