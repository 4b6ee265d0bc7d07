/// Unified error types for the estate media service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the media service
#[derive(Error, Debug)]
pub enum MediaError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation errors (missing/malformed required fields)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Extension or declared MIME type outside the allow-list
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Payload exceeds the configured per-file ceiling
    #[error("Payload too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Record or underlying object absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying store unreachable
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Malformed multipart request body
    #[error("Multipart error: {0}")]
    Multipart(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Classify a sqlx error from the backing store: connectivity
    /// failures surface as `BackendUnavailable`, everything else stays
    /// a database error.
    pub fn from_store(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Tls(_) => MediaError::BackendUnavailable(err.to_string()),
            other => MediaError::Database(other),
        }
    }
}

/// JSON error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert MediaError to HTTP response
impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            MediaError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            MediaError::Multipart(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            MediaError::UnsupportedMediaType(_) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UnsupportedMediaType",
                self.to_string(),
            ),
            MediaError::PayloadTooLarge { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PayloadTooLarge",
                self.to_string(),
            ),
            MediaError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            MediaError::BackendUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "BackendUnavailable",
                "Storage backend unavailable".to_string(),
            ),
            MediaError::Database(_) | MediaError::Internal(_) | MediaError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for media service operations
pub type MediaResult<T> = Result<T, MediaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_too_large_message_carries_limit() {
        let err = MediaError::PayloadTooLarge { limit: 4_194_304 };
        assert!(err.to_string().contains("4194304"));
    }

    #[test]
    fn test_pool_errors_classify_as_backend_unavailable() {
        let err = MediaError::from_store(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, MediaError::BackendUnavailable(_)));

        let err = MediaError::from_store(sqlx::Error::RowNotFound);
        assert!(matches!(err, MediaError::Database(_)));
    }
}
