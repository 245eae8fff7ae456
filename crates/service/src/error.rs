//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All HTTP route handlers should
//! return `Result<T, AppError>` (the submit route wraps it into its
//! `{ok, error}` envelope).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;

/// Application-level error type for the service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Malformed or missing input from the client.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Shared secret mismatch on the peer channel.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            // Store conflicts only surface here as allocator exhaustion,
            // which is an internal fault, not a client error.
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message safe to expose to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether this error should be captured to Sentry.
    const fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("user 42".to_string());
        assert_eq!(err.to_string(), "Not found: user 42");

        let err = AppError::InvalidInput("uid must be numeric".to_string());
        assert_eq!(err.to_string(), "Invalid input: uid must be numeric");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::InvalidInput("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("x".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("x".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("x".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Database(RepositoryError::NotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "secret table broke".to_string(),
        ));
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::InvalidInput("address is empty".to_string());
        assert!(err.public_message().contains("address is empty"));
    }
}
