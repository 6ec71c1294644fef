//! Structured error handling for the JSON API.
//!
//! Every failure leaves the service as `{"success": false, "error": "..."}`.
//! Internal details are logged but never exposed to clients.

use std::fmt::Display;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application error type with automatic HTTP response conversion.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Unauthenticated(String),

    /// Outbound message failed; the reason is shown to the caller as is.
    #[error("{0}")]
    Dispatch(String),

    /// Backing service missing from this deployment.
    #[error("{0}")]
    NotConfigured(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal: {0}")]
    Internal(String),
}

/// Result type alias for the application.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a not found error for an entity.
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} not found"))
    }

    /// Create an already-exists error for an entity.
    #[must_use]
    pub fn already_exists(entity: &str) -> Self {
        Self::AlreadyExists(format!("{entity} already exists"))
    }

    /// HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) | Self::AlreadyExists(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Dispatch(_) | Self::Unavailable(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to the caller.
    fn public_message(&self) -> String {
        match self {
            Self::Unavailable(msg) => {
                error!(error = %msg, "Storage unavailable");
                "Service temporarily unavailable".to_string()
            }
            Self::Internal(msg) => {
                error!(error = %msg, "Internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// JSON error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            success: false,
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Extension trait for converting foreign errors with logging.
pub trait ResultExt<T> {
    /// Map the error to `AppError::Internal`, logging the original.
    ///
    /// # Errors
    /// Returns `AppError::Internal` carrying the provided message.
    fn internal(self, msg: &'static str) -> AppResult<T>;
}

impl<T, E: Display> ResultExt<T> for Result<T, E> {
    fn internal(self, msg: &'static str) -> AppResult<T> {
        self.map_err(|e| {
            error!(error = %e, "{msg}");
            AppError::Internal(msg.to_string())
        })
    }
}
