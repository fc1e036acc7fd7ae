//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response has the same body:
//!
//! ```json
//! {"error": {"kind": "not_found", "message": "product not found"}}
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AccountError, CartError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Signup failed.
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// Database operation failed outside a service.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// A required query parameter is absent or blank.
    #[error("missing parameter: {name}")]
    MissingParameter { name: &'static str, status: StatusCode },

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    kind: &'a str,
    message: String,
}

impl AppError {
    /// Stable machine-readable kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cart(err) => err.kind(),
            Self::Account(err) => err.kind(),
            Self::Database(_) => "store_error",
            Self::MissingParameter { status, .. } if *status == StatusCode::NOT_FOUND => {
                "not_found"
            }
            Self::MissingParameter { .. } | Self::BadRequest(_) => "invalid_input",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        if let Self::MissingParameter { status, .. } = self {
            return *status;
        }
        match self.kind() {
            "invalid_input" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            if matches!(self, Self::Cart(CartError::Timeout { .. })) {
                tracing::warn!(error = %self, "Request deadline exceeded");
            } else {
                let event_id = sentry::capture_error(&self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Request error"
                );
            }
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Cart(CartError::Timeout { operation }) => format!("{operation} timed out"),
            _ if status.is_server_error() => "Internal server error".to_string(),
            Self::Cart(err) => err.to_string(),
            Self::Account(err) => err.to_string(),
            Self::MissingParameter { name, .. } => format!("{name} is required"),
            Self::BadRequest(msg) => msg.clone(),
            Self::Database(_) => "Internal server error".to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
