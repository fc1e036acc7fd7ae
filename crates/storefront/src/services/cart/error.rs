//! Cart error types.

use thiserror::Error;

use emporium_core::IdError;

use crate::db::RepositoryError;
use crate::services::deadline::DeadlineExceeded;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// A required identifier is missing or malformed.
    #[error("invalid {field}: {source}")]
    InvalidInput {
        field: &'static str,
        #[source]
        source: IdError,
    },

    /// Product not found.
    #[error("product not found")]
    ProductNotFound,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// The document store failed or returned an unexpected shape.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),

    /// The operation's deadline elapsed.
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },
}

impl CartError {
    /// Stable machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::ProductNotFound | Self::UserNotFound => "not_found",
            Self::Store(_) => "store_error",
            Self::Timeout { .. } => "timeout",
        }
    }

    /// Map a store error from a call keyed by user ID.
    pub(crate) fn for_user(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::UserNotFound,
            other => Self::Store(other),
        }
    }
}

impl From<DeadlineExceeded> for CartError {
    fn from(e: DeadlineExceeded) -> Self {
        Self::Timeout {
            operation: e.operation,
        }
    }
}
