//! Account error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur while registering an account.
#[derive(Debug, Error)]
pub enum AccountError {
    /// A signup field failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The email or phone number is already registered.
    #[error("{0} is already registered")]
    Conflict(&'static str),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token generation error.
    #[error("token issuance error")]
    TokenIssue,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AccountError {
    /// Stable machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Conflict(_) => "conflict",
            Self::PasswordHash | Self::TokenIssue | Self::Repository(_) => "store_error",
        }
    }
}
