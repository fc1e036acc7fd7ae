//! Account registration.
//!
//! Creates user documents with a hashed password, an issued token pair, and
//! empty cart, address and order sequences. Hashing and token issuance sit
//! behind [`PasswordHashing`] and [`TokenIssuer`] so neither algorithm leaks
//! into the rest of the service.

mod error;
mod password;
mod tokens;

pub use error::AccountError;
pub use password::{Argon2Hashing, PasswordHashing};
pub use tokens::{IssuedTokens, OpaqueTokenIssuer, TokenClaims, TokenIssuer};

use std::ops::RangeInclusive;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};

use emporium_core::UserId;

use crate::db::{RepositoryError, UserStore};
use crate::models::User;

/// Allowed length of first and last names, in characters.
const NAME_LENGTH: RangeInclusive<usize> = 2..=30;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Signup form.
#[derive(Clone, Deserialize)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub email: String,
    pub phone: String,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"[REDACTED]")
            .field("email", &self.email)
            .field("phone", &self.phone)
            .finish()
    }
}

impl SignupRequest {
    /// Check every field, reporting the first failure.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidInput` describing the offending field.
    pub fn validate(&self) -> Result<(), AccountError> {
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)?;
        validate_password(&self.password)?;
        validate_email(&self.email)?;
        if self.phone.trim().is_empty() {
            return Err(AccountError::InvalidInput("phone is required".to_string()));
        }
        Ok(())
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), AccountError> {
    let len = value.trim().chars().count();
    if !NAME_LENGTH.contains(&len) {
        return Err(AccountError::InvalidInput(format!(
            "{field} must be between {} and {} characters",
            NAME_LENGTH.start(),
            NAME_LENGTH.end()
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AccountError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AccountError> {
    let invalid = || AccountError::InvalidInput(format!("invalid email: {email}"));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let labels_ok = domain.contains('.') && domain.split('.').all(|label| !label.is_empty());
    if !labels_ok {
        return Err(invalid());
    }
    Ok(())
}

/// Account registration service.
pub struct AccountService<'a> {
    users: &'a dyn UserStore,
    hasher: &'a dyn PasswordHashing,
    tokens: &'a dyn TokenIssuer,
}

impl<'a> AccountService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(
        users: &'a dyn UserStore,
        hasher: &'a dyn PasswordHashing,
        tokens: &'a dyn TokenIssuer,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidInput` if validation fails,
    /// `AccountError::Conflict` if the email or phone is already registered,
    /// and `AccountError::Repository` if the store fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: SignupRequest) -> Result<User, AccountError> {
        request.validate()?;

        if self.users.email_exists(&request.email).await? {
            return Err(AccountError::Conflict("email"));
        }
        if self.users.phone_exists(&request.phone).await? {
            return Err(AccountError::Conflict("phone"));
        }

        let password = self.hasher.hash(&request.password)?;
        let id = UserId::generate();
        let now = Utc::now();
        let claims = TokenClaims {
            user_id: id,
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
        };
        let tokens = self.tokens.issue(&claims, now)?;

        let user = User {
            id,
            first_name: request.first_name,
            last_name: request.last_name,
            password,
            email: request.email,
            phone: request.phone,
            token: tokens.token,
            refresh_token: tokens.refresh_token,
            token_expires_at: Some(tokens.expires_at),
            refresh_token_expires_at: Some(tokens.refresh_expires_at),
            created_at: now,
            updated_at: now,
            cart: Vec::new(),
            addresses: Vec::new(),
            orders: Vec::new(),
        };

        // The unique indexes catch a registration racing this one.
        self.users.insert(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AccountError::Conflict("email or phone"),
            other => AccountError::Repository(other),
        })?;

        info!(user_id = %user.id, "User signed up");
        Ok(user)
    }
}
