//! Password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AccountError;

/// Turns plain passwords into stored hashes and checks them later.
pub trait PasswordHashing: Send + Sync {
    /// Hash `password` for storage.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::PasswordHash` if hashing fails.
    fn hash(&self, password: &str) -> Result<String, AccountError>;

    /// Whether `password` matches the stored `hash`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::PasswordHash` if `hash` is not a valid hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AccountError>;
}

/// Argon2id with the crate's default parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hashing;

impl PasswordHashing for Argon2Hashing {
    fn hash(&self, password: &str) -> Result<String, AccountError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AccountError::PasswordHash)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AccountError> {
        let parsed = PasswordHash::new(hash).map_err(|_| AccountError::PasswordHash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
