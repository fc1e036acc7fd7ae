//! Document storage for products and users.
//!
//! # Collections
//!
//! - `products` - read-only catalogue documents
//! - `users` - one document per user embedding the cart, order history and
//!   addresses
//!
//! Both live in the `emporium` schema as `(id TEXT, doc JSONB)` rows. Every
//! user mutation is a single `UPDATE` over one row, which is what makes the
//! cart operations atomic per user without cross-document transactions.
//!
//! # Backends
//!
//! - [`PgUserStore`] / [`PgProductStore`] - `PostgreSQL`
//! - [`MemoryUserStore`] / [`MemoryProductStore`] - in-process, for local runs
//!   and tests
//! - [`CachedProductStore`] - TTL cache in front of any product store
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p emporium-cli -- migrate
//! ```

pub mod cache;
pub mod memory;
pub mod pipeline;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use emporium_core::pipeline::{Pipeline, PipelineError};
use emporium_core::{PriceError, ProductId, UserId};

use crate::models::{CartItem, Order, OrderDraft, Product, User};

pub use cache::CachedProductStore;
pub use memory::{MemoryProductStore, MemoryUserStore};
pub use products::PgProductStore;
pub use users::PgUserStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Aggregation pipeline failed or could not be expressed.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// A price or total is out of range; nothing was written.
    #[error("price error: {0}")]
    Price(#[from] PriceError),
}

/// Read access to product documents.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Look up a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
}

/// Read/write access to user documents.
///
/// Cart and order mutations are field-level atomic updates on a single
/// document; implementations must never split them into a read followed by a
/// whole-document write.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Whether any user is registered with `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError>;

    /// Whether any user is registered with `phone`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    async fn phone_exists(&self, phone: &str) -> Result<bool, RepositoryError>;

    /// Insert a new user document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the ID, email or phone is taken.
    async fn insert(&self, user: &User) -> Result<(), RepositoryError>;

    /// Replace a whole user document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    async fn save(&self, user: &User) -> Result<(), RepositoryError>;

    /// Atomically append `item` to the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    async fn append_to_cart(&self, id: UserId, item: &CartItem) -> Result<(), RepositoryError>;

    /// Atomically remove every cart entry for `product`.
    ///
    /// Removing a product that is not in the cart is a successful no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    async fn remove_from_cart(&self, id: UserId, product: ProductId)
    -> Result<(), RepositoryError>;

    /// Atomically turn the cart into an order and empty the cart.
    ///
    /// The order's items are the cart as it is at the moment of the update and
    /// its total is their summed price. Appending the order and clearing the
    /// cart either both happen or neither does.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    async fn checkout_cart(&self, id: UserId, draft: &OrderDraft)
    -> Result<Order, RepositoryError>;

    /// Atomically append `order` to the user's order history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    async fn append_order(&self, id: UserId, order: &Order) -> Result<(), RepositoryError>;

    /// Run an aggregation pipeline over the user documents.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Pipeline` if the pipeline fails or cannot be
    /// expressed by this backend.
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Value>, RepositoryError>;

    /// Check the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store is unavailable.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
