//! Application state shared across handlers.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::catalogue::{self, CatalogueError};
use crate::config::{StoreBackend, StorefrontConfig};
use crate::db::{
    self, CachedProductStore, MemoryProductStore, MemoryUserStore, PgProductStore, PgUserStore,
    ProductStore, RepositoryError, UserStore,
};
use crate::services::accounts::{Argon2Hashing, OpaqueTokenIssuer, PasswordHashing, TokenIssuer};
use crate::services::{AccountService, CartAggregator, CartService};

/// Errors building the stores at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),

    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and hands out request-scoped
/// services over the configured stores.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    products: Arc<dyn ProductStore>,
    users: Arc<dyn UserStore>,
    hasher: Box<dyn PasswordHashing>,
    tokens: Box<dyn TokenIssuer>,
}

impl AppState {
    /// Create a new application state over explicit stores, with Argon2
    /// password hashing and opaque session tokens.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        products: Arc<dyn ProductStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                products,
                users,
                hasher: Box::new(Argon2Hashing),
                tokens: Box::new(OpaqueTokenIssuer),
            }),
        }
    }

    /// Build the stores selected by `config.store`.
    ///
    /// `PostgreSQL` product lookups are wrapped in the product cache. The
    /// memory product store is filled from the configured seed file, if any.
    ///
    /// # Errors
    ///
    /// Returns `StartupError` if the database pool cannot be created or the
    /// seed catalogue cannot be loaded.
    pub async fn connect(config: StorefrontConfig) -> Result<Self, StartupError> {
        let (products, users): (Arc<dyn ProductStore>, Arc<dyn UserStore>) = match &config.store
        {
            StoreBackend::Postgres { database_url } => {
                let pool = db::create_pool(database_url).await?;
                tracing::info!("Database pool created");
                let products = CachedProductStore::new(
                    PgProductStore::new(pool.clone()),
                    config.product_cache.capacity,
                    config.product_cache.ttl,
                );
                (Arc::new(products), Arc::new(PgUserStore::new(pool)))
            }
            StoreBackend::Memory { seed_file } => {
                tracing::warn!("Using in-memory document store; data is lost on restart");
                let products = MemoryProductStore::new();
                match seed_file {
                    Some(path) => seed_memory(&products, path).await?,
                    None => tracing::warn!(
                        "EMPORIUM_SEED_FILE not set; the memory catalogue is empty"
                    ),
                }
                (Arc::new(products), Arc::new(MemoryUserStore::new()))
            }
        };
        Ok(Self::new(config, products, users))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the user store.
    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.inner.users.as_ref()
    }

    /// Cart operations for one request.
    #[must_use]
    pub fn cart_service(&self) -> CartService<'_> {
        CartService::new(
            self.inner.products.as_ref(),
            self.inner.users.as_ref(),
            self.inner.config.timeouts,
        )
    }

    /// Cart totals for one request.
    #[must_use]
    pub fn aggregator(&self) -> CartAggregator<'_> {
        CartAggregator::new(self.inner.users.as_ref(), self.inner.config.timeouts)
    }

    /// Signup for one request.
    #[must_use]
    pub fn accounts(&self) -> AccountService<'_> {
        AccountService::new(
            self.inner.users.as_ref(),
            self.inner.hasher.as_ref(),
            self.inner.tokens.as_ref(),
        )
    }
}

async fn seed_memory(products: &MemoryProductStore, path: &Path) -> Result<(), StartupError> {
    let catalogue = catalogue::load(path).await?;
    let count = catalogue.len();
    for product in catalogue {
        products.insert(product).await?;
    }
    tracing::info!(path = %path.display(), count, "Loaded memory catalogue");
    Ok(())
}
