//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Store
//! - `EMPORIUM_STORE` - `postgres` (default) or `memory`
//! - `EMPORIUM_DATABASE_URL` - `PostgreSQL` connection string, required for
//!   `postgres` (falls back to `DATABASE_URL`)
//! - `EMPORIUM_SEED_FILE` - YAML product catalogue loaded into the `memory`
//!   store at startup; without it the memory catalogue starts empty
//!
//! ## Optional
//! - `EMPORIUM_HOST` - Bind address (default: 127.0.0.1)
//! - `EMPORIUM_PORT` - Listen port (default: 8000)
//! - `EMPORIUM_MUTATION_TIMEOUT_SECS` - Budget for cart mutations (default: 5)
//! - `EMPORIUM_CHECKOUT_TIMEOUT_SECS` - Budget for checkout and cart totals (default: 100)
//! - `EMPORIUM_PRODUCT_CACHE_TTL_SECS` - Product cache TTL (default: 300)
//! - `EMPORIUM_PRODUCT_CACHE_CAPACITY` - Product cache size (default: 1000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)
//!
//! Durations are whole seconds between 1 and 86400.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::services::deadline::{
    DEFAULT_CHECKOUT_TIMEOUT, DEFAULT_MUTATION_TIMEOUT, MAX_BUDGET, Timeouts,
};

/// Longest accepted duration setting (one day).
const MAX_DURATION_SECS: u64 = MAX_BUDGET.as_secs();

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which document store backs the service.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// `PostgreSQL` JSONB documents.
    Postgres {
        /// Connection URL (contains password)
        database_url: SecretString,
    },
    /// In-process maps; data is lost on restart.
    Memory {
        /// Catalogue loaded at startup.
        seed_file: Option<PathBuf>,
    },
}

/// Product cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductCacheConfig {
    pub ttl: Duration,
    pub capacity: u64,
}

impl Default for ProductCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            capacity: 1000,
        }
    }
}

/// Sentry settings.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Document store backend
    pub store: StoreBackend,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deadlines for store calls
    pub timeouts: Timeouts,
    /// Product lookup cache
    pub product_cache: ProductCacheConfig,
    /// Error tracking
    pub sentry: SentryConfig,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let store = match env.or_default("EMPORIUM_STORE", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: env.database_url("EMPORIUM_DATABASE_URL")?,
            },
            "memory" => StoreBackend::Memory {
                seed_file: env.optional("EMPORIUM_SEED_FILE").map(PathBuf::from),
            },
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "EMPORIUM_STORE".to_string(),
                    format!("expected `postgres` or `memory`, got `{other}`"),
                ));
            }
        };
        let host: IpAddr = env.parsed("EMPORIUM_HOST", "127.0.0.1")?;
        let port: u16 = env.parsed("EMPORIUM_PORT", "8000")?;

        let timeouts = Timeouts {
            mutation: env.seconds("EMPORIUM_MUTATION_TIMEOUT_SECS", DEFAULT_MUTATION_TIMEOUT)?,
            checkout: env.seconds("EMPORIUM_CHECKOUT_TIMEOUT_SECS", DEFAULT_CHECKOUT_TIMEOUT)?,
        };

        let cache_defaults = ProductCacheConfig::default();
        let product_cache = ProductCacheConfig {
            ttl: env.seconds("EMPORIUM_PRODUCT_CACHE_TTL_SECS", cache_defaults.ttl)?,
            capacity: env.parsed(
                "EMPORIUM_PRODUCT_CACHE_CAPACITY",
                &cache_defaults.capacity.to_string(),
            )?,
        };

        let sentry = SentryConfig {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.optional("SENTRY_ENVIRONMENT"),
            sample_rate: env.parsed("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: env.parsed("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        };

        Ok(Self {
            store,
            host,
            port,
            timeouts,
            product_cache,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default`.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse a whole number of seconds.
    fn seconds(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        let secs: u64 = self.parsed(key, &default.as_secs().to_string())?;
        if !(1..=MAX_DURATION_SECS).contains(&secs) {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("must be between 1 and {MAX_DURATION_SECS} seconds"),
            ));
        }
        Ok(Duration::from_secs(secs))
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}
