//! Database migration commands.
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded at
//! compile time. The storefront never runs them on startup.

use thiserror::Error;

use super::{DATABASE_URL_VAR, database_url};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is unset, the connection fails, or
/// a migration fails to apply.
pub async fn storefront() -> Result<(), MigrationError> {
    let database_url = database_url().ok_or(MigrationError::MissingEnvVar(DATABASE_URL_VAR))?;

    tracing::info!("Connecting to storefront database...");
    let pool = emporium_storefront::db::create_pool(&database_url).await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
