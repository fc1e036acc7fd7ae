//! Seed the product catalogue from a YAML file.
//!
//! The file format is described in [`emporium_storefront::catalogue`].

use std::path::Path;

use tracing::{error, info};

use emporium_storefront::catalogue::{self, CatalogueError};
use emporium_storefront::db::{self, PgProductStore};

use super::{DATABASE_URL_VAR, database_url};

/// Upsert products from a YAML catalogue.
///
/// # Errors
///
/// Returns an error if the database URL is unset, the file cannot be read or
/// validated, or a database write fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url().ok_or(format!("{DATABASE_URL_VAR} not set"))?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalogue from file");

    // Validate before connecting to the database
    let products = match catalogue::load(path).await {
        Ok(products) => products,
        Err(CatalogueError::Invalid(errors)) => {
            error!("Catalogue validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(CatalogueError::Invalid(errors).into());
        }
        Err(e) => return Err(e.into()),
    };

    info!(products = products.len(), "Catalogue validated");

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let store = PgProductStore::new(pool);
    for product in &products {
        store.upsert(product).await?;
        info!(id = %product.id, name = %product.name, price = %product.price, "Upserted product");
    }

    info!("Seeding complete! {} products written", products.len());
    Ok(())
}
