//! YAML product catalogues.
//!
//! Used by `emporium-cli seed products` and by the in-memory backend at
//! startup (`EMPORIUM_SEED_FILE`).
//!
//! ```yaml
//! products:
//!   - name: Alpine Tent
//!     price: "129.99"
//!     rating: 4
//!     image: tents/alpine.jpg
//!   - id: 65f1c0ffee0000000000beef
//!     name: Trail Mug
//!     price: 10
//!     image: mugs/trail.jpg
//! ```
//!
//! Entries without an `id` get a fresh one; entries with an `id` replace the
//! stored product, so re-loading a catalogue with fixed ids is idempotent.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use emporium_core::{Price, ProductId};

use crate::models::Product;

/// Errors loading a catalogue.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalogue YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Every entry that failed validation, one message each.
    #[error("{} validation errors found", .0.len())]
    Invalid(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct Catalogue {
    products: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    id: Option<String>,
    name: String,
    price: Price,
    #[serde(default)]
    rating: Option<u8>,
    image: String,
}

impl Entry {
    fn into_product(self) -> Result<Product, String> {
        let id = match self.id.as_deref() {
            Some(raw) => raw
                .parse::<ProductId>()
                .map_err(|e| format!("{}: bad id {raw:?}: {e}", self.name))?,
            None => ProductId::generate(),
        };
        if self.name.trim().is_empty() {
            return Err(format!("{id}: name is empty"));
        }
        if self.rating.is_some_and(|r| r > 5) {
            return Err(format!("{}: rating must be 0-5", self.name));
        }
        let price = self
            .price
            .within_item_limit()
            .map_err(|e| format!("{}: {e}", self.name))?;

        Ok(Product {
            id,
            name: self.name,
            price,
            rating: self.rating,
            image: self.image,
        })
    }
}

/// Parse and validate a catalogue, collecting every bad entry.
///
/// # Errors
///
/// Returns `CatalogueError::Yaml` for malformed YAML and
/// `CatalogueError::Invalid` if any entry fails validation.
pub fn parse(content: &str) -> Result<Vec<Product>, CatalogueError> {
    let catalogue: Catalogue = serde_yaml::from_str(content)?;

    let mut products = Vec::with_capacity(catalogue.products.len());
    let mut errors = Vec::new();
    for entry in catalogue.products {
        match entry.into_product() {
            Ok(product) => products.push(product),
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        return Err(CatalogueError::Invalid(errors));
    }
    Ok(products)
}

/// Read and parse a catalogue file.
///
/// # Errors
///
/// Returns `CatalogueError::Read` if the file cannot be read, otherwise as
/// [`parse`].
pub async fn load(path: &Path) -> Result<Vec<Product>, CatalogueError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogueError::Read {
            path: path.display().to_string(),
            source,
        })?;
    parse(&content)
}
