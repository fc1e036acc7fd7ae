//! `PostgreSQL` product document store.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;

use emporium_core::ProductId;

use super::{ProductStore, RepositoryError};
use crate::models::Product;

/// Product store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Create a new product store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace a product document.
    ///
    /// Used by the seed command; the request path never writes products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Price` if the price is above
    /// `Price::MAX_ITEM`, and `RepositoryError::Database` if the write fails.
    pub async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        product.price.within_item_limit()?;

        sqlx::query(
            r"
            INSERT INTO emporium.products (id, doc)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc
            ",
        )
        .bind(product.id)
        .bind(Json(product))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let doc: Option<Json<Value>> =
            sqlx::query_scalar("SELECT doc FROM emporium.products WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        doc.map(|Json(value)| {
            serde_json::from_value(value).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid product document {id}: {e}"))
            })
        })
        .transpose()
    }
}
