//! `PostgreSQL` user document store.
//!
//! Each user is one `emporium.users` row whose `doc` column holds the whole
//! document. Cart and order changes are single `UPDATE ... SET doc =
//! jsonb_set(...)` statements, so concurrent requests for the same user are
//! serialized by the row lock instead of overwriting each other.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use emporium_core::pipeline::{Pipeline, PipelineError};
use emporium_core::{PriceError, ProductId, UserId};

use super::{RepositoryError, UserStore, conflict_on_unique, pipeline};
use crate::models::{CartItem, Order, OrderDraft, User};

const USERS_TABLE: &str = "emporium.users";

/// User store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: UserId) -> Result<bool, RepositoryError> {
        let found: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM emporium.users WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(found)
    }
}

/// Decode a JSONB column into a document type.
fn decode_doc<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, RepositoryError> {
    serde_json::from_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid {what} document: {e}")))
}

fn require_row(rows_affected: u64) -> Result<(), RepositoryError> {
    if rows_affected == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let doc: Option<Json<Value>> =
            sqlx::query_scalar("SELECT doc FROM emporium.users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        doc.map(|Json(value)| decode_doc(value, "user")).transpose()
    }

    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM emporium.users WHERE doc->>'email' = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn phone_exists(&self, phone: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM emporium.users WHERE doc->>'phone' = $1)",
        )
        .bind(phone)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO emporium.users (id, doc) VALUES ($1, $2)")
            .bind(user.id)
            .bind(Json(user))
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "user"))?;
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE emporium.users SET doc = $2 WHERE id = $1")
            .bind(user.id)
            .bind(Json(user))
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "user"))?;
        require_row(result.rows_affected())
    }

    async fn append_to_cart(&self, id: UserId, item: &CartItem) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE emporium.users
            SET doc = jsonb_set(
                doc,
                '{cart}',
                COALESCE(doc->'cart', '[]'::jsonb) || jsonb_build_array($2::jsonb)
            )
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(Json(item))
        .execute(&self.pool)
        .await?;
        require_row(result.rows_affected())
    }

    async fn remove_from_cart(
        &self,
        id: UserId,
        product: ProductId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE emporium.users
            SET doc = jsonb_set(
                doc,
                '{cart}',
                COALESCE(
                    (
                        SELECT jsonb_agg(line.item ORDER BY line.position)
                        FROM jsonb_array_elements(COALESCE(doc->'cart', '[]'::jsonb))
                             WITH ORDINALITY AS line(item, position)
                        WHERE line.item->>'product_id' IS DISTINCT FROM $2
                    ),
                    '[]'::jsonb
                )
            )
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(product.to_string())
        .execute(&self.pool)
        .await?;
        require_row(result.rows_affected())
    }

    async fn checkout_cart(
        &self,
        id: UserId,
        draft: &OrderDraft,
    ) -> Result<Order, RepositoryError> {
        // Both jsonb_set calls read the same pre-update `doc`, so the order's
        // items are exactly the cart being cleared. A total beyond `Decimal`
        // matches no row, so nothing is written that could not be read back.
        let order: Option<Json<Value>> = sqlx::query_scalar(
            r"
            UPDATE emporium.users
            SET doc = jsonb_set(
                jsonb_set(
                    doc,
                    '{orders}',
                    COALESCE(doc->'orders', '[]'::jsonb) || jsonb_build_array(
                        $2::jsonb || jsonb_build_object(
                            'items', COALESCE(doc->'cart', '[]'::jsonb),
                            'total', (
                                SELECT COALESCE(SUM((line->>'price')::numeric), 0)::text
                                FROM jsonb_array_elements(COALESCE(doc->'cart', '[]'::jsonb)) AS line
                            )
                        )
                    )
                ),
                '{cart}',
                '[]'::jsonb
            )
            WHERE id = $1
              AND (
                SELECT COALESCE(SUM((line->>'price')::numeric), 0)
                FROM jsonb_array_elements(COALESCE(doc->'cart', '[]'::jsonb)) AS line
              ) <= $3
            RETURNING doc->'orders'->-1
            ",
        )
        .bind(id)
        .bind(Json(draft))
        .bind(Decimal::MAX)
        .fetch_optional(&self.pool)
        .await?;

        match order {
            Some(Json(order)) => decode_doc(order, "order"),
            None if self.exists(id).await? => Err(PriceError::Overflow.into()),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn append_order(&self, id: UserId, order: &Order) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE emporium.users
            SET doc = jsonb_set(
                doc,
                '{orders}',
                COALESCE(doc->'orders', '[]'::jsonb) || jsonb_build_array($2::jsonb)
            )
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(Json(order))
        .execute(&self.pool)
        .await?;
        require_row(result.rows_affected())
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Value>, RepositoryError> {
        let compiled = pipeline::compile(pipeline, USERS_TABLE)?;

        let mut query = sqlx::query(&compiled.sql);
        for value in &compiled.binds {
            query = query.bind(Json(value));
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            if compiled.grouped {
                let complete: Option<bool> = row.try_get("complete")?;
                if complete == Some(false) {
                    let path = compiled
                        .summed
                        .first()
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    return Err(PipelineError::MissingField { path }.into());
                }
            }
            let Json(value): Json<Value> = row.try_get("row")?;
            out.push(value);
        }
        Ok(out)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
