//! Cart totals via the document aggregation pipeline.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use emporium_core::pipeline::{Accumulator, FieldPath, Pipeline};
use emporium_core::{Price, UserId};

use crate::db::{RepositoryError, UserStore};
use crate::models::CartItem;
use crate::models::cart::PRICE_FIELD;
use crate::models::user::CART_FIELD;
use crate::services::cart::{CartError, parse_id};
use crate::services::deadline::{Deadline, Timeouts};

/// Output name of the summed cart total.
const TOTAL_FIELD: &str = "total";

/// Reads of user plus aggregation before giving up on a matching pair.
const SUMMARY_ATTEMPTS: usize = 3;

/// A user's cart with its computed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub total: Price,
    pub items: Vec<CartItem>,
}

/// match `_id` -> unwind `cart` -> group by `_id` summing `cart.price`.
#[must_use]
pub fn cart_total_pipeline(user_id: UserId) -> Pipeline {
    let price = FieldPath::new(format!("{CART_FIELD}.{PRICE_FIELD}"));
    Pipeline::new()
        .matching("_id", Value::String(user_id.to_string()))
        .unwind(CART_FIELD)
        .group("_id", [(TOTAL_FIELD, Accumulator::Sum(price))])
}

/// Computes cart totals.
pub struct CartAggregator<'a> {
    users: &'a dyn UserStore,
    timeouts: Timeouts,
}

impl<'a> CartAggregator<'a> {
    /// Create a new aggregator.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore, timeouts: Timeouts) -> Self {
        Self { users, timeouts }
    }

    /// Load the user's cart and sum its prices.
    ///
    /// An empty cart yields no aggregation rows and a zero total. The user
    /// and the aggregation are separate reads, so a write landing between
    /// them is detected by comparing the total with the loaded items and the
    /// pair is re-read. If writes keep racing, the last pair is returned
    /// as-is with a warning.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidInput` for a missing or malformed ID,
    /// `CartError::UserNotFound` if the user is absent, `CartError::Store` if
    /// the aggregation fails (including a cart item without a price), and
    /// `CartError::Timeout` if the checkout budget runs out.
    #[instrument(skip(self))]
    pub async fn get_cart_summary(&self, user_id: &str) -> Result<CartSummary, CartError> {
        let user_id: UserId = parse_id(user_id, "user id")?;
        let deadline = Deadline::after(self.timeouts.checkout, "cart summary");

        let pipeline = cart_total_pipeline(user_id);

        let mut attempt = 1;
        loop {
            let user = deadline
                .run(self.users.find_by_id(user_id))
                .await??
                .ok_or(CartError::UserNotFound)?;

            let rows = deadline.run(self.users.aggregate(&pipeline)).await??;
            let total = match rows.first() {
                Some(row) => total_from_row(row)?,
                None => Price::ZERO,
            };

            let consistent =
                Price::checked_sum(user.cart.iter().map(|item| item.price)) == Ok(total);
            if consistent || attempt == SUMMARY_ATTEMPTS {
                if !consistent {
                    warn!(%user_id, %total, "Cart kept changing during summary");
                }
                debug!(%user_id, %total, items = user.cart.len(), "Computed cart summary");
                return Ok(CartSummary {
                    total,
                    items: user.cart,
                });
            }

            debug!(%user_id, attempt, "Cart changed between reads; retrying summary");
            attempt += 1;
        }
    }
}

fn total_from_row(row: &Value) -> Result<Price, RepositoryError> {
    let corrupt = || RepositoryError::DataCorruption(format!("unexpected aggregation row: {row}"));
    let raw = row.get(TOTAL_FIELD).and_then(Value::as_str).ok_or_else(corrupt)?;
    let amount = Decimal::from_str(raw).map_err(|_| corrupt())?;
    Price::new(amount).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
}
