//! Type-safe price representation using decimal arithmetic.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors constructing a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),

    #[error("price {0} exceeds the per-item limit")]
    TooLarge(Decimal),

    #[error("price total overflowed")]
    Overflow,
}

/// A non-negative amount in the store's currency.
///
/// Serialized as a decimal string (e.g. `"10.00"`) so no precision is lost in
/// JSON documents. Deserialization accepts strings or JSON numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest price a single catalogue product may carry (one trillion).
    ///
    /// Keeps cart and order totals far inside `Decimal`'s range.
    pub const MAX_ITEM: Self = Self(Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0));

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an integer number of cents.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `cents` is below zero.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Reject prices above [`Price::MAX_ITEM`].
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooLarge` if the price exceeds the limit.
    pub fn within_item_limit(self) -> Result<Self, PriceError> {
        if self > Self::MAX_ITEM {
            return Err(PriceError::TooLarge(self.0));
        }
        Ok(self)
    }

    /// Add two prices, or `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Sum prices without panicking.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the total leaves `Decimal`'s range.
    pub fn checked_sum(prices: impl IntoIterator<Item = Self>) -> Result<Self, PriceError> {
        prices
            .into_iter()
            .try_fold(Self::ZERO, Self::checked_add)
            .ok_or(PriceError::Overflow)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
