//! Order documents appended to a user's order history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emporium_core::{OrderId, Price, PriceError};

use super::CartItem;

/// How an order is to be paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub digital: bool,
    pub cash_on_delivery: bool,
}

impl PaymentMethod {
    /// Pay on delivery; the only method checkout records.
    pub const CASH_ON_DELIVERY: Self = Self {
        digital: false,
        cash_on_delivery: true,
    };
}

/// An immutable snapshot of purchased items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub items: Vec<CartItem>,
    pub total: Price,
    /// Reserved; checkout never applies a discount.
    #[serde(default)]
    pub discount: Option<Price>,
    pub payment_method: PaymentMethod,
    pub ordered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything about an order except its items and total.
///
/// Stores fill in the items (and derive the total) inside the same atomic
/// update that reads them, so the snapshot always matches what was billed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDraft {
    pub order_id: OrderId,
    pub discount: Option<Price>,
    pub payment_method: PaymentMethod,
    pub ordered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderDraft {
    /// A cash-on-delivery draft with a fresh ID, stamped `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            order_id: OrderId::generate(),
            discount: None,
            payment_method: PaymentMethod::CASH_ON_DELIVERY,
            ordered_at: now,
            updated_at: now,
        }
    }

    /// Complete the draft with `items`; the total is the sum of their prices.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the total cannot be represented.
    pub fn into_order(self, items: Vec<CartItem>) -> Result<Order, PriceError> {
        let total = Price::checked_sum(items.iter().map(|item| item.price))?;
        Ok(Order {
            order_id: self.order_id,
            items,
            total,
            discount: self.discount,
            payment_method: self.payment_method,
            ordered_at: self.ordered_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::ProductId;

    use super::*;

    fn item(cents: i64) -> CartItem {
        CartItem {
            product_id: ProductId::generate(),
            product_name: "Widget".to_string(),
            price: Price::from_cents(cents).unwrap(),
            rating: None,
            image: "widget.png".to_string(),
        }
    }

    #[test]
    fn test_into_order_totals_items() {
        let order = OrderDraft::new(Utc::now())
            .into_order(vec![item(1000), item(250)])
            .unwrap();
        assert_eq!(order.total, Price::from_cents(1250).unwrap());
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.payment_method, PaymentMethod::CASH_ON_DELIVERY);
    }

    #[test]
    fn test_into_order_empty_is_zero() {
        let order = OrderDraft::new(Utc::now()).into_order(Vec::new()).unwrap();
        assert_eq!(order.total, Price::ZERO);
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_into_order_overflow_is_an_error() {
        let mut huge = item(0);
        huge.price = Price::new(rust_decimal::Decimal::MAX).unwrap();

        let result = OrderDraft::new(Utc::now()).into_order(vec![huge.clone(), huge]);
        assert_eq!(result, Err(PriceError::Overflow));
    }
}
