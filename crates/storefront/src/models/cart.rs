//! Cart line documents embedded in a user.

use serde::{Deserialize, Serialize};

use emporium_core::{Price, ProductId};

use super::Product;

/// Name of the price field inside a serialized [`CartItem`].
pub const PRICE_FIELD: &str = "price";

/// Name of the product reference inside a serialized [`CartItem`].
pub const PRODUCT_ID_FIELD: &str = "product_id";

/// One product placed in a cart, with its price at the time it was added.
///
/// Adding the same product twice produces two entries; quantities are never
/// merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Price,
    #[serde(default)]
    pub rating: Option<u8>,
    pub image: String,
}

impl From<&Product> for CartItem {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            price: product.price,
            rating: product.rating,
            image: product.image.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_match_serialized_form() {
        let product = Product {
            id: ProductId::generate(),
            name: "Mug".to_string(),
            price: Price::from_cents(1000).unwrap(),
            rating: Some(4),
            image: "mug.png".to_string(),
        };
        let value = serde_json::to_value(CartItem::from(&product)).unwrap();

        assert_eq!(value[PRICE_FIELD], "10.00");
        assert_eq!(value[PRODUCT_ID_FIELD], product.id.to_string());
    }
}
