//! User documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emporium_core::UserId;

use super::{Address, CartItem, Order};

/// Name of the embedded cart array inside a serialized [`User`].
pub const CART_FIELD: &str = "cart";

/// A customer document.
///
/// The document is the unit of consistency for every cart and order
/// mutation. `cart`, `addresses` and `orders` are always present (empty when
/// absent from storage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Password hash; never the plain password.
    pub password: String,
    pub email: String,
    pub phone: String,
    pub token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub cart: Vec<CartItem>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub orders: Vec<Order>,
}
