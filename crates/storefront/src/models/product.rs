//! Product documents.

use serde::{Deserialize, Serialize};

use emporium_core::{Price, ProductId};

/// A catalogue product.
///
/// The cart subsystem only ever reads products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub rating: Option<u8>,
    /// Image URL or storage key.
    pub image: String,
}
