//! Postal addresses embedded in a user.

use serde::{Deserialize, Serialize};

use emporium_core::AddressId;

/// A delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address_id: AddressId,
    #[serde(default)]
    pub house: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
}
