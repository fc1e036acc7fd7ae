//! Document models for the storefront.
//!
//! A user is one document holding their cart, order history and addresses;
//! products are separate read-only documents. There is no standalone cart or
//! order collection.

pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use address::Address;
pub use cart::CartItem;
pub use order::{Order, OrderDraft, PaymentMethod};
pub use product::Product;
pub use user::User;
