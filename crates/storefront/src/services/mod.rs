//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - add/remove items, cart checkout and instant buy
//! - `aggregator` - cart totals through the aggregation pipeline
//! - `accounts` - user signup
//! - `deadline` - per-operation time budgets for store calls
//!
//! Services borrow their stores from [`crate::state::AppState`] for the
//! duration of one request; none of them hold global handles.

pub mod accounts;
pub mod aggregator;
pub mod cart;
pub mod deadline;

pub use accounts::{AccountError, AccountService};
pub use aggregator::{CartAggregator, CartSummary};
pub use cart::{CartError, CartService};
pub use deadline::Timeouts;
