//! Core types for Emporium.
//!
//! This module provides type-safe wrappers for identifiers and prices.

pub mod id;
pub mod price;

pub use id::*;
pub use price::{Price, PriceError};
