//! Emporium Core - Shared types library.
//!
//! This crate provides the types shared by the Emporium components:
//! - `storefront` - Cart and checkout HTTP service
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. Storage backends live in the storefront crate and either
//! evaluate a [`pipeline::Pipeline`] in process or translate it to SQL.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for document IDs and prices
//! - [`pipeline`] - Match/unwind/group aggregation over JSON documents

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pipeline;
pub mod types;

pub use types::*;
