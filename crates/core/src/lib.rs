//! Zypso Mart Core - Shared domain types.
//!
//! This crate provides the types used across all Zypso Mart components:
//! - `storefront` - Customer-facing catalog, cart and checkout
//! - `admin` - Shop dashboard (orders, inventory, settings)
//! - `cli` - Command-line tools for seeding and reporting
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients. Records mirror the documents stored in the hosted document
//! database; the field names on the wire are the camelCase names the store
//! uses.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, rupee prices and status enums
//! - [`models`] - Product, category, order and shop settings records
//! - [`format`] - Shop-local timestamp formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod format;
pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
