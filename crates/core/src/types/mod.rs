//! Core types for Zypso Mart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;

pub use id::*;
pub use price::{ParsePriceError, Price};
pub use status::*;
