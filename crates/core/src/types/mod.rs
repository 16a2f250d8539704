//! Core types for Go Marketplace.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod quantity;

pub use id::ProductId;
pub use price::{Price, PriceError};
pub use product::{CartItem, Product};
pub use quantity::Quantity;
