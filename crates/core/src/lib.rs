//! Go Marketplace Core - Shared cart domain types.
//!
//! This crate provides the types used by the cart store and its front ends:
//! - `cart` - Write-through cart state container
//! - `cli` - Command-line front end over a file-backed cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, quantities, and cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
