//! Integration tests for the Go Marketplace cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p go-marketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sessions` - Carts surviving a restart on file-backed storage
//! - `cart_provider` - Handle passing and provider scope lookup
//!
//! The helpers below build carts the way an application does at startup, so
//! each test can "restart" by calling [`open_file_cart`] again on the same
//! directory.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;
use std::sync::Arc;

use go_marketplace_cart::{CartHandle, CartStore, FileStorage, Result, StoreOptions};
use go_marketplace_core::{Price, Product};

/// A catalog product with fixed title, image and a price of `cents`.
#[must_use]
pub fn sample_product(id: &str, cents: u32) -> Product {
    Product::new(
        id,
        format!("Product {id}"),
        format!("https://cdn.example/{id}.png"),
        Price::from_cents(cents),
    )
}

/// Start a cart session backed by files under `dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be opened or the saved cart
/// cannot be loaded.
pub async fn open_file_cart(dir: &Path, options: StoreOptions) -> Result<CartHandle> {
    let storage = FileStorage::open(dir)
        .await
        .map_err(go_marketplace_cart::CartError::Storage)?;
    let store = CartStore::load(Arc::new(storage), options).await?;
    Ok(CartHandle::new(store))
}
