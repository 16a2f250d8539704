//! Cart commands.
//!
//! Each command loads the cart from the configured data directory, applies
//! at most one change, and reports the result through `tracing`.

use std::sync::Arc;

use tracing::{info, warn};

use go_marketplace_cart::{CartConfig, CartHandle, CartItem, CartStore, FileStorage};
use go_marketplace_core::{Price, Product, ProductId};

use super::CommandError;

/// Open the saved cart described by `config`.
///
/// # Errors
///
/// Returns an error if the data directory cannot be created or the saved
/// cart cannot be read.
pub async fn open(config: &CartConfig) -> Result<CartHandle, CommandError> {
    let storage = FileStorage::open(&config.data_dir).await?;
    let store = CartStore::load(Arc::new(storage), config.store.clone()).await?;
    Ok(CartHandle::new(store))
}

/// One display row for a cart line.
fn format_line(line: &CartItem) -> String {
    format!(
        "{} x{} {} ({} each) {}",
        line.id, line.quantity, line.title, line.price, line.image_url
    )
}

/// Log every line in the cart.
pub fn list(cart: &CartHandle) {
    let lines = cart.products();
    if lines.is_empty() {
        info!("Cart is empty");
        return;
    }

    info!("Cart ({} lines, {} units)", lines.len(), cart.item_count());
    for line in &lines {
        info!("  {}", format_line(line));
    }
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if the updated cart cannot be saved.
pub async fn add(
    cart: &CartHandle,
    id: ProductId,
    title: String,
    image_url: String,
    price: Price,
) -> Result<(), CommandError> {
    let product = Product::new(id.clone(), title, image_url, price);
    cart.add_to_cart(product).await?;
    report_line(cart, &id);
    Ok(())
}

/// Add one unit to a product already in the cart.
///
/// # Errors
///
/// Returns an error if the product is not in the cart or the cart cannot be
/// saved.
pub async fn increment(cart: &CartHandle, id: &ProductId) -> Result<(), CommandError> {
    cart.increment(id).await?;
    report_line(cart, id);
    Ok(())
}

/// Remove one unit of a product.
///
/// # Errors
///
/// Returns an error if the product is not in the cart or the cart cannot be
/// saved.
pub async fn decrement(cart: &CartHandle, id: &ProductId) -> Result<(), CommandError> {
    cart.decrement(id).await?;
    report_line(cart, id);
    Ok(())
}

/// Log the total number of units in the cart.
pub fn count(cart: &CartHandle) {
    info!("{}", cart.item_count());
}

fn report_line(cart: &CartHandle, id: &ProductId) {
    match cart.get(id) {
        Some(line) => info!("{}", format_line(&line)),
        None => warn!("{id} removed from cart"),
    }
}
