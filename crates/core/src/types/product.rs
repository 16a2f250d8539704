//! Catalog products and cart line items.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, Quantity};

/// A product as it appears in the catalog.
///
/// This is the input shape for adding to the cart. The `quantity` field is
/// accepted so catalog payloads deserialize unchanged, but the cart ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl Product {
    /// Create a catalog product with no quantity.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
            quantity: None,
        }
    }
}

/// One line in the cart.
///
/// Field names match the persisted JSON exactly:
/// `id`, `title`, `image_url`, `price`, `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
    pub quantity: Quantity,
}

impl CartItem {
    /// Start a new line with a single unit of `product`.
    #[must_use]
    pub fn from_product(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            image_url: product.image_url,
            price: product.price,
            quantity: Quantity::ONE,
        }
    }
}

impl From<Product> for CartItem {
    fn from(product: Product) -> Self {
        Self::from_product(product)
    }
}
