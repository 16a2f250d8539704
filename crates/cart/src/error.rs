//! Cart error types.
//!
//! Store operations return `Result<T, CartError>`. None of these are fatal to
//! the process: a failed write leaves the in-memory cart authoritative, and an
//! unknown product id leaves the cart unchanged.

use thiserror::Error;

use go_marketplace_core::ProductId;

use crate::storage::StorageError;

/// Error type for cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Reading the persisted cart failed.
    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),

    /// Writing the cart failed. The in-memory change was kept.
    #[error("Cart changed but was not persisted: {0}")]
    Persist(#[source] StorageError),

    /// The persisted cart could not be parsed or breaks a cart invariant.
    #[error("Corrupt cart data at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// No line with this product id is in the cart.
    #[error("Product not in cart: {0}")]
    NotInCart(ProductId),

    /// The cart could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CartError {
    /// Whether the operation changed the in-memory cart despite the error.
    #[must_use]
    pub const fn is_unpersisted_change(&self) -> bool {
        matches!(self, Self::Persist(_))
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
