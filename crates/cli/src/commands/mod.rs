//! CLI command implementations.

use thiserror::Error;

use go_marketplace_cart::{CartError, StorageError};

pub mod cart;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The data directory could not be opened.
    #[error("Failed to open cart storage: {0}")]
    Storage(#[from] StorageError),

    /// The cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),
}
