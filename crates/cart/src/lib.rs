//! Go Marketplace Cart - Write-through shopping cart store.
//!
//! The cart is an ordered list of [`CartItem`]s held in memory and mirrored to
//! a single key in a [`KeyValueStorage`] after every change.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use go_marketplace_cart::{CartHandle, CartStore, FileStorage, StoreOptions};
//!
//! let storage = Arc::new(FileStorage::open(".go-marketplace").await?);
//! let cart = CartHandle::new(CartStore::load(storage, StoreOptions::default()).await?);
//!
//! cart.add_to_cart(product).await?;
//! cart.increment(&product_id).await?;
//! ```
//!
//! # Modules
//!
//! - [`store`] - The cart state container and its mutation queue
//! - [`storage`] - Key-value storage trait with memory and file backends
//! - [`provider`] - Explicit handle plus task-scoped lookup
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod provider;
pub mod storage;
pub mod store;

pub use config::{CartConfig, ConfigError, CorruptDataPolicy, StoreOptions};
pub use error::{CartError, Result};
pub use provider::{CartHandle, ProviderScopeError};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use store::{CART_STORAGE_KEY, CartStore};

pub use go_marketplace_core::{CartItem, Price, Product, ProductId, Quantity};
