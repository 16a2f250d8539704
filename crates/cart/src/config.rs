//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_DATA_DIR` - Directory for file-backed storage (default: `.go-marketplace`)
//! - `CART_STORAGE_KEY` - Storage key holding the cart (default: `@GoMarketplace:products`)
//! - `CART_CORRUPT_DATA` - What to do with unreadable saved carts: `discard` or `fail` (default: `discard`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::store::CART_STORAGE_KEY;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// How [`CartStore::load`](crate::CartStore::load) treats a saved cart that
/// cannot be parsed or breaks a cart invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptDataPolicy {
    /// Log a warning and start with an empty cart.
    #[default]
    Discard,
    /// Refuse to load and return `CartError::Corrupt`.
    Fail,
}

impl FromStr for CorruptDataPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "fail" => Ok(Self::Fail),
            other => Err(format!("expected `discard` or `fail`, got `{other}`")),
        }
    }
}

/// Options for a single cart store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Storage key the cart is read from and written to.
    pub key: String,
    /// Handling of corrupt saved data on load.
    pub corrupt_data: CorruptDataPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key: CART_STORAGE_KEY.to_string(),
            corrupt_data: CorruptDataPolicy::default(),
        }
    }
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Directory for file-backed storage
    pub data_dir: PathBuf,
    /// Store options
    pub store: StoreOptions,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = PathBuf::from(
            lookup("CART_DATA_DIR").unwrap_or_else(|| ".go-marketplace".to_string()),
        );
        let key = lookup("CART_STORAGE_KEY").unwrap_or_else(|| CART_STORAGE_KEY.to_string());
        if key.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }
        let corrupt_data = lookup("CART_CORRUPT_DATA")
            .map(|value| value.parse::<CorruptDataPolicy>())
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_CORRUPT_DATA".to_string(), e))?
            .unwrap_or_default();
        let sentry_dsn = lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty());

        Ok(Self {
            data_dir,
            store: StoreOptions { key, corrupt_data },
            sentry_dsn,
        })
    }
}
