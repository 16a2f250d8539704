//! Cart capability handle.
//!
//! Build one [`CartStore`] at startup, wrap it in a [`CartHandle`], and pass
//! clones to whatever needs the cart. For code that cannot take the handle as
//! an argument, [`scope`] installs it for the duration of a future and
//! [`use_cart`] fetches it back. Asking for the cart outside any scope is a
//! wiring bug, so `use_cart` panics rather than handing back a dead handle.

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use thiserror::Error;

use crate::store::CartStore;

tokio::task_local! {
    static CURRENT_CART: CartHandle;
}

/// The cart was requested outside a provider scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("use_cart must be used within a CartProvider scope")]
pub struct ProviderScopeError;

/// Shared, cheaply cloneable access to the cart store.
#[derive(Debug, Clone)]
pub struct CartHandle {
    inner: Arc<CartStore>,
}

impl CartHandle {
    /// Wrap a loaded store.
    #[must_use]
    pub fn new(store: CartStore) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Whether two handles refer to the same store.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Deref for CartHandle {
    type Target = CartStore;

    fn deref(&self) -> &CartStore {
        &self.inner
    }
}

impl From<CartStore> for CartHandle {
    fn from(store: CartStore) -> Self {
        Self::new(store)
    }
}

/// Run `fut` with `handle` available through [`use_cart`].
pub async fn scope<F>(handle: CartHandle, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT_CART.scope(handle, fut).await
}

/// Run `f` synchronously with `handle` available through [`use_cart`].
pub fn sync_scope<F, R>(handle: CartHandle, f: F) -> R
where
    F: FnOnce() -> R,
{
    CURRENT_CART.sync_scope(handle, f)
}

/// The cart installed by the enclosing scope.
///
/// # Errors
///
/// Returns `ProviderScopeError` when called outside [`scope`] or [`sync_scope`].
pub fn try_use_cart() -> Result<CartHandle, ProviderScopeError> {
    CURRENT_CART
        .try_with(CartHandle::clone)
        .map_err(|_| ProviderScopeError)
}

/// The cart installed by the enclosing scope.
///
/// # Panics
///
/// Panics with "use_cart must be used within a CartProvider scope" when called
/// outside [`scope`] or [`sync_scope`].
#[must_use]
pub fn use_cart() -> CartHandle {
    match try_use_cart() {
        Ok(handle) => handle,
        Err(e) => panic!("{e}"),
    }
}
