//! Cart state container.
//!
//! [`CartStore`] owns the cart lines and writes the whole list to storage after
//! every change. Mutations run one at a time: each holds the store's mutex
//! from reading the current lines until the storage write returns, so two
//! concurrent `add_to_cart` calls for the same product always end at
//! quantity 2 and the last value written matches memory.
//!
//! Reads never wait on a write in flight. [`CartStore::products`] and
//! [`CartStore::subscribe`] go through a `watch` channel that is updated as
//! soon as a mutation is applied in memory.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, instrument, warn};

use go_marketplace_core::{CartItem, Product, ProductId};

use crate::config::{CorruptDataPolicy, StoreOptions};
use crate::error::{CartError, Result};
use crate::storage::KeyValueStorage;

/// Storage key holding the cart.
pub const CART_STORAGE_KEY: &str = "@GoMarketplace:products";

/// The shopping cart and its persisted mirror.
pub struct CartStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    lines: Mutex<Vec<CartItem>>,
    snapshot: watch::Sender<Vec<CartItem>>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("lines", &*self.snapshot.borrow())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Load the cart saved under `options.key`.
    ///
    /// A missing key starts an empty cart. Saved data that is not a JSON list
    /// of cart lines, or that repeats a product id, is handled according to
    /// `options.corrupt_data`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the read fails, or `CartError::Corrupt`
    /// if the saved cart is corrupt and the policy is `Fail`.
    #[instrument(skip(storage, options), fields(key = %options.key))]
    pub async fn load(storage: Arc<dyn KeyValueStorage>, options: StoreOptions) -> Result<Self> {
        let StoreOptions { key, corrupt_data } = options;

        let lines = match storage.get(&key).await.map_err(CartError::Storage)? {
            None => {
                info!("No saved cart, starting empty");
                Vec::new()
            }
            Some(raw) => match parse_lines(&raw) {
                Ok(lines) => {
                    info!(lines = lines.len(), "Loaded saved cart");
                    lines
                }
                Err(reason) => match corrupt_data {
                    CorruptDataPolicy::Discard => {
                        warn!(%reason, "Discarding corrupt saved cart");
                        Vec::new()
                    }
                    CorruptDataPolicy::Fail => return Err(CartError::Corrupt { key, reason }),
                },
            },
        };

        Ok(Self::with_lines(storage, key, lines))
    }

    /// Create a store from already-known lines without touching storage.
    fn with_lines(storage: Arc<dyn KeyValueStorage>, key: String, lines: Vec<CartItem>) -> Self {
        let (snapshot, _) = watch::channel(lines.clone());
        Self {
            storage,
            key,
            lines: Mutex::new(lines),
            snapshot,
        }
    }

    /// Storage key this cart is persisted under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current cart lines, in the order they were first added.
    #[must_use]
    pub fn products(&self) -> Vec<CartItem> {
        self.snapshot.borrow().clone()
    }

    /// The line for `id`, if it is in the cart.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<CartItem> {
        self.snapshot.borrow().iter().find(|line| &line.id == id).cloned()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.snapshot
            .borrow()
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.borrow().is_empty()
    }

    /// Watch the cart. The receiver sees every in-memory change, including
    /// changes whose write later fails.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<CartItem>> {
        self.snapshot.subscribe()
    }

    /// Add one unit of `product`.
    ///
    /// If the product is already in the cart its quantity goes up by one;
    /// otherwise a new line with quantity 1 is appended. Any quantity on the
    /// catalog product is ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persist` if the write fails. The line is still
    /// added in memory.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(&self, product: Product) -> Result<()> {
        self.mutate(move |lines| {
            if let Some(line) = lines.iter_mut().find(|line| line.id == product.id) {
                line.quantity = line.quantity.increment();
            } else {
                lines.push(CartItem::from_product(product));
            }
            Ok(())
        })
        .await
    }

    /// Add one unit to the line for `id`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` (cart unchanged, nothing written) if no
    /// line has this id, or `CartError::Persist` if the write fails.
    #[instrument(skip(self, id), fields(product_id = %id))]
    pub async fn increment(&self, id: &ProductId) -> Result<()> {
        self.mutate(|lines| {
            let line = lines
                .iter_mut()
                .find(|line| &line.id == id)
                .ok_or_else(|| CartError::NotInCart(id.clone()))?;
            line.quantity = line.quantity.increment();
            Ok(())
        })
        .await
    }

    /// Remove one unit from the line for `id`, dropping the line when its
    /// last unit goes.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` (cart unchanged, nothing written) if no
    /// line has this id, or `CartError::Persist` if the write fails.
    #[instrument(skip(self, id), fields(product_id = %id))]
    pub async fn decrement(&self, id: &ProductId) -> Result<()> {
        self.mutate(|lines| {
            let (index, line) = lines
                .iter_mut()
                .enumerate()
                .find(|(_, line)| &line.id == id)
                .ok_or_else(|| CartError::NotInCart(id.clone()))?;
            match line.quantity.decrement() {
                Some(quantity) => line.quantity = quantity,
                None => {
                    lines.remove(index);
                }
            }
            Ok(())
        })
        .await
    }

    /// Write the current cart to storage.
    ///
    /// Use this to retry after a mutation returned `CartError::Persist`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persist` if the write fails again.
    #[instrument(skip(self))]
    pub async fn persist(&self) -> Result<()> {
        let lines = self.lines.lock().await;
        self.write(&*lines).await
    }

    /// Apply `op` to the lines and write the result, holding the lock
    /// throughout. If `op` fails nothing changes and nothing is written.
    async fn mutate<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<CartItem>) -> Result<()>,
    {
        let mut lines = self.lines.lock().await;

        if let Err(e) = op(&mut *lines) {
            warn!(error = %e, "Cart operation rejected");
            return Err(e);
        }

        self.snapshot.send_replace(lines.clone());
        self.write(&*lines).await
    }

    async fn write(&self, lines: &[CartItem]) -> Result<()> {
        let raw = serde_json::to_string(lines)?;

        match self.storage.set(&self.key, &raw).await {
            Ok(()) => {
                debug!(lines = lines.len(), bytes = raw.len(), "Persisted cart");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, key = %self.key, "Failed to persist cart");
                Err(CartError::Persist(e))
            }
        }
    }
}

/// Parse saved cart text, rejecting repeated product ids.
fn parse_lines(raw: &str) -> std::result::Result<Vec<CartItem>, String> {
    let lines: Vec<CartItem> = serde_json::from_str(raw).map_err(|e| e.to_string())?;

    let mut seen = HashSet::with_capacity(lines.len());
    if let Some(dup) = lines.iter().find(|line| !seen.insert(&line.id)) {
        return Err(format!("duplicate product id {}", dup.id));
    }

    Ok(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use go_marketplace_core::{Price, Quantity};

    use super::*;
    use crate::storage::{MemoryStorage, StorageError};

    fn product(id: &str) -> Product {
        Product::new(id, "T", "u", Price::from_cents(1000))
    }

    fn quantities(store: &CartStore) -> Vec<(String, u32)> {
        store
            .products()
            .into_iter()
            .map(|line| (line.id.into_inner(), line.quantity.get()))
            .collect()
    }

    async fn empty_store() -> (CartStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        let store = CartStore::load(Arc::new(storage.clone()), StoreOptions::default())
            .await
            .unwrap();
        (store, storage)
    }

    async fn reload(storage: &MemoryStorage) -> Vec<CartItem> {
        CartStore::load(Arc::new(storage.clone()), StoreOptions::default())
            .await
            .unwrap()
            .products()
    }

    /// Storage whose writes can be switched off, counting every write attempt.
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_writes: AtomicBool,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStorage for FlakyStorage {
        async fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("disk full".to_string()));
            }
            self.inner.set(key, value).await
        }
    }

    struct UnreadableStorage;

    #[async_trait]
    impl KeyValueStorage for UnreadableStorage {
        async fn get(&self, _key: &str) -> std::result::Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("locked".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_load_without_saved_cart_is_empty() {
        let (store, storage) = empty_store().await;
        assert!(store.is_empty());
        assert_eq!(store.key(), CART_STORAGE_KEY);
        // Loading alone writes nothing
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_load_saved_cart() {
        let raw = r#"[{"id":"a","title":"T","image_url":"u","price":10,"quantity":3}]"#;
        let storage = MemoryStorage::with_entry(CART_STORAGE_KEY, raw);

        let store = CartStore::load(Arc::new(storage), StoreOptions::default())
            .await
            .unwrap();
        assert_eq!(quantities(&store), vec![("a".to_string(), 3)]);
    }

    #[tokio::test]
    async fn test_add_distinct_ids() {
        let (store, _) = empty_store().await;
        for id in ["a", "b", "c"] {
            store.add_to_cart(product(id)).await.unwrap();
        }

        assert_eq!(
            quantities(&store),
            vec![
                ("a".to_string(), 1),
                ("b".to_string(), 1),
                ("c".to_string(), 1)
            ]
        );
    }

    #[tokio::test]
    async fn test_add_same_id_twice_merges() {
        let (store, _) = empty_store().await;
        store.add_to_cart(product("a")).await.unwrap();
        store.add_to_cart(product("a")).await.unwrap();

        assert_eq!(quantities(&store), vec![("a".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_add_ignores_catalog_quantity() {
        let (store, _) = empty_store().await;
        let mut p = product("a");
        p.quantity = Some(5);
        store.add_to_cart(p).await.unwrap();

        assert_eq!(store.get(&ProductId::new("a")).unwrap().quantity, Quantity::ONE);
    }

    #[tokio::test]
    async fn test_increment_only_touches_target() {
        let (store, _) = empty_store().await;
        store.add_to_cart(product("a")).await.unwrap();
        store.add_to_cart(product("b")).await.unwrap();

        store.increment(&ProductId::new("b")).await.unwrap();

        assert_eq!(
            quantities(&store),
            vec![("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_decrement_keeps_line_above_one() {
        let (store, _) = empty_store().await;
        store.add_to_cart(product("a")).await.unwrap();
        store.add_to_cart(product("a")).await.unwrap();
        store.add_to_cart(product("a")).await.unwrap();

        store.decrement(&ProductId::new("a")).await.unwrap();

        assert_eq!(quantities(&store), vec![("a".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_decrement_last_unit_removes_line() {
        let (store, storage) = empty_store().await;
        store.add_to_cart(product("a")).await.unwrap();
        store.add_to_cart(product("b")).await.unwrap();

        store.decrement(&ProductId::new("a")).await.unwrap();

        assert_eq!(quantities(&store), vec![("b".to_string(), 1)]);
        assert_eq!(reload(&storage).await, store.products());
    }

    #[tokio::test]
    async fn test_missing_id_is_reported_and_not_written() {
        let storage = Arc::new(FlakyStorage::default());
        let store = CartStore::load(storage.clone(), StoreOptions::default())
            .await
            .unwrap();
        store.add_to_cart(product("a")).await.unwrap();
        assert_eq!(storage.writes.load(Ordering::SeqCst), 1);

        let missing = ProductId::new("zzz");
        assert!(matches!(
            store.increment(&missing).await,
            Err(CartError::NotInCart(id)) if id == missing
        ));
        assert!(matches!(
            store.decrement(&missing).await,
            Err(CartError::NotInCart(_))
        ));

        assert_eq!(quantities(&store), vec![("a".to_string(), 1)]);
        assert_eq!(storage.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_every_mutation_is_written_through() {
        let (store, storage) = empty_store().await;
        let id = ProductId::new("a");

        store.add_to_cart(product("a")).await.unwrap();
        assert_eq!(reload(&storage).await, store.products());

        store.increment(&id).await.unwrap();
        assert_eq!(reload(&storage).await, store.products());

        store.decrement(&id).await.unwrap();
        assert_eq!(reload(&storage).await, store.products());

        store.decrement(&id).await.unwrap();
        assert_eq!(reload(&storage).await, Vec::<CartItem>::new());
    }

    #[tokio::test]
    async fn test_persisted_format() {
        let (store, storage) = empty_store().await;
        store.add_to_cart(product("a")).await.unwrap();

        let raw = storage.get(CART_STORAGE_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "id": "a",
                "title": "T",
                "image_url": "u",
                "price": 10.0,
                "quantity": 1
            }])
        );
    }

    #[tokio::test]
    async fn test_full_scenario() {
        let (store, storage) = empty_store().await;
        let id = ProductId::new("a");

        store.add_to_cart(product("a")).await.unwrap();
        assert_eq!(quantities(&store), vec![("a".to_string(), 1)]);

        store.add_to_cart(product("a")).await.unwrap();
        assert_eq!(quantities(&store), vec![("a".to_string(), 2)]);

        store.increment(&id).await.unwrap();
        assert_eq!(quantities(&store), vec![("a".to_string(), 3)]);

        store.decrement(&id).await.unwrap();
        assert_eq!(quantities(&store), vec![("a".to_string(), 2)]);

        store.decrement(&id).await.unwrap();
        store.decrement(&id).await.unwrap();
        assert!(store.is_empty());
        assert!(reload(&storage).await.is_empty());
    }

    #[tokio::test]
    async fn test_item_count() {
        let (store, _) = empty_store().await;
        store.add_to_cart(product("a")).await.unwrap();
        store.add_to_cart(product("a")).await.unwrap();
        store.add_to_cart(product("b")).await.unwrap();

        assert_eq!(store.item_count(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_adds_do_not_lose_updates() {
        let (store, storage) = empty_store().await;
        let store = Arc::new(store);

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.add_to_cart(product("a")).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(quantities(&store), vec![("a".to_string(), 50)]);
        assert_eq!(reload(&storage).await, store.products());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_and_persist_recovers() {
        let storage = Arc::new(FlakyStorage::default());
        let store = CartStore::load(storage.clone(), StoreOptions::default())
            .await
            .unwrap();

        storage.fail_writes.store(true, Ordering::SeqCst);
        let err = store.add_to_cart(product("a")).await.unwrap_err();
        assert!(err.is_unpersisted_change());
        assert_eq!(quantities(&store), vec![("a".to_string(), 1)]);
        assert_eq!(storage.inner.get(CART_STORAGE_KEY).await.unwrap(), None);

        storage.fail_writes.store(false, Ordering::SeqCst);
        store.persist().await.unwrap();

        let reloaded = CartStore::load(storage.clone(), StoreOptions::default())
            .await
            .unwrap();
        assert_eq!(reloaded.products(), store.products());
    }

    #[tokio::test]
    async fn test_read_failure_is_surfaced() {
        let result = CartStore::load(Arc::new(UnreadableStorage), StoreOptions::default()).await;
        assert!(matches!(result, Err(CartError::Storage(_))));
    }

    #[tokio::test]
    async fn test_corrupt_data_discarded_by_default() {
        let storage = MemoryStorage::with_entry(CART_STORAGE_KEY, "{not json");
        let store = CartStore::load(Arc::new(storage), StoreOptions::default())
            .await
            .unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_data_fails_when_configured() {
        let options = StoreOptions {
            corrupt_data: CorruptDataPolicy::Fail,
            ..StoreOptions::default()
        };

        let zero = r#"[{"id":"a","title":"T","image_url":"u","price":1,"quantity":0}]"#;
        let storage = MemoryStorage::with_entry(CART_STORAGE_KEY, zero);
        let result = CartStore::load(Arc::new(storage), options.clone()).await;
        assert!(matches!(result, Err(CartError::Corrupt { .. })));

        let dup = r#"[
            {"id":"a","title":"T","image_url":"u","price":1,"quantity":1},
            {"id":"a","title":"T","image_url":"u","price":1,"quantity":2}
        ]"#;
        let storage = MemoryStorage::with_entry(CART_STORAGE_KEY, dup);
        let err = CartStore::load(Arc::new(storage), options).await.unwrap_err();
        assert!(err.to_string().contains("duplicate product id a"));
    }

    #[tokio::test]
    async fn test_precise_price_reloads_unchanged() {
        let (store, storage) = empty_store().await;
        let prices = [
            ("a", "123456789.123456"),
            ("b", "0.000001"),
            ("c", "999999999999999"),
        ];
        for (id, raw) in prices {
            let price = Price::parse(raw).unwrap();
            store.add_to_cart(Product::new(id, "T", "u", price)).await.unwrap();
        }

        let reloaded = reload(&storage).await;
        assert_eq!(reloaded, store.products());
        assert_eq!(reloaded[0].price, Price::parse("123456789.123456").unwrap());
    }

    #[tokio::test]
    async fn test_unstorable_prices_never_reach_the_cart() {
        let (store, storage) = empty_store().await;
        store.add_to_cart(product("a")).await.unwrap();

        // Neither value survives a trip through a JSON number
        assert!(Price::parse("79228162514264337593543950335").is_err());
        assert!(Price::parse("0.1234567890123456789").is_err());

        // A saved cart holding one is corrupt rather than silently rounded
        let raw = r#"[{"id":"a","title":"T","image_url":"u","price":7.922816251426434e28,"quantity":1}]"#;
        let corrupt = MemoryStorage::with_entry(CART_STORAGE_KEY, raw);
        let options = StoreOptions {
            corrupt_data: CorruptDataPolicy::Fail,
            ..StoreOptions::default()
        };
        let result = CartStore::load(Arc::new(corrupt), options).await;
        assert!(matches!(result, Err(CartError::Corrupt { .. })));

        assert_eq!(reload(&storage).await, store.products());
    }

    #[tokio::test]
    async fn test_subscribe_sees_changes() {
        let (store, _) = empty_store().await;
        let mut rx = store.subscribe();

        store.add_to_cart(product("a")).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, ProductId::new("a"));
    }
}
