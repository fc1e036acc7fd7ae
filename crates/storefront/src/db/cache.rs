//! Read-through product cache.
//!
//! Products are read on every add-to-cart and instant-buy but change only
//! when the catalogue is reseeded, so lookups are cached with a TTL using
//! `moka`. Only hits are cached: a product that is missing now may be seeded
//! later.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use emporium_core::ProductId;

use super::{ProductStore, RepositoryError};
use crate::models::Product;

/// TTL cache in front of a [`ProductStore`].
pub struct CachedProductStore<S> {
    inner: S,
    cache: Cache<ProductId, Product>,
}

impl<S: ProductStore> CachedProductStore<S> {
    /// Wrap `inner` with a cache of at most `capacity` products, each kept
    /// for `ttl`.
    #[must_use]
    pub fn new(inner: S, capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    /// Drop every cached product.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl<S: ProductStore> ProductStore for CachedProductStore<S> {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        if let Some(product) = self.cache.get(&id).await {
            debug!(product_id = %id, "Cache hit for product");
            return Ok(Some(product));
        }

        let product = self.inner.find_by_id(id).await?;
        if let Some(product) = &product {
            self.cache.insert(id, product.clone()).await;
        }
        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use emporium_core::Price;

    use super::*;

    struct CountingStore {
        product: Product,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProductStore for CountingStore {
        async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((id == self.product.id).then(|| self.product.clone()))
        }
    }

    fn store() -> (CachedProductStore<CountingStore>, Product, Arc<AtomicUsize>) {
        let product = Product {
            id: ProductId::generate(),
            name: "Tea".to_string(),
            price: Price::from_cents(450).unwrap(),
            rating: None,
            image: "tea.png".to_string(),
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = CountingStore {
            product: product.clone(),
            calls: Arc::clone(&calls),
        };
        (
            CachedProductStore::new(inner, 100, Duration::from_secs(60)),
            product,
            calls,
        )
    }

    #[tokio::test]
    async fn test_hits_are_served_from_cache() {
        let (store, product, calls) = store();

        let first = store.find_by_id(product.id).await.unwrap();
        let second = store.find_by_id(product.id).await.unwrap();

        assert_eq!(first, Some(product.clone()));
        assert_eq!(second, Some(product));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_misses_are_not_cached() {
        let (store, _, calls) = store();
        let missing = ProductId::generate();

        assert_eq!(store.find_by_id(missing).await.unwrap(), None);
        assert_eq!(store.find_by_id(missing).await.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all_forces_reload() {
        let (store, product, calls) = store();

        store.find_by_id(product.id).await.unwrap();
        store.invalidate_all().await;
        store.find_by_id(product.id).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
