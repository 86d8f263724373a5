//! Per-entity services.
//!
//! Each entity has a capability trait with two implementations: a raw
//! `Store*Service` that validates input and talks to the store, and a
//! `Cached*Service` decorator that wraps any implementation of the same trait
//! with cache-aside reads and write-through invalidation.
//!
//! Decorator contract:
//! - reads check the cache for their shape and only call the inner service
//!   on a miss, populating the cache with the result;
//! - writes call the inner service first and apply the invalidation plan only
//!   when it succeeded; a failed write leaves every cache untouched and its
//!   error is returned unchanged;
//! - a write returns the value produced by the store, never a cached copy.

pub mod director;
pub mod film;
pub mod review;

pub use director::{CachedDirectorService, DirectorService, StoreDirectorService};
pub use film::{CachedFilmService, FilmService, StoreFilmService};
pub use review::{CachedReviewService, ReviewService, StoreReviewService};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cinecache_core::{CacheConfig, CineError, CineResult};

use crate::cache::{
    BoundedCache, CacheKey, CacheShape, EntityCacheRegistry, InvalidationProtocol, Mutation,
};
use crate::store::StoreTrait;

/// Thread-safe request counter.
#[derive(Debug, Default)]
pub struct RequestCounter {
    count: AtomicU64,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request and return the new total.
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

/// Cache-aside lookup: return the cached value or load, populate and return.
pub(crate) fn cached_or_load<V, F>(
    cache: &BoundedCache<CacheKey, V>,
    shape: CacheShape,
    key: CacheKey,
    load: F,
) -> CineResult<V>
where
    V: Clone,
    F: FnOnce() -> CineResult<V>,
{
    if let Some(value) = cache.get(&key) {
        tracing::debug!(%shape, %key, "Cache hit");
        return Ok(value);
    }
    tracing::debug!(%shape, %key, "Cache miss");
    load_and_populate(cache, shape, key, load)
}

/// Load a value and cache it, unless an invalidation reached the cache while
/// the load was in flight. Errors are never cached.
pub(crate) fn load_and_populate<V, F>(
    cache: &BoundedCache<CacheKey, V>,
    shape: CacheShape,
    key: CacheKey,
    load: F,
) -> CineResult<V>
where
    V: Clone,
    F: FnOnce() -> CineResult<V>,
{
    let epoch = cache.epoch();
    let value = load()?;
    if !cache.put_if_unchanged(key.clone(), value.clone(), epoch) {
        tracing::debug!(%shape, %key, "Cache invalidated during load, not populating");
    }
    Ok(value)
}

/// Apply the invalidation plan for a finished write, or leave the caches alone
/// if the write failed.
pub(crate) fn commit<T, M>(
    caches: &EntityCacheRegistry,
    operation: &'static str,
    result: CineResult<T>,
    mutation: M,
) -> CineResult<T>
where
    M: FnOnce(&T) -> Mutation,
{
    match result {
        Ok(value) => {
            let mutation = mutation(&value);
            let plan = InvalidationProtocol::plan(&mutation);
            let affected = plan.apply(caches);
            tracing::debug!(
                operation,
                mutation = mutation.kind(),
                actions = plan.len(),
                affected,
                "Caches updated after write"
            );
            Ok(value)
        }
        Err(CineError::Store(error)) => {
            tracing::warn!(operation, %error, "Store write failed, caches left untouched");
            Err(CineError::Store(error))
        }
        Err(error) => Err(error),
    }
}

/// Fully wired services sharing one cache registry.
pub struct CineServices<S: StoreTrait> {
    pub films: CachedFilmService<StoreFilmService<S>>,
    pub directors: CachedDirectorService<StoreDirectorService<S>>,
    pub reviews: CachedReviewService<StoreReviewService<S>>,
    caches: Arc<EntityCacheRegistry>,
}

impl<S: StoreTrait> CineServices<S> {
    /// Build the registry from `config` and wrap each raw service over `store`.
    pub fn new(store: Arc<S>, config: &CacheConfig) -> CineResult<Self> {
        let caches = Arc::new(EntityCacheRegistry::new(config)?);
        Ok(Self {
            films: CachedFilmService::new(StoreFilmService::new(store.clone()), caches.clone()),
            directors: CachedDirectorService::new(
                StoreDirectorService::new(store.clone()),
                caches.clone(),
            ),
            reviews: CachedReviewService::new(StoreReviewService::new(store), caches.clone()),
            caches,
        })
    }

    pub fn caches(&self) -> &Arc<EntityCacheRegistry> {
        &self.caches
    }
}
