//! Fixed-capacity LRU container.
//!
//! `BoundedCache` wraps an [`lru::LruCache`] in a mutex. Each public method
//! takes the lock exactly once and never calls into another cache while
//! holding it.
//!
//! Reads (`get`) promote; inspection (`peek`, `contains`, `snapshot`) and
//! in-place patches (`patch`, `patch_all`) leave the recency order alone.
//!
//! Every invalidating operation (`remove`, `clear`, `patch`, `patch_all`,
//! `upsert_with`) advances the cache's epoch under the same lock, whether or
//! not the key was resident. A cache-aside populate records the epoch before
//! loading and stores through [`BoundedCache::put_if_unchanged`], so a value
//! loaded before a concurrent write's invalidation is never written back.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cinecache_core::{CineError, CineResult, ConfigError};
use lru::LruCache;

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of evictions due to capacity.
    pub evictions: u64,
    /// Number of entries currently in cache.
    pub entries: usize,
    /// Maximum number of resident entries.
    pub capacity: usize,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
    hits: u64,
    misses: u64,
    evictions: u64,
    epoch: u64,
}

impl<K: Hash + Eq, V> Inner<K, V> {
    fn push(&mut self, key: K, value: V) -> Option<(K, V)> {
        let overwrite = self.entries.contains(&key);
        let displaced = self.entries.push(key, value);
        if overwrite {
            return None;
        }
        if displaced.is_some() {
            self.evictions += 1;
        }
        displaced
    }
}

/// A key/value container holding at most `capacity` entries.
#[derive(Debug)]
pub struct BoundedCache<K: Hash + Eq, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: NonZeroUsize,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create an empty cache. A capacity of 0 is a configuration error.
    pub fn new(capacity: usize) -> CineResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            CineError::Config(ConfigError::InvalidValue {
                field: "capacity".to_string(),
                value: capacity.to_string(),
                reason: "capacity must be greater than 0".to_string(),
            })
        })?;
        Ok(Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
                epoch: 0,
            }),
            capacity,
        })
    }

    // Every operation is a single `lru` call or a scan with no early exit
    // part-way through a mutation, so a poisoned guard still holds a
    // consistent cache.
    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a key and promote it to most-recently-used.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        match inner.entries.get(key).cloned() {
            Some(value) => {
                inner.hits += 1;
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Look up a key without touching its recency or the hit counters.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.lock().entries.peek(key).cloned()
    }

    /// Insert or overwrite an entry, making it most-recently-used.
    ///
    /// Returns the entry evicted to stay within capacity, if any.
    pub fn put(&self, key: K, value: V) -> Option<(K, V)> {
        self.lock().push(key, value)
    }

    /// Number of invalidating operations applied so far.
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Insert like [`put`](Self::put), but only if no invalidation ran since
    /// `epoch` was read. Returns whether the value was stored.
    pub fn put_if_unchanged(&self, key: K, value: V, epoch: u64) -> bool {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return false;
        }
        inner.push(key, value);
        true
    }

    /// Replace an entry with a value computed from the current one.
    ///
    /// The closure sees the resident value (if any) and runs under the lock,
    /// so the read and the overwrite are a single atomic step.
    pub fn upsert_with<F>(&self, key: K, f: F) -> Option<(K, V)>
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let mut inner = self.lock();
        inner.epoch += 1;
        let value = f(inner.entries.peek(&key));
        inner.push(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.entries.pop(key)
    }

    /// Drop every entry. Returns how many were resident.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        inner.epoch += 1;
        let count = inner.entries.len();
        inner.entries.clear();
        count
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().entries.contains(key)
    }

    /// Mutate one entry in place without changing its recency rank.
    ///
    /// Returns `false` when the key is not resident.
    pub fn patch<F>(&self, key: &K, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let mut inner = self.lock();
        inner.epoch += 1;
        match inner.entries.peek_mut(key) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    /// Offer every resident entry to `f` for in-place mutation.
    ///
    /// `f` returns whether it changed the entry; the count of changed entries
    /// is returned. Recency order is untouched.
    pub fn patch_all<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut inner = self.lock();
        inner.epoch += 1;
        let mut patched = 0;
        for (key, value) in inner.entries.iter_mut() {
            if f(key, value) {
                patched += 1;
            }
        }
        patched
    }

    /// Copy of all entries, least-recently-used first.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        self.lock()
            .entries
            .iter()
            .rev()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Resident keys, least-recently-used first.
    pub fn keys(&self) -> Vec<K> {
        self.lock().entries.iter().rev().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            entries: inner.entries.len(),
            capacity: self.capacity.get(),
        }
    }
}
