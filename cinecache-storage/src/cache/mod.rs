//! Bounded in-process caches kept consistent with the store.
//!
//! # Layers
//!
//! - [`BoundedCache`]: one LRU container behind its own mutex.
//! - [`EntityCacheRegistry`]: one `BoundedCache` per [`CacheShape`], built
//!   once from a [`CacheConfig`](cinecache_core::CacheConfig).
//! - [`InvalidationProtocol`]: maps a committed [`Mutation`] to the
//!   [`CacheAction`]s that keep every shape consistent with the store.
//!
//! # Locking
//!
//! Each cache operation takes exactly one cache lock. A mutation that affects
//! several caches visits them one after another in [`CacheShape`] declaration
//! order, so lock-order inversion cannot happen.
//!
//! # Example
//!
//! ```ignore
//! let caches = EntityCacheRegistry::new(&CacheConfig::default())?;
//! let film = store.film_insert(&new_film)?;
//! InvalidationProtocol::plan(&Mutation::FilmCreated(film)).apply(&caches);
//! ```

pub mod bounded;
pub mod invalidation;
pub mod key;
pub mod registry;

pub use bounded::{BoundedCache, CacheStats};
pub use invalidation::{
    CacheAction, DirectorCache, DirectorPatch, FilmRefPatch, FilmScope, InvalidationPlan,
    InvalidationProtocol, Mutation, ReviewPatch,
};
pub use key::{CacheKey, CacheShape};
pub use registry::{EntityCacheRegistry, FilmListCache, ShapeCache};
