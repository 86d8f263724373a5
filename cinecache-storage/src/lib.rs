//! Cinecache Storage - Store Contract, Caches and Services
//!
//! Defines the store abstraction, an in-memory store, the bounded entity
//! caches with their invalidation rules, and the per-entity services that
//! keep the two consistent.

pub mod cache;
pub mod memory;
pub mod service;
pub mod store;

pub use cache::{
    BoundedCache, CacheAction, CacheKey, CacheShape, CacheStats, EntityCacheRegistry,
    InvalidationPlan, InvalidationProtocol, Mutation, ShapeCache,
};
pub use memory::InMemoryStore;
pub use service::{
    CachedDirectorService, CachedFilmService, CachedReviewService, CineServices, DirectorService,
    FilmService, RequestCounter, ReviewService, StoreDirectorService, StoreFilmService,
    StoreReviewService,
};
pub use store::{DetachOutcome, StoreTrait};
