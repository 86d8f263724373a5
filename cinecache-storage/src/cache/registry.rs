//! One bounded cache per query shape.
//!
//! The registry is built once at startup from a [`CacheConfig`] and shared by
//! reference (usually behind an `Arc`) with every service. There is no global
//! lookup; a process that wants caching constructs a registry and passes it on.

use cinecache_core::{CacheConfig, CineResult, Director, Film, Review};

use super::bounded::{BoundedCache, CacheStats};
use super::key::{CacheKey, CacheShape};

/// Shape-independent view of a cache, for operators and bulk invalidation.
pub trait ShapeCache: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    fn contains(&self, key: &CacheKey) -> bool;

    /// Remove one key. Returns whether it was resident.
    fn remove(&self, key: &CacheKey) -> bool;

    /// Drop every entry. Returns how many were resident.
    fn clear(&self) -> usize;

    fn stats(&self) -> CacheStats;
}

impl<V> ShapeCache for BoundedCache<CacheKey, V>
where
    V: Clone + Send,
{
    fn len(&self) -> usize {
        BoundedCache::len(self)
    }

    fn capacity(&self) -> usize {
        BoundedCache::capacity(self)
    }

    fn contains(&self, key: &CacheKey) -> bool {
        BoundedCache::contains(self, key)
    }

    fn remove(&self, key: &CacheKey) -> bool {
        BoundedCache::remove(self, key).is_some()
    }

    fn clear(&self) -> usize {
        BoundedCache::clear(self)
    }

    fn stats(&self) -> CacheStats {
        BoundedCache::stats(self)
    }
}

/// Film result-set cache (all / by-title / by-director / by-review-count).
pub type FilmListCache = BoundedCache<CacheKey, Vec<Film>>;

/// The caches of every query shape.
#[derive(Debug)]
pub struct EntityCacheRegistry {
    film_by_id: BoundedCache<CacheKey, Film>,
    films_all: FilmListCache,
    films_by_title: FilmListCache,
    films_by_director: FilmListCache,
    films_by_review_count: FilmListCache,
    director_by_id: BoundedCache<CacheKey, Director>,
    directors_all: BoundedCache<CacheKey, Vec<Director>>,
    reviews_by_film: BoundedCache<CacheKey, Vec<Review>>,
}

impl EntityCacheRegistry {
    /// Build every cache with its configured capacity.
    pub fn new(config: &CacheConfig) -> CineResult<Self> {
        config.validate()?;
        let registry = Self {
            film_by_id: BoundedCache::new(config.film_by_id)?,
            films_all: BoundedCache::new(config.films_all)?,
            films_by_title: BoundedCache::new(config.films_by_title)?,
            films_by_director: BoundedCache::new(config.films_by_director)?,
            films_by_review_count: BoundedCache::new(config.films_by_review_count)?,
            director_by_id: BoundedCache::new(config.director_by_id)?,
            directors_all: BoundedCache::new(config.directors_all)?,
            reviews_by_film: BoundedCache::new(config.reviews_by_film)?,
        };
        tracing::info!(
            film_by_id = config.film_by_id,
            director_by_id = config.director_by_id,
            reviews_by_film = config.reviews_by_film,
            "Entity cache registry initialized"
        );
        Ok(registry)
    }

    /// Registry with the default capacities.
    pub fn with_defaults() -> CineResult<Self> {
        Self::new(&CacheConfig::default())
    }

    pub fn film_by_id(&self) -> &BoundedCache<CacheKey, Film> {
        &self.film_by_id
    }

    pub fn films_all(&self) -> &FilmListCache {
        &self.films_all
    }

    pub fn films_by_title(&self) -> &FilmListCache {
        &self.films_by_title
    }

    pub fn films_by_director(&self) -> &FilmListCache {
        &self.films_by_director
    }

    pub fn films_by_review_count(&self) -> &FilmListCache {
        &self.films_by_review_count
    }

    pub fn director_by_id(&self) -> &BoundedCache<CacheKey, Director> {
        &self.director_by_id
    }

    pub fn directors_all(&self) -> &BoundedCache<CacheKey, Vec<Director>> {
        &self.directors_all
    }

    pub fn reviews_by_film(&self) -> &BoundedCache<CacheKey, Vec<Review>> {
        &self.reviews_by_film
    }

    /// Look up a cache by shape.
    pub fn cache(&self, shape: CacheShape) -> &dyn ShapeCache {
        match shape {
            CacheShape::FilmById => &self.film_by_id,
            CacheShape::FilmsAll => &self.films_all,
            CacheShape::FilmsByTitle => &self.films_by_title,
            CacheShape::FilmsByDirector => &self.films_by_director,
            CacheShape::FilmsByReviewCount => &self.films_by_review_count,
            CacheShape::DirectorById => &self.director_by_id,
            CacheShape::DirectorsAll => &self.directors_all,
            CacheShape::ReviewsByFilm => &self.reviews_by_film,
        }
    }

    /// Empty every cache, in lock order. Returns the number of dropped entries.
    pub fn clear_all(&self) -> usize {
        CacheShape::ALL
            .iter()
            .map(|shape| self.cache(*shape).clear())
            .sum()
    }

    /// Per-shape statistics, in lock order.
    pub fn stats(&self) -> Vec<(CacheShape, CacheStats)> {
        CacheShape::ALL
            .iter()
            .map(|shape| (*shape, self.cache(*shape).stats()))
            .collect()
    }
}
