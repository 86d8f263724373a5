//! Film service.

use std::sync::Arc;

use cinecache_core::validation::{require_term, validate_film_update, validate_new_film};
use cinecache_core::{
    validate_id, CineError, CineResult, EntityIdType, Film, FilmId, FilmUpdate, NewFilm,
};

use super::{cached_or_load, commit, RequestCounter};
use crate::cache::{CacheKey, CacheShape, EntityCacheRegistry, Mutation};
use crate::store::StoreTrait;

/// Film operations exposed to callers.
pub trait FilmService: Send + Sync {
    /// A film with its directors and reviews. `NotFound` if absent.
    fn get(&self, id: FilmId) -> CineResult<Film>;

    fn find_all(&self) -> CineResult<Vec<Film>>;

    fn find_by_title(&self, title: &str) -> CineResult<Vec<Film>>;

    fn find_by_director_name(&self, name: &str) -> CineResult<Vec<Film>>;

    /// Films with strictly more than `threshold` reviews.
    fn find_by_review_count_above(&self, threshold: u32) -> CineResult<Vec<Film>>;

    fn create(&self, film: &NewFilm) -> CineResult<Film>;

    /// Create several films. Every payload is validated before the first
    /// insert; inserts then run in order and stop at the first store error.
    fn create_many(&self, films: &[NewFilm]) -> CineResult<Vec<Film>> {
        for film in films {
            validate_new_film(film)?;
        }
        films.iter().map(|film| self.create(film)).collect()
    }

    /// Replace the scalar fields of a film. Directors and reviews are kept.
    fn update(&self, id: FilmId, update: &FilmUpdate) -> CineResult<Film>;

    fn delete(&self, id: FilmId) -> CineResult<()>;
}

/// Film service backed directly by the store.
#[derive(Debug)]
pub struct StoreFilmService<S> {
    store: Arc<S>,
}

impl<S: StoreTrait> StoreFilmService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: StoreTrait> FilmService for StoreFilmService<S> {
    fn get(&self, id: FilmId) -> CineResult<Film> {
        let id = validate_id(id)?;
        self.store
            .film_find_by_id(id)?
            .ok_or_else(|| CineError::not_found(FilmId::ENTITY_TYPE, id.as_i64()))
    }

    fn find_all(&self) -> CineResult<Vec<Film>> {
        self.store.film_find_all()
    }

    fn find_by_title(&self, title: &str) -> CineResult<Vec<Film>> {
        require_term("title", title)?;
        self.store.film_find_by_title(title)
    }

    fn find_by_director_name(&self, name: &str) -> CineResult<Vec<Film>> {
        require_term("director name", name)?;
        self.store.film_find_by_director_name(name)
    }

    fn find_by_review_count_above(&self, threshold: u32) -> CineResult<Vec<Film>> {
        self.store.film_find_by_review_count_above(threshold)
    }

    fn create(&self, film: &NewFilm) -> CineResult<Film> {
        validate_new_film(film)?;
        self.store.film_insert(film)
    }

    fn update(&self, id: FilmId, update: &FilmUpdate) -> CineResult<Film> {
        let id = validate_id(id)?;
        validate_film_update(update)?;
        let mut film = self.get(id)?;
        film.title = update.title.clone();
        film.genre = update.genre.clone();
        film.release_year = update.release_year;
        self.store.film_save(&film)
    }

    fn delete(&self, id: FilmId) -> CineResult<()> {
        let id = validate_id(id)?;
        self.store.film_delete(id)
    }
}

/// Cache-aside decorator over any [`FilmService`].
pub struct CachedFilmService<F> {
    inner: F,
    caches: Arc<EntityCacheRegistry>,
    requests: RequestCounter,
}

impl<F: FilmService> CachedFilmService<F> {
    pub fn new(inner: F, caches: Arc<EntityCacheRegistry>) -> Self {
        Self {
            inner,
            caches,
            requests: RequestCounter::new(),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Number of `find_all` requests served, cached or not.
    pub fn request_counter(&self) -> &RequestCounter {
        &self.requests
    }
}

impl<F: FilmService> FilmService for CachedFilmService<F> {
    fn get(&self, id: FilmId) -> CineResult<Film> {
        let id = validate_id(id)?;
        cached_or_load(
            self.caches.film_by_id(),
            CacheShape::FilmById,
            CacheKey::id(id),
            || self.inner.get(id),
        )
    }

    fn find_all(&self) -> CineResult<Vec<Film>> {
        let total = self.requests.increment();
        tracing::debug!(total, "Film list requested");
        cached_or_load(
            self.caches.films_all(),
            CacheShape::FilmsAll,
            CacheKey::all(),
            || self.inner.find_all(),
        )
    }

    fn find_by_title(&self, title: &str) -> CineResult<Vec<Film>> {
        require_term("title", title)?;
        cached_or_load(
            self.caches.films_by_title(),
            CacheShape::FilmsByTitle,
            CacheKey::title(title),
            || self.inner.find_by_title(title),
        )
    }

    fn find_by_director_name(&self, name: &str) -> CineResult<Vec<Film>> {
        require_term("director name", name)?;
        cached_or_load(
            self.caches.films_by_director(),
            CacheShape::FilmsByDirector,
            CacheKey::director_name(name),
            || self.inner.find_by_director_name(name),
        )
    }

    fn find_by_review_count_above(&self, threshold: u32) -> CineResult<Vec<Film>> {
        cached_or_load(
            self.caches.films_by_review_count(),
            CacheShape::FilmsByReviewCount,
            CacheKey::review_count(threshold),
            || self.inner.find_by_review_count_above(threshold),
        )
    }

    fn create(&self, film: &NewFilm) -> CineResult<Film> {
        validate_new_film(film)?;
        commit(&self.caches, "film_create", self.inner.create(film), |created| {
            Mutation::FilmCreated(created.clone())
        })
    }

    fn update(&self, id: FilmId, update: &FilmUpdate) -> CineResult<Film> {
        let id = validate_id(id)?;
        validate_film_update(update)?;
        commit(&self.caches, "film_update", self.inner.update(id, update), |saved| {
            Mutation::FilmUpdated(saved.clone())
        })
    }

    fn delete(&self, id: FilmId) -> CineResult<()> {
        let id = validate_id(id)?;
        commit(&self.caches, "film_delete", self.inner.delete(id), |_| {
            Mutation::FilmDeleted(id)
        })
    }
}
