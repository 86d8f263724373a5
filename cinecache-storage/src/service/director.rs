//! Director service.

use std::sync::Arc;

use cinecache_core::validation::validate_new_director;
use cinecache_core::{
    validate_id, CineError, CineResult, Director, DirectorId, EntityIdType, FilmId, NewDirector,
};

use super::{cached_or_load, commit, load_and_populate};
use crate::cache::{CacheKey, CacheShape, EntityCacheRegistry, Mutation};
use crate::store::{DetachOutcome, StoreTrait};

/// Director operations exposed to callers.
pub trait DirectorService: Send + Sync {
    fn get(&self, id: DirectorId) -> CineResult<Director>;

    /// A director of a specific film.
    ///
    /// `NotFound` when the film is missing or the director is not one of its
    /// directors.
    fn get_for_film(&self, id: DirectorId, film_id: FilmId) -> CineResult<Director>;

    fn find_all(&self) -> CineResult<Vec<Director>>;

    /// Attach a director to a film, re-using an existing director with the
    /// same name.
    fn create(&self, film_id: FilmId, director: &NewDirector) -> CineResult<Director>;

    fn update(&self, id: DirectorId, director: &NewDirector) -> CineResult<Director>;

    /// Remove a director from one film.
    fn detach(&self, id: DirectorId, film_id: FilmId) -> CineResult<DetachOutcome>;

    /// Delete a director everywhere. Returns the films it was removed from.
    fn delete(&self, id: DirectorId) -> CineResult<Vec<FilmId>>;
}

/// Director service backed directly by the store.
#[derive(Debug)]
pub struct StoreDirectorService<S> {
    store: Arc<S>,
}

impl<S: StoreTrait> StoreDirectorService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: StoreTrait> DirectorService for StoreDirectorService<S> {
    fn get(&self, id: DirectorId) -> CineResult<Director> {
        let id = validate_id(id)?;
        self.store
            .director_find_by_id(id)?
            .ok_or_else(|| CineError::not_found(DirectorId::ENTITY_TYPE, id.as_i64()))
    }

    fn get_for_film(&self, id: DirectorId, film_id: FilmId) -> CineResult<Director> {
        let id = validate_id(id)?;
        let film_id = validate_id(film_id)?;
        if !self.store.film_exists(film_id)? {
            return Err(CineError::not_found(FilmId::ENTITY_TYPE, film_id.as_i64()));
        }
        let director = self.get(id)?;
        if !director.directs(film_id) {
            return Err(CineError::not_found(DirectorId::ENTITY_TYPE, id.as_i64()));
        }
        Ok(director)
    }

    fn find_all(&self) -> CineResult<Vec<Director>> {
        self.store.director_find_all()
    }

    fn create(&self, film_id: FilmId, director: &NewDirector) -> CineResult<Director> {
        let film_id = validate_id(film_id)?;
        validate_new_director(director)?;
        self.store.director_attach(film_id, director)
    }

    fn update(&self, id: DirectorId, director: &NewDirector) -> CineResult<Director> {
        let id = validate_id(id)?;
        validate_new_director(director)?;
        self.store.director_save(id, director)
    }

    fn detach(&self, id: DirectorId, film_id: FilmId) -> CineResult<DetachOutcome> {
        let id = validate_id(id)?;
        let film_id = validate_id(film_id)?;
        self.store.director_detach(id, film_id)
    }

    fn delete(&self, id: DirectorId) -> CineResult<Vec<FilmId>> {
        let id = validate_id(id)?;
        self.store.director_delete(id)
    }
}

/// Cache-aside decorator over any [`DirectorService`].
pub struct CachedDirectorService<D> {
    inner: D,
    caches: Arc<EntityCacheRegistry>,
}

impl<D: DirectorService> CachedDirectorService<D> {
    pub fn new(inner: D, caches: Arc<EntityCacheRegistry>) -> Self {
        Self { inner, caches }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: DirectorService> DirectorService for CachedDirectorService<D> {
    fn get(&self, id: DirectorId) -> CineResult<Director> {
        let id = validate_id(id)?;
        cached_or_load(
            self.caches.director_by_id(),
            CacheShape::DirectorById,
            CacheKey::id(id),
            || self.inner.get(id),
        )
    }

    fn get_for_film(&self, id: DirectorId, film_id: FilmId) -> CineResult<Director> {
        let id = validate_id(id)?;
        let film_id = validate_id(film_id)?;
        let key = CacheKey::id(id);
        if let Some(director) = self.caches.director_by_id().get(&key) {
            if director.directs(film_id) {
                tracing::debug!(shape = %CacheShape::DirectorById, %key, "Cache hit");
                return Ok(director);
            }
        }
        // The inner service reports which of the two is missing; a director it
        // does return is the same value a by-id read would cache.
        load_and_populate(
            self.caches.director_by_id(),
            CacheShape::DirectorById,
            key,
            || self.inner.get_for_film(id, film_id),
        )
    }

    fn find_all(&self) -> CineResult<Vec<Director>> {
        cached_or_load(
            self.caches.directors_all(),
            CacheShape::DirectorsAll,
            CacheKey::all(),
            || self.inner.find_all(),
        )
    }

    fn create(&self, film_id: FilmId, director: &NewDirector) -> CineResult<Director> {
        let film_id = validate_id(film_id)?;
        validate_new_director(director)?;
        commit(
            &self.caches,
            "director_create",
            self.inner.create(film_id, director),
            |created| Mutation::DirectorCreated {
                director: created.clone(),
                film_id,
            },
        )
    }

    fn update(&self, id: DirectorId, director: &NewDirector) -> CineResult<Director> {
        let id = validate_id(id)?;
        validate_new_director(director)?;
        commit(
            &self.caches,
            "director_update",
            self.inner.update(id, director),
            |saved| Mutation::DirectorUpdated(saved.clone()),
        )
    }

    fn detach(&self, id: DirectorId, film_id: FilmId) -> CineResult<DetachOutcome> {
        let id = validate_id(id)?;
        let film_id = validate_id(film_id)?;
        commit(
            &self.caches,
            "director_detach",
            self.inner.detach(id, film_id),
            |outcome| Mutation::DirectorDetached {
                director_id: outcome.director_id,
                film_id: outcome.film_id,
                record_deleted: outcome.record_deleted,
            },
        )
    }

    fn delete(&self, id: DirectorId) -> CineResult<Vec<FilmId>> {
        let id = validate_id(id)?;
        commit(
            &self.caches,
            "director_delete",
            self.inner.delete(id),
            |film_ids| Mutation::DirectorDeleted {
                director_id: id,
                film_ids: film_ids.clone(),
            },
        )
    }
}
