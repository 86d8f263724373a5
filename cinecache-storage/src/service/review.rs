//! Review service.

use std::sync::Arc;

use cinecache_core::validation::validate_new_review;
use cinecache_core::{
    validate_id, CineError, CineResult, EntityIdType, FilmId, NewReview, Review, ReviewId,
};

use super::{cached_or_load, commit};
use crate::cache::{CacheKey, CacheShape, EntityCacheRegistry, Mutation};
use crate::store::StoreTrait;

/// Review operations exposed to callers.
pub trait ReviewService: Send + Sync {
    fn get(&self, id: ReviewId) -> CineResult<Review>;

    fn find_all(&self) -> CineResult<Vec<Review>>;

    /// Reviews of one film. `NotFound` if the film does not exist.
    fn list_for_film(&self, film_id: FilmId) -> CineResult<Vec<Review>>;

    fn create(&self, film_id: FilmId, review: &NewReview) -> CineResult<Review>;

    /// `NotFound` if the review does not belong to `film_id`.
    fn update(&self, film_id: FilmId, review_id: ReviewId, review: &NewReview)
        -> CineResult<Review>;

    /// `NotFound` if the review does not belong to `film_id`.
    fn delete(&self, film_id: FilmId, review_id: ReviewId) -> CineResult<()>;
}

/// Review service backed directly by the store.
#[derive(Debug)]
pub struct StoreReviewService<S> {
    store: Arc<S>,
}

impl<S: StoreTrait> StoreReviewService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn owned_by(&self, film_id: FilmId, review_id: ReviewId) -> CineResult<Review> {
        match self.store.review_find_by_id(review_id)? {
            Some(review) if review.film_id == film_id => Ok(review),
            _ => Err(CineError::not_found(ReviewId::ENTITY_TYPE, review_id.as_i64())),
        }
    }
}

impl<S: StoreTrait> ReviewService for StoreReviewService<S> {
    fn get(&self, id: ReviewId) -> CineResult<Review> {
        let id = validate_id(id)?;
        self.store
            .review_find_by_id(id)?
            .ok_or_else(|| CineError::not_found(ReviewId::ENTITY_TYPE, id.as_i64()))
    }

    fn find_all(&self) -> CineResult<Vec<Review>> {
        self.store.review_find_all()
    }

    fn list_for_film(&self, film_id: FilmId) -> CineResult<Vec<Review>> {
        let film_id = validate_id(film_id)?;
        if !self.store.film_exists(film_id)? {
            return Err(CineError::not_found(FilmId::ENTITY_TYPE, film_id.as_i64()));
        }
        self.store.review_find_by_film_id(film_id)
    }

    fn create(&self, film_id: FilmId, review: &NewReview) -> CineResult<Review> {
        let film_id = validate_id(film_id)?;
        validate_new_review(review)?;
        self.store.review_insert(film_id, review)
    }

    fn update(
        &self,
        film_id: FilmId,
        review_id: ReviewId,
        review: &NewReview,
    ) -> CineResult<Review> {
        let film_id = validate_id(film_id)?;
        let review_id = validate_id(review_id)?;
        validate_new_review(review)?;
        self.owned_by(film_id, review_id)?;
        self.store.review_save(review_id, review)
    }

    fn delete(&self, film_id: FilmId, review_id: ReviewId) -> CineResult<()> {
        let film_id = validate_id(film_id)?;
        let review_id = validate_id(review_id)?;
        self.owned_by(film_id, review_id)?;
        self.store.review_delete(review_id)
    }
}

/// Cache-aside decorator over any [`ReviewService`].
///
/// Only the per-film list is cached; single reviews and the full list go
/// straight to the inner service.
pub struct CachedReviewService<R> {
    inner: R,
    caches: Arc<EntityCacheRegistry>,
}

impl<R: ReviewService> CachedReviewService<R> {
    pub fn new(inner: R, caches: Arc<EntityCacheRegistry>) -> Self {
        Self { inner, caches }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: ReviewService> ReviewService for CachedReviewService<R> {
    fn get(&self, id: ReviewId) -> CineResult<Review> {
        self.inner.get(id)
    }

    fn find_all(&self) -> CineResult<Vec<Review>> {
        self.inner.find_all()
    }

    fn list_for_film(&self, film_id: FilmId) -> CineResult<Vec<Review>> {
        let film_id = validate_id(film_id)?;
        cached_or_load(
            self.caches.reviews_by_film(),
            CacheShape::ReviewsByFilm,
            CacheKey::id(film_id),
            || self.inner.list_for_film(film_id),
        )
    }

    fn create(&self, film_id: FilmId, review: &NewReview) -> CineResult<Review> {
        let film_id = validate_id(film_id)?;
        validate_new_review(review)?;
        commit(
            &self.caches,
            "review_create",
            self.inner.create(film_id, review),
            |created| Mutation::ReviewCreated(created.clone()),
        )
    }

    fn update(
        &self,
        film_id: FilmId,
        review_id: ReviewId,
        review: &NewReview,
    ) -> CineResult<Review> {
        let film_id = validate_id(film_id)?;
        let review_id = validate_id(review_id)?;
        validate_new_review(review)?;
        commit(
            &self.caches,
            "review_update",
            self.inner.update(film_id, review_id, review),
            |saved| Mutation::ReviewUpdated(saved.clone()),
        )
    }

    fn delete(&self, film_id: FilmId, review_id: ReviewId) -> CineResult<()> {
        let film_id = validate_id(film_id)?;
        let review_id = validate_id(review_id)?;
        commit(
            &self.caches,
            "review_delete",
            self.inner.delete(film_id, review_id),
            |_| Mutation::ReviewDeleted { film_id, review_id },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use cinecache_core::{NewDirector, NewFilm, StoreError, ValidationError};

    struct Fixture {
        store: Arc<InMemoryStore>,
        caches: Arc<EntityCacheRegistry>,
        reviews: CachedReviewService<StoreReviewService<InMemoryStore>>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let caches = Arc::new(EntityCacheRegistry::with_defaults().unwrap());
        Fixture {
            reviews: CachedReviewService::new(
                StoreReviewService::new(store.clone()),
                caches.clone(),
            ),
            store,
            caches,
        }
    }

    fn insert_film(store: &InMemoryStore, reviews: usize) -> FilmId {
        store
            .film_insert(&NewFilm {
                title: "Stalker".to_string(),
                genre: "Science Fiction".to_string(),
                release_year: 1979,
                directors: vec![NewDirector {
                    name: "Tarkovsky".to_string(),
                    nationality: "RU".to_string(),
                    birth_year: 1932,
                }],
                reviews: (0..reviews)
                    .map(|i| NewReview {
                        message: format!("zone {}", i),
                        rating: 9,
                    })
                    .collect(),
            })
            .unwrap()
            .id
    }

    fn new_review(message: &str, rating: i32) -> NewReview {
        NewReview {
            message: message.to_string(),
            rating,
        }
    }

    #[test]
    fn test_list_for_film_is_cached() {
        let fx = fixture();
        let film_id = insert_film(&fx.store, 2);

        assert_eq!(fx.reviews.list_for_film(film_id).unwrap().len(), 2);
        let reads = fx.store.read_count();
        assert_eq!(fx.reviews.list_for_film(film_id).unwrap().len(), 2);
        assert_eq!(fx.store.read_count(), reads);
    }

    #[test]
    fn test_list_for_missing_film() {
        let fx = fixture();
        let err = fx.reviews.list_for_film(FilmId::new(8)).unwrap_err();
        assert_eq!(err, CineError::not_found(FilmId::ENTITY_TYPE, 8));
        assert!(fx.caches.reviews_by_film().is_empty());
    }

    #[test]
    fn test_writes_patch_cached_list() {
        let fx = fixture();
        let film_id = insert_film(&fx.store, 1);
        fx.reviews.list_for_film(film_id).unwrap();

        let added = fx.reviews.create(film_id, &new_review("slow", 6)).unwrap();
        let updated = fx
            .reviews
            .update(film_id, added.id, &new_review("slow, then hypnotic", 8))
            .unwrap();
        let key = CacheKey::id(film_id);
        let cached = fx.caches.reviews_by_film().peek(&key).unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[1], updated);

        fx.reviews.delete(film_id, added.id).unwrap();
        let cached = fx.caches.reviews_by_film().peek(&key).unwrap();
        assert_eq!(cached, fx.store.review_find_by_film_id(film_id).unwrap());
    }

    #[test]
    fn test_review_of_other_film_is_not_found() {
        let fx = fixture();
        let first = insert_film(&fx.store, 1);
        let second = insert_film(&fx.store, 0);
        let review = fx.store.review_find_by_film_id(first).unwrap().remove(0);

        let err = fx
            .reviews
            .update(second, review.id, &new_review("wrong film", 5))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(fx.reviews.delete(second, review.id).unwrap_err().is_not_found());
        assert_eq!(fx.reviews.get(review.id).unwrap(), review);
    }

    #[test]
    fn test_invalid_rating_is_rejected_first() {
        let fx = fixture();
        fx.store.fail_writes_with(StoreError::Failure {
            operation: "review_insert".to_string(),
            reason: "unreachable".to_string(),
        });
        let err = fx
            .reviews
            .create(FilmId::new(1), &new_review("too good", 11))
            .unwrap_err();
        assert!(matches!(err, CineError::Validation(ValidationError::OutOfRange { .. })));
    }
}
