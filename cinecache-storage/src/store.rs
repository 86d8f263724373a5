//! Durable store contract.
//!
//! The cache layer never implements persistence itself; it talks to a
//! synchronous collaborator through [`StoreTrait`]. Every method either
//! returns a value (or `None` for an absent id) or a store-level error,
//! which the caller surfaces unchanged.

use cinecache_core::{
    CineResult, Director, DirectorId, Film, FilmId, NewDirector, NewFilm, NewReview, Review,
    ReviewId,
};

/// Result of removing a director from a film.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetachOutcome {
    pub director_id: DirectorId,
    pub film_id: FilmId,
    /// The director no longer directed any film and its record was deleted.
    pub record_deleted: bool,
}

/// Storage trait for film library entities.
pub trait StoreTrait: Send + Sync {
    // === Film Operations ===

    /// Get a film with its directors and reviews.
    fn film_find_by_id(&self, id: FilmId) -> CineResult<Option<Film>>;

    fn film_exists(&self, id: FilmId) -> CineResult<bool>;

    /// All films whose title matches exactly.
    fn film_find_by_title(&self, title: &str) -> CineResult<Vec<Film>>;

    /// All films directed by a director with this exact name.
    fn film_find_by_director_name(&self, name: &str) -> CineResult<Vec<Film>>;

    /// All films with strictly more than `threshold` reviews.
    fn film_find_by_review_count_above(&self, threshold: u32) -> CineResult<Vec<Film>>;

    fn film_find_all(&self) -> CineResult<Vec<Film>>;

    /// Insert a film, re-using existing directors by name and creating its reviews.
    fn film_insert(&self, film: &NewFilm) -> CineResult<Film>;

    /// Persist the scalar fields of an existing film. Relations are left as stored.
    fn film_save(&self, film: &Film) -> CineResult<Film>;

    /// Delete a film, its reviews and its director associations.
    fn film_delete(&self, id: FilmId) -> CineResult<()>;

    // === Director Operations ===

    fn director_find_by_id(&self, id: DirectorId) -> CineResult<Option<Director>>;

    fn director_exists(&self, id: DirectorId) -> CineResult<bool>;

    fn director_find_by_name(&self, name: &str) -> CineResult<Option<Director>>;

    fn director_find_all(&self) -> CineResult<Vec<Director>>;

    /// Associate a director with a film, creating the director unless one
    /// with the same name already exists.
    fn director_attach(&self, film_id: FilmId, director: &NewDirector) -> CineResult<Director>;

    /// Overwrite a director's own fields.
    fn director_save(&self, id: DirectorId, director: &NewDirector) -> CineResult<Director>;

    /// Remove the association between a director and a film. The director
    /// record is deleted once no film references it.
    fn director_detach(&self, id: DirectorId, film_id: FilmId) -> CineResult<DetachOutcome>;

    /// Delete a director and all of its associations.
    ///
    /// Returns the films the director was removed from.
    fn director_delete(&self, id: DirectorId) -> CineResult<Vec<FilmId>>;

    // === Review Operations ===

    fn review_find_by_id(&self, id: ReviewId) -> CineResult<Option<Review>>;

    fn review_exists(&self, id: ReviewId) -> CineResult<bool>;

    fn review_find_by_film_id(&self, film_id: FilmId) -> CineResult<Vec<Review>>;

    fn review_find_all(&self) -> CineResult<Vec<Review>>;

    fn review_insert(&self, film_id: FilmId, review: &NewReview) -> CineResult<Review>;

    fn review_save(&self, id: ReviewId, review: &NewReview) -> CineResult<Review>;

    fn review_delete(&self, id: ReviewId) -> CineResult<()>;
}
