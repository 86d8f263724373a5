//! In-memory store for tests and local runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cinecache_core::{
    CineError, CineResult, Director, DirectorId, DirectorSummary, EntityIdType, Film,
    FilmId, NewDirector, NewFilm, NewReview, Review, ReviewId, StoreError,
};

use crate::store::{DetachOutcome, StoreTrait};

#[derive(Debug, Clone)]
struct FilmRow {
    title: String,
    genre: String,
    release_year: i32,
    director_ids: Vec<DirectorId>,
}

#[derive(Debug, Clone)]
struct DirectorRow {
    name: String,
    nationality: String,
    birth_year: i32,
}

#[derive(Debug, Default)]
struct Tables {
    films: BTreeMap<FilmId, FilmRow>,
    directors: BTreeMap<DirectorId, DirectorRow>,
    reviews: BTreeMap<ReviewId, Review>,
    next_film: i64,
    next_director: i64,
    next_review: i64,
}

impl Tables {
    fn next_film_id(&mut self) -> FilmId {
        self.next_film += 1;
        FilmId::new(self.next_film)
    }

    fn next_director_id(&mut self) -> DirectorId {
        self.next_director += 1;
        DirectorId::new(self.next_director)
    }

    fn next_review_id(&mut self) -> ReviewId {
        self.next_review += 1;
        ReviewId::new(self.next_review)
    }

    fn summary(&self, id: DirectorId) -> Option<DirectorSummary> {
        self.directors.get(&id).map(|row| DirectorSummary {
            id,
            name: row.name.clone(),
            nationality: row.nationality.clone(),
            birth_year: row.birth_year,
        })
    }

    fn film(&self, id: FilmId) -> Option<Film> {
        let row = self.films.get(&id)?;
        Some(Film {
            id,
            title: row.title.clone(),
            genre: row.genre.clone(),
            release_year: row.release_year,
            directors: row
                .director_ids
                .iter()
                .filter_map(|d| self.summary(*d))
                .collect(),
            reviews: self
                .reviews
                .values()
                .filter(|r| r.film_id == id)
                .cloned()
                .collect(),
        })
    }

    fn films_where(&self, pred: impl Fn(&Film) -> bool) -> Vec<Film> {
        self.films
            .keys()
            .filter_map(|id| self.film(*id))
            .filter(|f| pred(f))
            .collect()
    }

    fn director(&self, id: DirectorId) -> Option<Director> {
        let row = self.directors.get(&id)?;
        Some(Director {
            id,
            name: row.name.clone(),
            nationality: row.nationality.clone(),
            birth_year: row.birth_year,
            film_ids: self
                .films
                .iter()
                .filter(|(_, f)| f.director_ids.contains(&id))
                .map(|(film_id, _)| *film_id)
                .collect(),
        })
    }

    fn director_id_by_name(&self, name: &str) -> Option<DirectorId> {
        self.directors
            .iter()
            .find(|(_, row)| row.name == name)
            .map(|(id, _)| *id)
    }

    /// Existing director with this name, or a freshly inserted one.
    fn resolve_director(&mut self, director: &NewDirector) -> DirectorId {
        if let Some(id) = self.director_id_by_name(&director.name) {
            return id;
        }
        let id = self.next_director_id();
        self.directors.insert(
            id,
            DirectorRow {
                name: director.name.clone(),
                nationality: director.nationality.clone(),
                birth_year: director.birth_year,
            },
        );
        id
    }

    fn is_referenced(&self, id: DirectorId) -> bool {
        self.films.values().any(|f| f.director_ids.contains(&id))
    }
}

/// In-memory implementation of [`StoreTrait`].
///
/// All tables sit behind one lock so a write is applied completely or not at
/// all. A write failure can be injected with [`InMemoryStore::fail_writes_with`];
/// while set, every write returns that error without touching the tables.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    write_failure: Mutex<Option<StoreError>>,
    reads: AtomicU64,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with `error`.
    pub fn fail_writes_with(&self, error: StoreError) {
        if let Ok(mut slot) = self.write_failure.lock() {
            *slot = Some(error);
        }
    }

    /// Stop injecting write failures.
    pub fn clear_failure(&self) {
        if let Ok(mut slot) = self.write_failure.lock() {
            *slot = None;
        }
    }

    /// Number of read calls served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn film_count(&self) -> usize {
        self.tables.read().map(|t| t.films.len()).unwrap_or_default()
    }

    pub fn director_count(&self) -> usize {
        self.tables.read().map(|t| t.directors.len()).unwrap_or_default()
    }

    pub fn review_count(&self) -> usize {
        self.tables.read().map(|t| t.reviews.len()).unwrap_or_default()
    }

    fn read(&self) -> CineResult<RwLockReadGuard<'_, Tables>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.tables
            .read()
            .map_err(|_| CineError::Store(StoreError::LockPoisoned))
    }

    fn write(&self) -> CineResult<RwLockWriteGuard<'_, Tables>> {
        let injected = self
            .write_failure
            .lock()
            .map_err(|_| CineError::Store(StoreError::LockPoisoned))?
            .clone();
        if let Some(error) = injected {
            return Err(CineError::Store(error));
        }
        self.tables
            .write()
            .map_err(|_| CineError::Store(StoreError::LockPoisoned))
    }
}

fn not_found<I: EntityIdType>(id: I) -> CineError {
    CineError::not_found(I::ENTITY_TYPE, id.as_i64())
}

impl StoreTrait for InMemoryStore {
    // === Film Operations ===

    fn film_find_by_id(&self, id: FilmId) -> CineResult<Option<Film>> {
        Ok(self.read()?.film(id))
    }

    fn film_exists(&self, id: FilmId) -> CineResult<bool> {
        Ok(self.read()?.films.contains_key(&id))
    }

    fn film_find_by_title(&self, title: &str) -> CineResult<Vec<Film>> {
        Ok(self.read()?.films_where(|f| f.title == title))
    }

    fn film_find_by_director_name(&self, name: &str) -> CineResult<Vec<Film>> {
        Ok(self
            .read()?
            .films_where(|f| f.directors.iter().any(|d| d.name == name)))
    }

    fn film_find_by_review_count_above(&self, threshold: u32) -> CineResult<Vec<Film>> {
        let threshold = threshold as usize;
        Ok(self.read()?.films_where(|f| f.review_count() > threshold))
    }

    fn film_find_all(&self) -> CineResult<Vec<Film>> {
        Ok(self.read()?.films_where(|_| true))
    }

    fn film_insert(&self, film: &NewFilm) -> CineResult<Film> {
        let mut tables = self.write()?;
        let mut director_ids = Vec::with_capacity(film.directors.len());
        for director in &film.directors {
            let id = tables.resolve_director(director);
            if !director_ids.contains(&id) {
                director_ids.push(id);
            }
        }
        let id = tables.next_film_id();
        tables.films.insert(
            id,
            FilmRow {
                title: film.title.clone(),
                genre: film.genre.clone(),
                release_year: film.release_year,
                director_ids,
            },
        );
        for review in &film.reviews {
            let review_id = tables.next_review_id();
            tables.reviews.insert(
                review_id,
                Review {
                    id: review_id,
                    film_id: id,
                    message: review.message.clone(),
                    rating: review.rating,
                },
            );
        }
        tables.film(id).ok_or_else(|| not_found(id))
    }

    fn film_save(&self, film: &Film) -> CineResult<Film> {
        let mut tables = self.write()?;
        let row = tables.films.get_mut(&film.id).ok_or_else(|| not_found(film.id))?;
        row.title = film.title.clone();
        row.genre = film.genre.clone();
        row.release_year = film.release_year;
        tables.film(film.id).ok_or_else(|| not_found(film.id))
    }

    fn film_delete(&self, id: FilmId) -> CineResult<()> {
        let mut tables = self.write()?;
        if tables.films.remove(&id).is_none() {
            return Err(not_found(id));
        }
        tables.reviews.retain(|_, r| r.film_id != id);
        Ok(())
    }

    // === Director Operations ===

    fn director_find_by_id(&self, id: DirectorId) -> CineResult<Option<Director>> {
        Ok(self.read()?.director(id))
    }

    fn director_exists(&self, id: DirectorId) -> CineResult<bool> {
        Ok(self.read()?.directors.contains_key(&id))
    }

    fn director_find_by_name(&self, name: &str) -> CineResult<Option<Director>> {
        let tables = self.read()?;
        Ok(tables
            .director_id_by_name(name)
            .and_then(|id| tables.director(id)))
    }

    fn director_find_all(&self) -> CineResult<Vec<Director>> {
        let tables = self.read()?;
        Ok(tables
            .directors
            .keys()
            .filter_map(|id| tables.director(*id))
            .collect())
    }

    fn director_attach(&self, film_id: FilmId, director: &NewDirector) -> CineResult<Director> {
        let mut tables = self.write()?;
        if !tables.films.contains_key(&film_id) {
            return Err(not_found(film_id));
        }
        let id = tables.resolve_director(director);
        if let Some(row) = tables.films.get_mut(&film_id) {
            if !row.director_ids.contains(&id) {
                row.director_ids.push(id);
            }
        }
        tables.director(id).ok_or_else(|| not_found(id))
    }

    fn director_save(&self, id: DirectorId, director: &NewDirector) -> CineResult<Director> {
        let mut tables = self.write()?;
        let row = tables.directors.get_mut(&id).ok_or_else(|| not_found(id))?;
        row.name = director.name.clone();
        row.nationality = director.nationality.clone();
        row.birth_year = director.birth_year;
        tables.director(id).ok_or_else(|| not_found(id))
    }

    fn director_detach(&self, id: DirectorId, film_id: FilmId) -> CineResult<DetachOutcome> {
        let mut tables = self.write()?;
        if !tables.directors.contains_key(&id) {
            return Err(not_found(id));
        }
        let row = tables.films.get_mut(&film_id).ok_or_else(|| not_found(film_id))?;
        let before = row.director_ids.len();
        row.director_ids.retain(|d| *d != id);
        if row.director_ids.len() == before {
            // Not associated with this film.
            return Err(not_found(id));
        }
        let record_deleted = !tables.is_referenced(id);
        if record_deleted {
            tables.directors.remove(&id);
        }
        Ok(DetachOutcome {
            director_id: id,
            film_id,
            record_deleted,
        })
    }

    fn director_delete(&self, id: DirectorId) -> CineResult<Vec<FilmId>> {
        let mut tables = self.write()?;
        if tables.directors.remove(&id).is_none() {
            return Err(not_found(id));
        }
        let mut detached = Vec::new();
        for (film_id, row) in tables.films.iter_mut() {
            let before = row.director_ids.len();
            row.director_ids.retain(|d| *d != id);
            if row.director_ids.len() != before {
                detached.push(*film_id);
            }
        }
        Ok(detached)
    }

    // === Review Operations ===

    fn review_find_by_id(&self, id: ReviewId) -> CineResult<Option<Review>> {
        Ok(self.read()?.reviews.get(&id).cloned())
    }

    fn review_exists(&self, id: ReviewId) -> CineResult<bool> {
        Ok(self.read()?.reviews.contains_key(&id))
    }

    fn review_find_by_film_id(&self, film_id: FilmId) -> CineResult<Vec<Review>> {
        Ok(self
            .read()?
            .reviews
            .values()
            .filter(|r| r.film_id == film_id)
            .cloned()
            .collect())
    }

    fn review_find_all(&self) -> CineResult<Vec<Review>> {
        Ok(self.read()?.reviews.values().cloned().collect())
    }

    fn review_insert(&self, film_id: FilmId, review: &NewReview) -> CineResult<Review> {
        let mut tables = self.write()?;
        if !tables.films.contains_key(&film_id) {
            return Err(not_found(film_id));
        }
        let id = tables.next_review_id();
        let review = Review {
            id,
            film_id,
            message: review.message.clone(),
            rating: review.rating,
        };
        tables.reviews.insert(id, review.clone());
        Ok(review)
    }

    fn review_save(&self, id: ReviewId, review: &NewReview) -> CineResult<Review> {
        let mut tables = self.write()?;
        let stored = tables.reviews.get_mut(&id).ok_or_else(|| not_found(id))?;
        stored.message = review.message.clone();
        stored.rating = review.rating;
        Ok(stored.clone())
    }

    fn review_delete(&self, id: ReviewId) -> CineResult<()> {
        let mut tables = self.write()?;
        tables
            .reviews
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }
}
