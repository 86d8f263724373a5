//! Film library entities.
//!
//! A film embeds snapshots of its directors and reviews. A director only
//! carries the ids of its films, which keeps the Film <-> Director relation
//! acyclic so every cached value is an owned tree.

use crate::{DirectorId, FilmId, ReviewId};
use serde::{Deserialize, Serialize};

/// Entity type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Film,
    Director,
    Review,
}

/// A film together with its related directors and reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    pub id: FilmId,
    pub title: String,
    pub genre: String,
    pub release_year: i32,
    pub directors: Vec<DirectorSummary>,
    pub reviews: Vec<Review>,
}

impl Film {
    /// Ids of the directors embedded in this film.
    pub fn director_ids(&self) -> Vec<DirectorId> {
        self.directors.iter().map(|d| d.id).collect()
    }

    /// Whether the film lists the given director.
    pub fn has_director(&self, director_id: DirectorId) -> bool {
        self.directors.iter().any(|d| d.id == director_id)
    }

    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }

    /// Keep this film's scalar fields but take directors and reviews from `prior`.
    pub fn with_relations_from(mut self, prior: &Film) -> Film {
        self.directors = prior.directors.clone();
        self.reviews = prior.reviews.clone();
        self
    }
}

/// Director data as embedded inside a film.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorSummary {
    pub id: DirectorId,
    pub name: String,
    pub nationality: String,
    pub birth_year: i32,
}

/// A director and the ids of the films they are associated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Director {
    pub id: DirectorId,
    pub name: String,
    pub nationality: String,
    pub birth_year: i32,
    pub film_ids: Vec<FilmId>,
}

impl Director {
    /// The form of this director embedded in films.
    pub fn summary(&self) -> DirectorSummary {
        DirectorSummary {
            id: self.id,
            name: self.name.clone(),
            nationality: self.nationality.clone(),
            birth_year: self.birth_year,
        }
    }

    pub fn directs(&self, film_id: FilmId) -> bool {
        self.film_ids.contains(&film_id)
    }
}

/// A review of a single film.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub film_id: FilmId,
    pub message: String,
    pub rating: i32,
}

// ============================================================================
// WRITE INPUTS
// ============================================================================

/// Payload for creating a film.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFilm {
    pub title: String,
    pub genre: String,
    pub release_year: i32,
    pub directors: Vec<NewDirector>,
    #[serde(default)]
    pub reviews: Vec<NewReview>,
}

/// Payload for updating the scalar fields of a film.
///
/// Relations are never replaced through an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmUpdate {
    pub title: String,
    pub genre: String,
    pub release_year: i32,
}

/// Payload for creating or updating a director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDirector {
    pub name: String,
    pub nationality: String,
    pub birth_year: i32,
}

/// Payload for creating or updating a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub message: String,
    pub rating: i32,
}
