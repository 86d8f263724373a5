//! Input validation for film library writes and lookups.
//!
//! Every check here runs before a cache or the store is touched.

use crate::{FilmUpdate, NewDirector, NewFilm, NewReview, ValidationError};

pub const FILM_TITLE_MAX: usize = 100;
pub const FILM_GENRE_MAX: usize = 50;
pub const FILM_RELEASE_YEAR: (i64, i64) = (1895, 2026);
pub const DIRECTOR_NAME_MAX: usize = 40;
pub const DIRECTOR_NATIONALITY_MAX: usize = 30;
pub const DIRECTOR_BIRTH_YEAR: (i64, i64) = (1925, 2025);
pub const REVIEW_MESSAGE_MAX: usize = 100;
pub const REVIEW_RATING: (i64, i64) = (1, 10);

/// Require a non-blank string of at most `max` characters.
pub fn require_text(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("must be at most {} characters, got {}", max, len),
        });
    }
    Ok(())
}

/// Require a non-blank lookup term such as a title or director name.
pub fn require_term(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: "must not be blank".to_string(),
        });
    }
    Ok(())
}

fn require_range(field: &str, value: i64, (min, max): (i64, i64)) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

pub fn validate_new_film(film: &NewFilm) -> Result<(), ValidationError> {
    require_text("title", &film.title, FILM_TITLE_MAX)?;
    require_text("genre", &film.genre, FILM_GENRE_MAX)?;
    require_range("release_year", film.release_year.into(), FILM_RELEASE_YEAR)?;
    if film.directors.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "directors".to_string(),
        });
    }
    for director in &film.directors {
        validate_new_director(director)?;
    }
    for review in &film.reviews {
        validate_new_review(review)?;
    }
    Ok(())
}

pub fn validate_film_update(update: &FilmUpdate) -> Result<(), ValidationError> {
    require_text("title", &update.title, FILM_TITLE_MAX)?;
    require_text("genre", &update.genre, FILM_GENRE_MAX)?;
    require_range("release_year", update.release_year.into(), FILM_RELEASE_YEAR)
}

pub fn validate_new_director(director: &NewDirector) -> Result<(), ValidationError> {
    require_text("name", &director.name, DIRECTOR_NAME_MAX)?;
    require_text("nationality", &director.nationality, DIRECTOR_NATIONALITY_MAX)?;
    require_range("birth_year", director.birth_year.into(), DIRECTOR_BIRTH_YEAR)
}

pub fn validate_new_review(review: &NewReview) -> Result<(), ValidationError> {
    require_text("message", &review.message, REVIEW_MESSAGE_MAX)?;
    require_range("rating", review.rating.into(), REVIEW_RATING)
}
