//! Cinecache Core - Entity Types
//!
//! Pure data structures shared by the storage and cache crates: identifiers,
//! the film/director/review model, input validation, errors and cache
//! configuration. No caching or storage behaviour lives here.

pub mod config;
pub mod entities;
pub mod error;
pub mod identity;
pub mod validation;

pub use config::CacheConfig;
pub use entities::{
    Director, DirectorSummary, EntityType, Film, FilmUpdate, NewDirector, NewFilm, NewReview,
    Review,
};
pub use error::{CineError, CineResult, ConfigError, StoreError, ValidationError};
pub use identity::{validate_id, DirectorId, EntityIdType, FilmId, ReviewId};
