//! Identity types for cinecache entities

use crate::{EntityType, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Common behaviour of the numeric entity identifiers.
pub trait EntityIdType: Copy + Eq + std::hash::Hash + fmt::Display {
    /// Entity kind this identifier refers to.
    const ENTITY_TYPE: EntityType;

    /// Wrap a raw store identifier.
    fn new(raw: i64) -> Self;

    /// The raw store identifier.
    fn as_i64(&self) -> i64;
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $entity:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl EntityIdType for $name {
            const ENTITY_TYPE: EntityType = $entity;

            fn new(raw: i64) -> Self {
                Self(raw)
            }

            fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

entity_id!(
    /// Store-assigned identifier of a film.
    FilmId,
    EntityType::Film
);
entity_id!(
    /// Store-assigned identifier of a director.
    DirectorId,
    EntityType::Director
);
entity_id!(
    /// Store-assigned identifier of a review.
    ReviewId,
    EntityType::Review
);

/// Reject identifiers the store can never have assigned.
///
/// Store sequences start at 1, so anything `<= 0` is a caller error and is
/// reported before a cache or the store is consulted.
pub fn validate_id<I: EntityIdType>(id: I) -> Result<I, ValidationError> {
    if id.as_i64() <= 0 {
        return Err(ValidationError::InvalidValue {
            field: format!("{:?} id", I::ENTITY_TYPE).to_lowercase(),
            reason: format!("must be positive, got {}", id),
        });
    }
    Ok(id)
}
