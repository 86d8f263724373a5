//! Query shapes and the keys cached under them.

use std::fmt;
use std::str::FromStr;

use cinecache_core::{CineError, ConfigError, EntityIdType};

/// A distinct kind of lookup, each with its own cache namespace.
///
/// Declaration order is the global lock order used when a single mutation
/// touches several caches: film-by-id, then the film aggregates, then the
/// director caches, then the review lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CacheShape {
    FilmById,
    FilmsAll,
    FilmsByTitle,
    FilmsByDirector,
    FilmsByReviewCount,
    DirectorById,
    DirectorsAll,
    ReviewsByFilm,
}

impl CacheShape {
    /// Every shape, in lock order.
    pub const ALL: [CacheShape; 8] = [
        CacheShape::FilmById,
        CacheShape::FilmsAll,
        CacheShape::FilmsByTitle,
        CacheShape::FilmsByDirector,
        CacheShape::FilmsByReviewCount,
        CacheShape::DirectorById,
        CacheShape::DirectorsAll,
        CacheShape::ReviewsByFilm,
    ];

    /// Shapes whose entries are film result sets.
    pub const FILM_AGGREGATES: [CacheShape; 4] = [
        CacheShape::FilmsAll,
        CacheShape::FilmsByTitle,
        CacheShape::FilmsByDirector,
        CacheShape::FilmsByReviewCount,
    ];

    /// Configuration name of the shape.
    pub fn name(&self) -> &'static str {
        match self {
            CacheShape::FilmById => "film_by_id",
            CacheShape::FilmsAll => "films_all",
            CacheShape::FilmsByTitle => "films_by_title",
            CacheShape::FilmsByDirector => "films_by_director",
            CacheShape::FilmsByReviewCount => "films_by_review_count",
            CacheShape::DirectorById => "director_by_id",
            CacheShape::DirectorsAll => "directors_all",
            CacheShape::ReviewsByFilm => "reviews_by_film",
        }
    }

    pub fn is_film_aggregate(&self) -> bool {
        Self::FILM_AGGREGATES.contains(self)
    }
}

impl fmt::Display for CacheShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CacheShape {
    type Err = CineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|shape| shape.name() == s)
            .ok_or_else(|| {
                CineError::Config(ConfigError::InvalidValue {
                    field: "shape".to_string(),
                    value: s.to_string(),
                    reason: "unknown cache shape".to_string(),
                })
            })
    }
}

/// Deterministically built key inside one shape's cache.
///
/// Keys of different shapes live in different caches, so the same key value
/// under two shapes never collides.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CacheKey {
    Id(i64),
    Text(String),
    Composite { prefix: &'static str, value: String },
}

impl CacheKey {
    const ALL: &'static str = "all";
    const REVIEW_COUNT_PREFIX: &'static str = "reviewCount_";

    /// Key of a single entity in a by-id shape.
    pub fn id<I: EntityIdType>(id: I) -> Self {
        CacheKey::Id(id.as_i64())
    }

    pub fn title(title: &str) -> Self {
        CacheKey::Text(title.to_string())
    }

    pub fn director_name(name: &str) -> Self {
        CacheKey::Text(name.to_string())
    }

    pub fn review_count(threshold: u32) -> Self {
        CacheKey::Composite {
            prefix: Self::REVIEW_COUNT_PREFIX,
            value: threshold.to_string(),
        }
    }

    /// The single key of the find-all shapes.
    pub fn all() -> Self {
        CacheKey::Text(Self::ALL.to_string())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Id(id) => write!(f, "{}", id),
            CacheKey::Text(text) => f.write_str(text),
            CacheKey::Composite { prefix, value } => write!(f, "{}{}", prefix, value),
        }
    }
}
