//! Cache configuration.
//!
//! One capacity per query shape. Capacities are fixed when the registry is
//! built; there is no runtime resizing.

use crate::{CineError, CineResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-shape capacities for the entity caches.
///
/// Field names double as the shape names used by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub film_by_id: usize,
    pub films_all: usize,
    pub films_by_title: usize,
    pub films_by_director: usize,
    pub films_by_review_count: usize,
    pub director_by_id: usize,
    pub directors_all: usize,
    pub reviews_by_film: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            film_by_id: 20,
            films_all: 4,
            films_by_title: 16,
            films_by_director: 16,
            films_by_review_count: 16,
            director_by_id: 10,
            directors_all: 4,
            reviews_by_film: 10,
        }
    }
}

impl CacheConfig {
    /// Shape names in declaration order.
    pub const SHAPE_NAMES: [&'static str; 8] = [
        "film_by_id",
        "films_all",
        "films_by_title",
        "films_by_director",
        "films_by_review_count",
        "director_by_id",
        "directors_all",
        "reviews_by_film",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity configured for a shape, or `None` for an unknown name.
    pub fn capacity_for(&self, shape: &str) -> Option<usize> {
        let capacity = match shape {
            "film_by_id" => self.film_by_id,
            "films_all" => self.films_all,
            "films_by_title" => self.films_by_title,
            "films_by_director" => self.films_by_director,
            "films_by_review_count" => self.films_by_review_count,
            "director_by_id" => self.director_by_id,
            "directors_all" => self.directors_all,
            "reviews_by_film" => self.reviews_by_film,
            _ => return None,
        };
        Some(capacity)
    }

    /// Set the capacity of one shape.
    pub fn with_capacity(mut self, shape: &str, capacity: usize) -> CineResult<Self> {
        let slot = match shape {
            "film_by_id" => &mut self.film_by_id,
            "films_all" => &mut self.films_all,
            "films_by_title" => &mut self.films_by_title,
            "films_by_director" => &mut self.films_by_director,
            "films_by_review_count" => &mut self.films_by_review_count,
            "director_by_id" => &mut self.director_by_id,
            "directors_all" => &mut self.directors_all,
            "reviews_by_film" => &mut self.reviews_by_film,
            other => {
                return Err(CineError::Config(ConfigError::InvalidValue {
                    field: "shape".to_string(),
                    value: other.to_string(),
                    reason: "unknown cache shape".to_string(),
                }))
            }
        };
        *slot = capacity;
        Ok(self)
    }

    /// Parse a TOML document. Missing shapes keep their default capacity.
    pub fn from_toml_str(contents: &str) -> CineResult<Self> {
        let config: CacheConfig = toml::from_str(contents).map_err(|e| ConfigError::LoadFailed {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn from_path(path: &Path) -> CineResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: CacheConfig = toml::from_str(&contents).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Every capacity must be greater than 0.
    pub fn validate(&self) -> CineResult<()> {
        for name in Self::SHAPE_NAMES {
            let capacity = self.capacity_for(name).unwrap_or_default();
            if capacity == 0 {
                return Err(CineError::Config(ConfigError::InvalidValue {
                    field: name.to_string(),
                    value: capacity.to_string(),
                    reason: "capacity must be greater than 0".to_string(),
                }));
            }
        }
        Ok(())
    }
}
