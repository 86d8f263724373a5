//! Cinecache Test Utilities
//!
//! Shared test infrastructure for the cinecache workspace:
//! - Proptest generators for ids, write payloads and cache op sequences
//! - Fixtures for common film library scenarios
//! - Custom assertions for cinecache errors
//! - A test tracing subscriber

// Re-export core types for convenience
pub use cinecache_core::{
    CacheConfig, CineError, CineResult, Director, DirectorId, DirectorSummary, EntityIdType,
    EntityType, Film, FilmId, FilmUpdate, NewDirector, NewFilm, NewReview, Review, ReviewId,
    StoreError, ValidationError,
};

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber for tests.
///
/// Honours `RUST_LOG` and defaults to `cinecache_storage=debug`. Safe to call
/// from every test: only the first call installs anything.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cinecache_storage=debug,warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for cinecache types.

    use super::*;
    use cinecache_core::validation::{
        DIRECTOR_BIRTH_YEAR, FILM_RELEASE_YEAR, REVIEW_RATING,
    };
    use proptest::prelude::*;

    // === Identity Type Generators ===

    pub fn arb_film_id() -> impl Strategy<Value = FilmId> {
        (1i64..10_000).prop_map(FilmId::new)
    }

    pub fn arb_director_id() -> impl Strategy<Value = DirectorId> {
        (1i64..10_000).prop_map(DirectorId::new)
    }

    pub fn arb_review_id() -> impl Strategy<Value = ReviewId> {
        (1i64..10_000).prop_map(ReviewId::new)
    }

    /// Identifiers the store can never assign.
    pub fn arb_invalid_raw_id() -> impl Strategy<Value = i64> {
        prop_oneof![Just(0i64), (i64::MIN..0)]
    }

    pub fn arb_entity_type() -> impl Strategy<Value = EntityType> {
        prop_oneof![
            Just(EntityType::Film),
            Just(EntityType::Director),
            Just(EntityType::Review),
        ]
    }

    // === Payload Generators ===

    /// A director name from a small pool, so films share directors.
    pub fn arb_director_name() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["Varda", "Ozu", "Lang", "Wilder", "Kiarostami", "Sembene"])
            .prop_map(str::to_string)
    }

    pub fn arb_new_director() -> impl Strategy<Value = NewDirector> {
        (
            arb_director_name(),
            "[A-Z]{2}",
            (DIRECTOR_BIRTH_YEAR.0 as i32)..=(DIRECTOR_BIRTH_YEAR.1 as i32),
        )
            .prop_map(|(name, nationality, birth_year)| NewDirector {
                name,
                nationality,
                birth_year,
            })
    }

    pub fn arb_new_review() -> impl Strategy<Value = NewReview> {
        (
            "[a-z]{1,20}( [a-z]{1,12}){0,6}",
            (REVIEW_RATING.0 as i32)..=(REVIEW_RATING.1 as i32),
        )
            .prop_map(|(message, rating)| NewReview { message, rating })
    }

    /// A title from a small pool, so title lookups see duplicates.
    pub fn arb_title() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["Metropolis", "Ugetsu", "Xala", "Cleo", "M"])
            .prop_map(str::to_string)
    }

    pub fn arb_new_film() -> impl Strategy<Value = NewFilm> {
        (
            arb_title(),
            "[A-Z][a-z]{2,12}",
            (FILM_RELEASE_YEAR.0 as i32)..=(FILM_RELEASE_YEAR.1 as i32),
            prop::collection::vec(arb_new_director(), 1..3),
            prop::collection::vec(arb_new_review(), 0..4),
        )
            .prop_map(|(title, genre, release_year, directors, reviews)| NewFilm {
                title,
                genre,
                release_year,
                directors,
                reviews,
            })
    }

    pub fn arb_film_update() -> impl Strategy<Value = FilmUpdate> {
        (
            arb_title(),
            "[A-Z][a-z]{2,12}",
            (FILM_RELEASE_YEAR.0 as i32)..=(FILM_RELEASE_YEAR.1 as i32),
        )
            .prop_map(|(title, genre, release_year)| FilmUpdate {
                title,
                genre,
                release_year,
            })
    }

    // === Cache Workload Generators ===

    /// One step of a bounded-cache workload over a small key space.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum CacheOp {
        Get(u8),
        Put(u8, u32),
        Remove(u8),
    }

    pub fn arb_cache_op(key_space: u8) -> impl Strategy<Value = CacheOp> {
        prop_oneof![
            3 => (0..key_space).prop_map(CacheOp::Get),
            3 => (0..key_space, any::<u32>()).prop_map(|(k, v)| CacheOp::Put(k, v)),
            1 => (0..key_space).prop_map(CacheOp::Remove),
        ]
    }

    pub fn arb_cache_ops(key_space: u8, max_len: usize) -> impl Strategy<Value = Vec<CacheOp>> {
        prop::collection::vec(arb_cache_op(key_space), 0..max_len)
    }

    /// Valid per-shape capacities, kept small so eviction is exercised.
    pub fn arb_cache_config() -> impl Strategy<Value = CacheConfig> {
        prop::collection::vec(1usize..6, 8).prop_map(|caps| CacheConfig {
            film_by_id: caps[0],
            films_all: caps[1],
            films_by_title: caps[2],
            films_by_director: caps[3],
            films_by_review_count: caps[4],
            director_by_id: caps[5],
            directors_all: caps[6],
            reviews_by_film: caps[7],
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built payloads for common testing scenarios.

    use super::*;

    pub fn director(name: &str) -> NewDirector {
        NewDirector {
            name: name.to_string(),
            nationality: "FR".to_string(),
            birth_year: 1930,
        }
    }

    pub fn review(message: &str, rating: i32) -> NewReview {
        NewReview {
            message: message.to_string(),
            rating,
        }
    }

    /// A film with the named directors and `reviews` generic reviews.
    pub fn film(title: &str, directors: &[&str], reviews: usize) -> NewFilm {
        NewFilm {
            title: title.to_string(),
            genre: "Drama".to_string(),
            release_year: 1962,
            directors: directors.iter().map(|d| director(d)).collect(),
            reviews: (0..reviews)
                .map(|i| review(&format!("review #{}", i + 1), 7))
                .collect(),
        }
    }

    pub fn update(title: &str) -> FilmUpdate {
        FilmUpdate {
            title: title.to_string(),
            genre: "Drama".to_string(),
            release_year: 1963,
        }
    }

    /// Capacity of every shape set to `capacity`.
    pub fn uniform_config(capacity: usize) -> CacheConfig {
        CacheConfig {
            film_by_id: capacity,
            films_all: capacity,
            films_by_title: capacity,
            films_by_director: capacity,
            films_by_review_count: capacity,
            director_by_id: capacity,
            directors_all: capacity,
            reviews_by_film: capacity,
        }
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for cinecache results.

    use super::*;

    /// Assert that a result is a store-level NotFound for `entity_type`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &CineResult<T>, entity_type: EntityType) {
        match result {
            Err(CineError::Store(StoreError::NotFound { entity_type: et, .. })) => {
                assert_eq!(*et, entity_type, "NotFound for the wrong entity type");
            }
            other => panic!("Expected NotFound({:?}), got: {:?}", entity_type, other),
        }
    }

    /// Assert that a result is a validation error.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &CineResult<T>) {
        match result {
            Err(CineError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }
}
