//! Property-Based Tests for Cache Consistency
//!
//! **Property 1: Bounded LRU residency**
//!
//! For any capacity and any sequence of get/put/remove, the cache never holds
//! more than `capacity` entries and its resident set is exactly the most
//! recently touched live keys.
//!
//! **Property 2: Cached reads agree with the store**
//!
//! For any sequence of writes and reads through the cached services, with
//! capacities small enough to force evictions, every subsequent cached read
//! returns what the store returns.
//!
//! **Property 3: Rejected and missing ids leave the caches empty**
//!
//! A non-positive id is rejected before any cache or store access; a valid
//! id that the store never assigned is reported as NotFound and not cached.

use std::sync::Arc;

use cinecache_core::{
    CacheConfig, CineError, DirectorId, EntityIdType, EntityType, FilmId, FilmUpdate,
    NewDirector, NewFilm, NewReview, ReviewId,
};
use cinecache_storage::{
    BoundedCache, CineServices, DirectorService, FilmService, InMemoryStore, ReviewService,
    StoreTrait,
};
use cinecache_test_utils::assertions::assert_not_found;
use cinecache_test_utils::generators::{
    arb_cache_config, arb_cache_ops, arb_director_id, arb_director_name, arb_entity_type,
    arb_film_id, arb_film_update, arb_invalid_raw_id, arb_new_director, arb_new_film,
    arb_new_review, arb_review_id, arb_title, CacheOp,
};
use proptest::prelude::*;

// ============================================================================
// PROPERTY 1: BOUNDED LRU
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_lru_residency(capacity in 1usize..8, ops in arb_cache_ops(16, 96)) {
        let cache = BoundedCache::new(capacity).unwrap();
        // Least recent first.
        let mut model: Vec<(u8, u32)> = Vec::new();

        for op in ops {
            match op {
                CacheOp::Get(k) => {
                    let got = cache.get(&k);
                    match model.iter().position(|(mk, _)| *mk == k) {
                        Some(pos) => {
                            let entry = model.remove(pos);
                            prop_assert_eq!(got, Some(entry.1));
                            model.push(entry);
                        }
                        None => prop_assert_eq!(got, None),
                    }
                }
                CacheOp::Put(k, v) => {
                    let evicted = cache.put(k, v);
                    let overwrite = model.iter().any(|(mk, _)| *mk == k);
                    model.retain(|(mk, _)| *mk != k);
                    model.push((k, v));
                    if !overwrite && model.len() > capacity {
                        prop_assert_eq!(evicted, Some(model.remove(0)));
                    } else {
                        prop_assert_eq!(evicted, None);
                    }
                }
                CacheOp::Remove(k) => {
                    let removed = cache.remove(&k);
                    let pos = model.iter().position(|(mk, _)| *mk == k);
                    let expected = pos.map(|pos| model.remove(pos).1);
                    prop_assert_eq!(removed, expected);
                }
            }
            prop_assert!(cache.len() <= capacity);
        }
        prop_assert_eq!(cache.snapshot(), model);
    }
}

// ============================================================================
// PROPERTY 2: CACHED READS AGREE WITH THE STORE
// ============================================================================

/// One caller action. Indices pick among whatever exists at that moment.
#[derive(Debug, Clone)]
enum Action {
    CreateFilm(NewFilm),
    UpdateFilm(usize, FilmUpdate),
    DeleteFilm(usize),
    AttachDirector(usize, NewDirector),
    UpdateDirector(usize, NewDirector),
    DetachDirector(usize),
    DeleteDirector(usize),
    CreateReview(usize, NewReview),
    UpdateReview(usize, NewReview),
    DeleteReview(usize),
    ReadFilm(usize),
    ReadAllFilms,
    ReadByTitle(String),
    ReadByDirector(String),
    ReadByReviewCount(u32),
    ReadDirector(usize),
    ReadAllDirectors,
    ReadReviews(usize),
}

fn arb_action() -> impl Strategy<Value = Action> {
    let idx = 0usize..8;
    prop_oneof![
        3 => arb_new_film().prop_map(Action::CreateFilm),
        1 => (idx.clone(), arb_film_update()).prop_map(|(i, u)| Action::UpdateFilm(i, u)),
        1 => idx.clone().prop_map(Action::DeleteFilm),
        1 => (idx.clone(), arb_new_director()).prop_map(|(i, d)| Action::AttachDirector(i, d)),
        1 => (idx.clone(), arb_new_director()).prop_map(|(i, d)| Action::UpdateDirector(i, d)),
        1 => idx.clone().prop_map(Action::DetachDirector),
        1 => idx.clone().prop_map(Action::DeleteDirector),
        2 => (idx.clone(), arb_new_review()).prop_map(|(i, r)| Action::CreateReview(i, r)),
        1 => (idx.clone(), arb_new_review()).prop_map(|(i, r)| Action::UpdateReview(i, r)),
        1 => idx.clone().prop_map(Action::DeleteReview),
        3 => idx.clone().prop_map(Action::ReadFilm),
        1 => Just(Action::ReadAllFilms),
        1 => arb_title().prop_map(Action::ReadByTitle),
        1 => arb_director_name().prop_map(Action::ReadByDirector),
        1 => (0u32..4).prop_map(Action::ReadByReviewCount),
        2 => idx.clone().prop_map(Action::ReadDirector),
        1 => Just(Action::ReadAllDirectors),
        2 => idx.prop_map(Action::ReadReviews),
    ]
}

fn pick<T: Copy>(items: &[T], i: usize) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[i % items.len()])
    }
}

fn film_ids(store: &InMemoryStore) -> Vec<FilmId> {
    store.film_find_all().unwrap().into_iter().map(|f| f.id).collect()
}

fn director_ids(store: &InMemoryStore) -> Vec<DirectorId> {
    store.director_find_all().unwrap().into_iter().map(|d| d.id).collect()
}

/// Run one action. Business errors (such as a detach on a film without
/// directors) are expected and ignored; the property is about cache state.
fn run(cine: &CineServices<InMemoryStore>, store: &InMemoryStore, action: Action) {
    let films = film_ids(store);
    let directors = director_ids(store);
    match action {
        Action::CreateFilm(film) => {
            let _ = cine.films.create(&film);
        }
        Action::UpdateFilm(i, update) => {
            if let Some(id) = pick(&films, i) {
                let _ = cine.films.update(id, &update);
            }
        }
        Action::DeleteFilm(i) => {
            if let Some(id) = pick(&films, i) {
                let _ = cine.films.delete(id);
            }
        }
        Action::AttachDirector(i, director) => {
            if let Some(id) = pick(&films, i) {
                let _ = cine.directors.create(id, &director);
            }
        }
        Action::UpdateDirector(i, director) => {
            if let Some(id) = pick(&directors, i) {
                let _ = cine.directors.update(id, &director);
            }
        }
        Action::DetachDirector(i) => {
            if let Some(film_id) = pick(&films, i) {
                let film = store.film_find_by_id(film_id).unwrap().unwrap();
                if let Some(director) = film.directors.first() {
                    let _ = cine.directors.detach(director.id, film_id);
                }
            }
        }
        Action::DeleteDirector(i) => {
            if let Some(id) = pick(&directors, i) {
                let _ = cine.directors.delete(id);
            }
        }
        Action::CreateReview(i, review) => {
            if let Some(id) = pick(&films, i) {
                let _ = cine.reviews.create(id, &review);
            }
        }
        Action::UpdateReview(i, review) => {
            let reviews = store.review_find_all().unwrap();
            if !reviews.is_empty() {
                let target = &reviews[i % reviews.len()];
                let _ = cine.reviews.update(target.film_id, target.id, &review);
            }
        }
        Action::DeleteReview(i) => {
            let reviews = store.review_find_all().unwrap();
            if !reviews.is_empty() {
                let target = &reviews[i % reviews.len()];
                let _ = cine.reviews.delete(target.film_id, target.id);
            }
        }
        Action::ReadFilm(i) => {
            if let Some(id) = pick(&films, i) {
                let _ = cine.films.get(id);
            }
        }
        Action::ReadAllFilms => {
            let _ = cine.films.find_all();
        }
        Action::ReadByTitle(title) => {
            let _ = cine.films.find_by_title(&title);
        }
        Action::ReadByDirector(name) => {
            let _ = cine.films.find_by_director_name(&name);
        }
        Action::ReadByReviewCount(threshold) => {
            let _ = cine.films.find_by_review_count_above(threshold);
        }
        Action::ReadDirector(i) => {
            if let Some(id) = pick(&directors, i) {
                let _ = cine.directors.get(id);
            }
        }
        Action::ReadAllDirectors => {
            let _ = cine.directors.find_all();
        }
        Action::ReadReviews(i) => {
            if let Some(id) = pick(&films, i) {
                let _ = cine.reviews.list_for_film(id);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cached_reads_match_store(
        config in arb_cache_config(),
        actions in prop::collection::vec(arb_action(), 1..40),
    ) {
        let store = Arc::new(InMemoryStore::new());
        let cine = CineServices::new(store.clone(), &config).unwrap();

        for action in actions {
            run(&cine, &store, action);
        }

        // Each read runs twice: the first may populate, the second is
        // served from whatever the cache now holds.
        for _ in 0..2 {
            prop_assert_eq!(cine.films.find_all().unwrap(), store.film_find_all().unwrap());
            prop_assert_eq!(cine.directors.find_all().unwrap(), store.director_find_all().unwrap());
            for id in film_ids(&store) {
                prop_assert_eq!(
                    Some(cine.films.get(id).unwrap()),
                    store.film_find_by_id(id).unwrap()
                );
                prop_assert_eq!(
                    cine.reviews.list_for_film(id).unwrap(),
                    store.review_find_by_film_id(id).unwrap()
                );
            }
            for id in director_ids(&store) {
                prop_assert_eq!(
                    Some(cine.directors.get(id).unwrap()),
                    store.director_find_by_id(id).unwrap()
                );
            }
            for threshold in 0..3 {
                prop_assert_eq!(
                    cine.films.find_by_review_count_above(threshold).unwrap(),
                    store.film_find_by_review_count_above(threshold).unwrap()
                );
            }
        }
    }
}

// ============================================================================
// PROPERTY 3: REJECTED AND MISSING IDS
// ============================================================================

fn empty_services() -> (Arc<InMemoryStore>, CineServices<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let cine = CineServices::new(store.clone(), &CacheConfig::default()).unwrap();
    (store, cine)
}

fn all_caches_empty(cine: &CineServices<InMemoryStore>) -> bool {
    cine.caches().stats().iter().all(|(_, stats)| stats.entries == 0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invalid_ids_are_rejected_before_lookup(
        raw in arb_invalid_raw_id(),
        entity in arb_entity_type(),
    ) {
        let (store, cine) = empty_services();
        let err = match entity {
            EntityType::Film => cine.films.get(FilmId::new(raw)).unwrap_err(),
            EntityType::Director => cine.directors.get(DirectorId::new(raw)).unwrap_err(),
            EntityType::Review => cine.reviews.get(ReviewId::new(raw)).unwrap_err(),
        };
        prop_assert!(matches!(err, CineError::Validation(_)));
        prop_assert_eq!(store.read_count(), 0);
        prop_assert!(cine.caches().stats().iter().all(|(_, s)| s.hits + s.misses == 0));
    }

    #[test]
    fn prop_missing_ids_are_not_found_and_not_cached(
        film in arb_film_id(),
        director in arb_director_id(),
        review in arb_review_id(),
    ) {
        let (_, cine) = empty_services();
        assert_not_found(&cine.films.get(film), EntityType::Film);
        assert_not_found(&cine.reviews.list_for_film(film), EntityType::Film);
        assert_not_found(&cine.directors.get(director), EntityType::Director);
        assert_not_found(&cine.directors.get_for_film(director, film), EntityType::Film);
        assert_not_found(&cine.reviews.get(review), EntityType::Review);
        prop_assert!(all_caches_empty(&cine));
    }
}
