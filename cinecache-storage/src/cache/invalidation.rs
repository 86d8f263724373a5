//! Mutation to cache-action rules.
//!
//! [`InvalidationProtocol::plan`] is a pure function from a committed
//! [`Mutation`] to an [`InvalidationPlan`]. Planning never looks at the
//! registry; applying a plan runs each action against exactly one cache, in
//! [`CacheShape`] lock order, so no two cache locks are ever held together.
//!
//! Result-set caches (all films, by title, by director, by review count) are
//! always cleared rather than patched: their membership depends on fields
//! that a single-id patch cannot re-evaluate.

use cinecache_core::{Director, DirectorId, DirectorSummary, Film, FilmId, Review, ReviewId};

use super::key::{CacheKey, CacheShape};
use super::registry::EntityCacheRegistry;

/// A store write that has already succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    FilmCreated(Film),
    /// The saved film as returned by the store.
    FilmUpdated(Film),
    FilmDeleted(FilmId),
    DirectorCreated {
        director: Director,
        film_id: FilmId,
    },
    DirectorUpdated(Director),
    DirectorDetached {
        director_id: DirectorId,
        film_id: FilmId,
        record_deleted: bool,
    },
    DirectorDeleted {
        director_id: DirectorId,
        film_ids: Vec<FilmId>,
    },
    ReviewCreated(Review),
    ReviewUpdated(Review),
    ReviewDeleted {
        film_id: FilmId,
        review_id: ReviewId,
    },
}

impl Mutation {
    /// Short label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::FilmCreated(_) => "film_created",
            Mutation::FilmUpdated(_) => "film_updated",
            Mutation::FilmDeleted(_) => "film_deleted",
            Mutation::DirectorCreated { .. } => "director_created",
            Mutation::DirectorUpdated(_) => "director_updated",
            Mutation::DirectorDetached { .. } => "director_detached",
            Mutation::DirectorDeleted { .. } => "director_deleted",
            Mutation::ReviewCreated(_) => "review_created",
            Mutation::ReviewUpdated(_) => "review_updated",
            Mutation::ReviewDeleted { .. } => "review_deleted",
        }
    }
}

/// Which resident film entries a director patch visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilmScope {
    One(FilmId),
    AllResident,
}

/// Edit to the director list embedded in a cached film.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectorPatch {
    Add(DirectorSummary),
    /// Replace the sub-entry with the same id; films without it are untouched.
    Replace(DirectorSummary),
    Remove(DirectorId),
}

impl DirectorPatch {
    fn apply(&self, directors: &mut Vec<DirectorSummary>) -> bool {
        match self {
            DirectorPatch::Add(summary) => {
                if let Some(slot) = directors.iter_mut().find(|d| d.id == summary.id) {
                    *slot = summary.clone();
                } else {
                    directors.push(summary.clone());
                }
                true
            }
            DirectorPatch::Replace(summary) => {
                match directors.iter_mut().find(|d| d.id == summary.id) {
                    Some(slot) => {
                        *slot = summary.clone();
                        true
                    }
                    None => false,
                }
            }
            DirectorPatch::Remove(id) => {
                let before = directors.len();
                directors.retain(|d| d.id != *id);
                directors.len() != before
            }
        }
    }
}

/// Edit to a cached review list, applied identically to the review-list
/// entry and to the reviews embedded in the cached film.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewPatch {
    Add(Review),
    Replace(Review),
    Remove(ReviewId),
}

impl ReviewPatch {
    fn apply(&self, reviews: &mut Vec<Review>) {
        match self {
            // Lists are kept in review id order, as the store returns them.
            ReviewPatch::Add(review) | ReviewPatch::Replace(review) => {
                match reviews.binary_search_by_key(&review.id, |r| r.id) {
                    Ok(pos) => reviews[pos] = review.clone(),
                    Err(pos) => reviews.insert(pos, review.clone()),
                }
            }
            ReviewPatch::Remove(id) => reviews.retain(|r| r.id != *id),
        }
    }
}

/// Edit to the film ids carried by cached directors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilmRefPatch {
    Add {
        director_id: DirectorId,
        film_id: FilmId,
    },
    RemoveEverywhere(FilmId),
}

impl FilmRefPatch {
    fn apply(&self, director: &mut Director) -> bool {
        match *self {
            FilmRefPatch::Add {
                director_id,
                film_id,
            } => {
                if director.id != director_id {
                    return false;
                }
                match director.film_ids.binary_search(&film_id) {
                    Ok(_) => false,
                    Err(pos) => {
                        director.film_ids.insert(pos, film_id);
                        true
                    }
                }
            }
            FilmRefPatch::RemoveEverywhere(film_id) => {
                let before = director.film_ids.len();
                director.film_ids.retain(|f| *f != film_id);
                director.film_ids.len() != before
            }
        }
    }
}

/// The caches holding whole directors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorCache {
    ById,
    All,
}

impl DirectorCache {
    pub fn shape(&self) -> CacheShape {
        match self {
            DirectorCache::ById => CacheShape::DirectorById,
            DirectorCache::All => CacheShape::DirectorsAll,
        }
    }
}

/// One step of an invalidation plan. Every action touches a single cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheAction {
    Clear(CacheShape),
    Remove(CacheShape, CacheKey),
    /// Write-through of a freshly created film.
    PutFilm(Film),
    /// Overwrite a film, keeping the relations of the resident entry if any.
    MergeFilm(Film),
    /// Write-through of a freshly created or attached director.
    PutDirector(Director),
    PatchFilmDirectors {
        scope: FilmScope,
        patch: DirectorPatch,
    },
    PatchFilmReviews {
        film_id: FilmId,
        patch: ReviewPatch,
    },
    PatchReviewList {
        film_id: FilmId,
        patch: ReviewPatch,
    },
    PatchDirectorFilms {
        cache: DirectorCache,
        patch: FilmRefPatch,
    },
}

impl CacheAction {
    /// The cache this action locks.
    pub fn shape(&self) -> CacheShape {
        match self {
            CacheAction::Clear(shape) | CacheAction::Remove(shape, _) => *shape,
            CacheAction::PutFilm(_)
            | CacheAction::MergeFilm(_)
            | CacheAction::PatchFilmDirectors { .. }
            | CacheAction::PatchFilmReviews { .. } => CacheShape::FilmById,
            CacheAction::PutDirector(_) => CacheShape::DirectorById,
            CacheAction::PatchReviewList { .. } => CacheShape::ReviewsByFilm,
            CacheAction::PatchDirectorFilms { cache, .. } => cache.shape(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CacheAction::Clear(_) => "clear",
            CacheAction::Remove(..) => "remove",
            CacheAction::PutFilm(_) => "put_film",
            CacheAction::MergeFilm(_) => "merge_film",
            CacheAction::PutDirector(_) => "put_director",
            CacheAction::PatchFilmDirectors { .. } => "patch_film_directors",
            CacheAction::PatchFilmReviews { .. } => "patch_film_reviews",
            CacheAction::PatchReviewList { .. } => "patch_review_list",
            CacheAction::PatchDirectorFilms { .. } => "patch_director_films",
        }
    }

    /// Run the action. Returns the number of entries written, removed or patched.
    fn execute(&self, caches: &EntityCacheRegistry) -> usize {
        match self {
            CacheAction::Clear(shape) => caches.cache(*shape).clear(),
            CacheAction::Remove(shape, key) => usize::from(caches.cache(*shape).remove(key)),
            CacheAction::PutFilm(film) => {
                caches
                    .film_by_id()
                    .upsert_with(CacheKey::id(film.id), |_| film.clone());
                1
            }
            CacheAction::MergeFilm(film) => {
                caches.film_by_id().upsert_with(CacheKey::id(film.id), |prior| match prior {
                    Some(prior) => film.clone().with_relations_from(prior),
                    None => film.clone(),
                });
                1
            }
            CacheAction::PutDirector(director) => {
                caches
                    .director_by_id()
                    .upsert_with(CacheKey::id(director.id), |_| director.clone());
                1
            }
            CacheAction::PatchFilmDirectors { scope, patch } => match scope {
                FilmScope::One(film_id) => usize::from(
                    caches
                        .film_by_id()
                        .patch(&CacheKey::id(*film_id), |film| {
                            patch.apply(&mut film.directors);
                        }),
                ),
                FilmScope::AllResident => caches
                    .film_by_id()
                    .patch_all(|_, film| patch.apply(&mut film.directors)),
            },
            CacheAction::PatchFilmReviews { film_id, patch } => {
                let key = CacheKey::id(*film_id);
                usize::from(
                    caches
                        .film_by_id()
                        .patch(&key, |film| patch.apply(&mut film.reviews)),
                )
            }
            CacheAction::PatchReviewList { film_id, patch } => usize::from(
                caches
                    .reviews_by_film()
                    .patch(&CacheKey::id(*film_id), |reviews| patch.apply(reviews)),
            ),
            CacheAction::PatchDirectorFilms { cache, patch } => match (cache, patch) {
                (DirectorCache::ById, FilmRefPatch::Add { director_id, .. }) => usize::from(
                    caches
                        .director_by_id()
                        .patch(&CacheKey::id(*director_id), |director| {
                            patch.apply(director);
                        }),
                ),
                (DirectorCache::ById, FilmRefPatch::RemoveEverywhere(_)) => caches
                    .director_by_id()
                    .patch_all(|_, director| patch.apply(director)),
                (DirectorCache::All, _) => caches.directors_all().patch_all(|_, directors| {
                    directors
                        .iter_mut()
                        .fold(false, |changed, director| patch.apply(director) || changed)
                }),
            },
        }
    }
}

/// Ordered cache actions for one mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    actions: Vec<CacheAction>,
}

impl InvalidationPlan {
    fn new(mut actions: Vec<CacheAction>) -> Self {
        // Stable: actions on the same cache keep their relative order.
        actions.sort_by_key(CacheAction::shape);
        Self { actions }
    }

    pub fn actions(&self) -> &[CacheAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Shapes touched by the plan, in the order they are locked.
    pub fn shapes(&self) -> Vec<CacheShape> {
        let mut shapes: Vec<CacheShape> = self.actions.iter().map(CacheAction::shape).collect();
        shapes.dedup();
        shapes
    }

    /// Execute every action against `caches`, one cache lock at a time.
    ///
    /// Returns the total number of entries affected.
    pub fn apply(&self, caches: &EntityCacheRegistry) -> usize {
        self.actions
            .iter()
            .map(|action| {
                let affected = action.execute(caches);
                tracing::debug!(
                    shape = %action.shape(),
                    action = action.label(),
                    affected,
                    "Applied cache action"
                );
                affected
            })
            .sum()
    }
}

/// The fixed mapping from mutation to cache actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidationProtocol;

impl InvalidationProtocol {
    /// Compute the actions a committed mutation requires.
    pub fn plan(mutation: &Mutation) -> InvalidationPlan {
        let mut actions = Vec::new();
        match mutation {
            Mutation::FilmCreated(film) => {
                actions.push(CacheAction::PutFilm(film.clone()));
                actions.push(CacheAction::Clear(CacheShape::DirectorsAll));
                for director in &film.directors {
                    actions.push(CacheAction::PatchDirectorFilms {
                        cache: DirectorCache::ById,
                        patch: FilmRefPatch::Add {
                            director_id: director.id,
                            film_id: film.id,
                        },
                    });
                }
            }
            Mutation::FilmUpdated(film) => {
                actions.push(CacheAction::MergeFilm(film.clone()));
            }
            Mutation::FilmDeleted(film_id) => {
                actions.push(CacheAction::Remove(CacheShape::FilmById, CacheKey::id(*film_id)));
                actions.push(CacheAction::Remove(
                    CacheShape::ReviewsByFilm,
                    CacheKey::id(*film_id),
                ));
                for cache in [DirectorCache::ById, DirectorCache::All] {
                    actions.push(CacheAction::PatchDirectorFilms {
                        cache,
                        patch: FilmRefPatch::RemoveEverywhere(*film_id),
                    });
                }
            }
            Mutation::DirectorCreated { director, film_id } => {
                actions.push(CacheAction::PutDirector(director.clone()));
                actions.push(CacheAction::Clear(CacheShape::DirectorsAll));
                actions.push(CacheAction::PatchFilmDirectors {
                    scope: FilmScope::One(*film_id),
                    patch: DirectorPatch::Add(director.summary()),
                });
            }
            Mutation::DirectorUpdated(director) => {
                // Films get a precise patch; director caches are dropped.
                actions.push(CacheAction::Remove(
                    CacheShape::DirectorById,
                    CacheKey::id(director.id),
                ));
                actions.push(CacheAction::Clear(CacheShape::DirectorsAll));
                actions.push(CacheAction::PatchFilmDirectors {
                    scope: FilmScope::AllResident,
                    patch: DirectorPatch::Replace(director.summary()),
                });
            }
            Mutation::DirectorDetached {
                director_id,
                film_id,
                record_deleted,
            } => {
                let scope = if *record_deleted {
                    FilmScope::AllResident
                } else {
                    FilmScope::One(*film_id)
                };
                push_director_removal(&mut actions, *director_id, scope);
            }
            Mutation::DirectorDeleted { director_id, .. } => {
                push_director_removal(&mut actions, *director_id, FilmScope::AllResident);
            }
            Mutation::ReviewCreated(review) => {
                push_review_patch(&mut actions, review.film_id, ReviewPatch::Add(review.clone()));
            }
            Mutation::ReviewUpdated(review) => {
                push_review_patch(
                    &mut actions,
                    review.film_id,
                    ReviewPatch::Replace(review.clone()),
                );
            }
            Mutation::ReviewDeleted { film_id, review_id } => {
                push_review_patch(&mut actions, *film_id, ReviewPatch::Remove(*review_id));
            }
        }
        // Every mutation changes something a film result set embeds.
        actions.extend(CacheShape::FILM_AGGREGATES.into_iter().map(CacheAction::Clear));
        InvalidationPlan::new(actions)
    }
}

fn push_director_removal(
    actions: &mut Vec<CacheAction>,
    director_id: DirectorId,
    scope: FilmScope,
) {
    actions.push(CacheAction::Remove(
        CacheShape::DirectorById,
        CacheKey::id(director_id),
    ));
    actions.push(CacheAction::Clear(CacheShape::DirectorsAll));
    actions.push(CacheAction::PatchFilmDirectors {
        scope,
        patch: DirectorPatch::Remove(director_id),
    });
}

fn push_review_patch(actions: &mut Vec<CacheAction>, film_id: FilmId, patch: ReviewPatch) {
    actions.push(CacheAction::PatchFilmReviews {
        film_id,
        patch: patch.clone(),
    });
    actions.push(CacheAction::PatchReviewList { film_id, patch });
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinecache_core::EntityIdType;

    fn summary(id: i64, name: &str) -> DirectorSummary {
        DirectorSummary {
            id: DirectorId::new(id),
            name: name.to_string(),
            nationality: "IT".to_string(),
            birth_year: 1930,
        }
    }

    fn director(id: i64, name: &str, films: &[i64]) -> Director {
        Director {
            id: DirectorId::new(id),
            name: name.to_string(),
            nationality: "IT".to_string(),
            birth_year: 1930,
            film_ids: films.iter().map(|f| FilmId::new(*f)).collect(),
        }
    }

    fn review(id: i64, film: i64, rating: i32) -> Review {
        Review {
            id: ReviewId::new(id),
            film_id: FilmId::new(film),
            message: format!("review {}", id),
            rating,
        }
    }

    fn film(id: i64, directors: Vec<DirectorSummary>) -> Film {
        Film {
            id: FilmId::new(id),
            title: format!("Film {}", id),
            genre: "Drama".to_string(),
            release_year: 1960,
            directors,
            reviews: vec![],
        }
    }

    fn registry() -> EntityCacheRegistry {
        EntityCacheRegistry::with_defaults().unwrap()
    }

    #[test]
    fn test_plans_are_in_lock_order() {
        let mutations = vec![
            Mutation::FilmCreated(film(1, vec![summary(2, "A")])),
            Mutation::FilmDeleted(FilmId::new(1)),
            Mutation::DirectorUpdated(director(2, "B", &[1])),
            Mutation::ReviewDeleted {
                film_id: FilmId::new(1),
                review_id: ReviewId::new(3),
            },
        ];
        for mutation in mutations {
            let plan = InvalidationProtocol::plan(&mutation);
            let shapes: Vec<CacheShape> = plan.actions().iter().map(CacheAction::shape).collect();
            let mut sorted = shapes.clone();
            sorted.sort();
            assert_eq!(shapes, sorted, "{} out of order", mutation.kind());
        }
    }

    #[test]
    fn test_every_plan_clears_film_aggregates() {
        let plan = InvalidationProtocol::plan(&Mutation::ReviewCreated(review(1, 1, 5)));
        for shape in CacheShape::FILM_AGGREGATES {
            assert!(plan.actions().contains(&CacheAction::Clear(shape)));
        }
    }

    #[test]
    fn test_film_updated_keeps_cached_relations() {
        let caches = registry();
        let mut cached = film(1, vec![summary(5, "Fellini")]);
        cached.reviews.push(review(9, 1, 8));
        caches.film_by_id().put(CacheKey::id(cached.id), cached.clone());
        caches.films_all().put(CacheKey::all(), vec![cached.clone()]);

        let mut saved = film(1, vec![]);
        saved.title = "Otto e mezzo".to_string();
        InvalidationProtocol::plan(&Mutation::FilmUpdated(saved)).apply(&caches);

        let merged = caches.film_by_id().peek(&CacheKey::id(FilmId::new(1))).unwrap();
        assert_eq!(merged.title, "Otto e mezzo");
        assert_eq!(merged.directors, cached.directors);
        assert_eq!(merged.reviews, cached.reviews);
        assert!(caches.films_all().is_empty());
    }

    #[test]
    fn test_director_update_patches_without_promoting() {
        let caches = registry();
        caches
            .film_by_id()
            .put(CacheKey::id(FilmId::new(10)), film(10, vec![summary(5, "Old")]));
        caches
            .film_by_id()
            .put(CacheKey::id(FilmId::new(11)), film(11, vec![summary(6, "Other")]));
        caches
            .director_by_id()
            .put(CacheKey::id(DirectorId::new(5)), director(5, "Old", &[10]));
        let order_before = caches.film_by_id().keys();

        InvalidationProtocol::plan(&Mutation::DirectorUpdated(director(5, "New", &[10])))
            .apply(&caches);

        let patched = caches.film_by_id().peek(&CacheKey::id(FilmId::new(10))).unwrap();
        assert_eq!(patched.directors, vec![summary(5, "New")]);
        let untouched = caches.film_by_id().peek(&CacheKey::id(FilmId::new(11))).unwrap();
        assert_eq!(untouched.directors, vec![summary(6, "Other")]);
        assert_eq!(caches.film_by_id().keys(), order_before);
        assert!(!caches.director_by_id().contains(&CacheKey::id(DirectorId::new(5))));
    }

    #[test]
    fn test_film_deleted_removes_entries_and_back_references() {
        let caches = registry();
        let film_key = CacheKey::id(FilmId::new(7));
        caches.film_by_id().put(film_key.clone(), film(7, vec![summary(1, "Antonioni")]));
        caches
            .reviews_by_film()
            .put(film_key.clone(), vec![review(1, 7, 6), review(2, 7, 7), review(3, 7, 9)]);
        caches
            .director_by_id()
            .put(CacheKey::id(DirectorId::new(1)), director(1, "Antonioni", &[7, 8]));
        caches
            .directors_all()
            .put(CacheKey::all(), vec![director(1, "Antonioni", &[7, 8])]);

        InvalidationProtocol::plan(&Mutation::FilmDeleted(FilmId::new(7))).apply(&caches);

        assert_eq!(caches.film_by_id().get(&film_key), None);
        assert_eq!(caches.reviews_by_film().get(&film_key), None);
        let d = caches.director_by_id().peek(&CacheKey::id(DirectorId::new(1))).unwrap();
        assert_eq!(d.film_ids, vec![FilmId::new(8)]);
        let all = caches.directors_all().peek(&CacheKey::all()).unwrap();
        assert_eq!(all[0].film_ids, vec![FilmId::new(8)]);
    }

    #[test]
    fn test_film_created_writes_through_and_links_directors() {
        let caches = registry();
        caches
            .director_by_id()
            .put(CacheKey::id(DirectorId::new(3)), director(3, "Visconti", &[1]));
        caches.directors_all().put(CacheKey::all(), vec![]);

        let created = film(2, vec![summary(3, "Visconti")]);
        InvalidationProtocol::plan(&Mutation::FilmCreated(created.clone())).apply(&caches);

        assert_eq!(caches.film_by_id().peek(&CacheKey::id(created.id)), Some(created));
        let d = caches.director_by_id().peek(&CacheKey::id(DirectorId::new(3))).unwrap();
        assert_eq!(d.film_ids, vec![FilmId::new(1), FilmId::new(2)]);
        assert!(caches.directors_all().is_empty());
    }

    #[test]
    fn test_director_created_adds_to_one_film() {
        let caches = registry();
        caches.film_by_id().put(CacheKey::id(FilmId::new(1)), film(1, vec![]));
        caches.film_by_id().put(CacheKey::id(FilmId::new(2)), film(2, vec![]));

        let attached = director(4, "Rossellini", &[1]);
        InvalidationProtocol::plan(&Mutation::DirectorCreated {
            director: attached.clone(),
            film_id: FilmId::new(1),
        })
        .apply(&caches);

        let one = caches.film_by_id().peek(&CacheKey::id(FilmId::new(1))).unwrap();
        assert_eq!(one.directors, vec![attached.summary()]);
        let two = caches.film_by_id().peek(&CacheKey::id(FilmId::new(2))).unwrap();
        assert!(two.directors.is_empty());
        assert_eq!(
            caches.director_by_id().peek(&CacheKey::id(attached.id)),
            Some(attached)
        );
    }

    #[test]
    fn test_detach_scope_depends_on_record_deletion() {
        let caches = registry();
        caches
            .film_by_id()
            .put(CacheKey::id(FilmId::new(1)), film(1, vec![summary(5, "Pasolini")]));
        caches
            .film_by_id()
            .put(CacheKey::id(FilmId::new(2)), film(2, vec![summary(5, "Pasolini")]));

        InvalidationProtocol::plan(&Mutation::DirectorDetached {
            director_id: DirectorId::new(5),
            film_id: FilmId::new(1),
            record_deleted: false,
        })
        .apply(&caches);
        let cached = |id: i64| caches.film_by_id().peek(&CacheKey::id(FilmId::new(id))).unwrap();
        assert!(cached(1).directors.is_empty());
        assert!(cached(2).has_director(DirectorId::new(5)));

        InvalidationProtocol::plan(&Mutation::DirectorDeleted {
            director_id: DirectorId::new(5),
            film_ids: vec![FilmId::new(2)],
        })
        .apply(&caches);
        assert!(cached(2).directors.is_empty());
    }

    #[test]
    fn test_review_patches_hit_both_caches() {
        let caches = registry();
        let key = CacheKey::id(FilmId::new(3));
        let mut cached = film(3, vec![]);
        cached.reviews = vec![review(1, 3, 4)];
        caches.film_by_id().put(key.clone(), cached);
        caches.reviews_by_film().put(key.clone(), vec![review(1, 3, 4)]);

        InvalidationProtocol::plan(&Mutation::ReviewCreated(review(2, 3, 9))).apply(&caches);
        InvalidationProtocol::plan(&Mutation::ReviewUpdated(review(1, 3, 5))).apply(&caches);

        let expected = vec![review(1, 3, 5), review(2, 3, 9)];
        assert_eq!(caches.reviews_by_film().peek(&key), Some(expected.clone()));
        assert_eq!(caches.film_by_id().peek(&key).unwrap().reviews, expected);

        InvalidationProtocol::plan(&Mutation::ReviewDeleted {
            film_id: FilmId::new(3),
            review_id: ReviewId::new(1),
        })
        .apply(&caches);
        assert_eq!(caches.reviews_by_film().peek(&key), Some(vec![review(2, 3, 9)]));
        assert_eq!(caches.film_by_id().peek(&key).unwrap().reviews, vec![review(2, 3, 9)]);
    }

    #[test]
    fn test_review_patch_does_not_populate_missing_list() {
        let caches = registry();
        let film_epoch = caches.film_by_id().epoch();
        let list_epoch = caches.reviews_by_film().epoch();

        InvalidationProtocol::plan(&Mutation::ReviewCreated(review(1, 4, 7))).apply(&caches);
        assert!(caches.reviews_by_film().is_empty());
        assert!(caches.film_by_id().is_empty());
        // Nothing was resident, but an in-flight load of film 4 is now stale.
        assert!(caches.film_by_id().epoch() > film_epoch);
        assert!(caches.reviews_by_film().epoch() > list_epoch);
    }

    #[test]
    fn test_write_through_advances_epoch() {
        let caches = registry();
        let epoch = caches.director_by_id().epoch();
        InvalidationProtocol::plan(&Mutation::DirectorCreated {
            director: director(2, "Germi", &[1]),
            film_id: FilmId::new(1),
        })
        .apply(&caches);
        assert!(!caches.director_by_id().put_if_unchanged(
            CacheKey::id(DirectorId::new(2)),
            director(2, "Germi", &[]),
            epoch
        ));
        let cached = caches.director_by_id().peek(&CacheKey::id(DirectorId::new(2))).unwrap();
        assert_eq!(cached.film_ids, vec![FilmId::new(1)]);
    }

    #[test]
    fn test_patches_keep_store_order_when_applied_out_of_order() {
        let caches = registry();
        let key = CacheKey::id(FilmId::new(3));
        caches.reviews_by_film().put(key.clone(), vec![review(1, 3, 4)]);
        caches
            .director_by_id()
            .put(CacheKey::id(DirectorId::new(8)), director(8, "Olmi", &[1]));

        InvalidationProtocol::plan(&Mutation::ReviewCreated(review(5, 3, 6))).apply(&caches);
        InvalidationProtocol::plan(&Mutation::ReviewCreated(review(4, 3, 2))).apply(&caches);
        let ids: Vec<ReviewId> = caches
            .reviews_by_film()
            .peek(&key)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![ReviewId::new(1), ReviewId::new(4), ReviewId::new(5)]);

        for id in [9, 6] {
            let created = film(id, vec![summary(8, "Olmi")]);
            InvalidationProtocol::plan(&Mutation::FilmCreated(created)).apply(&caches);
        }
        let olmi = caches.director_by_id().peek(&CacheKey::id(DirectorId::new(8))).unwrap();
        assert_eq!(olmi.film_ids, vec![FilmId::new(1), FilmId::new(6), FilmId::new(9)]);
    }

    #[test]
    fn test_director_film_patch_targets() {
        let plan = InvalidationProtocol::plan(&Mutation::FilmDeleted(FilmId::new(2)));
        let targets: Vec<DirectorCache> = plan
            .actions()
            .iter()
            .filter_map(|action| match action {
                CacheAction::PatchDirectorFilms { cache, .. } => Some(*cache),
                _ => None,
            })
            .collect();
        assert_eq!(targets, vec![DirectorCache::ById, DirectorCache::All]);
        assert_eq!(DirectorCache::All.shape(), CacheShape::DirectorsAll);
    }
}
