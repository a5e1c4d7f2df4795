//! Collaborative Recommender - "people who liked these also like..."
//!
//! ## Algorithm
//! 1. Resolve the chosen titles to item ids (unknown titles dropped)
//! 2. Neighbor users: everyone who rated a chosen item >= `like_threshold`
//! 3. Candidates: every item a neighbor rated, minus the chosen items and
//!    items missing from the catalog
//! 4. Predict a rating for every (neighbor, candidate) pair
//! 5. Aggregate per candidate (max by default), skipping failed predictions
//! 6. Rank by score, ties by lower item id, return the first `top_n`
//!
//! No ratings, or no neighbors, is "not enough data": an empty result.

use crate::error::Result;
use crate::selection::resolve_titles;
use crate::{Recommendation, Recommender};
use data_loader::{Catalog, ItemId, RatingsTable, UserId};
use latent_model::RatingPredictor;
use pipeline::{CandidateWindow, RankAggregator, RankContext, ScoredCandidate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Default rating at or above which a rating counts as "liked"
pub const DEFAULT_LIKE_THRESHOLD: f32 = 4.0;

/// How per-neighbor predictions collapse into one candidate score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAggregation {
    /// Best predicted rating among the neighbors
    #[default]
    Max,
    /// Average predicted rating over the neighbors
    Mean,
}

impl ScoreAggregation {
    /// Collapse predictions; NaN when there is nothing to collapse
    pub fn aggregate(&self, predictions: &[f32]) -> f64 {
        if predictions.is_empty() {
            return f64::NAN;
        }
        match self {
            ScoreAggregation::Max => predictions
                .iter()
                .map(|&p| p as f64)
                .fold(f64::NEG_INFINITY, f64::max),
            ScoreAggregation::Mean => {
                predictions.iter().map(|&p| p as f64).sum::<f64>() / predictions.len() as f64
            }
        }
    }
}

/// Collaborative recommender over shared catalog, ratings and model
pub struct CollaborativeRecommender {
    catalog: Arc<Catalog>,
    ratings: Arc<RatingsTable>,
    predictor: Arc<dyn RatingPredictor>,
    like_threshold: f32,
    aggregation: ScoreAggregation,
    aggregator: RankAggregator<ItemId>,
}

impl CollaborativeRecommender {
    pub fn new(
        catalog: Arc<Catalog>,
        ratings: Arc<RatingsTable>,
        predictor: Arc<dyn RatingPredictor>,
    ) -> Self {
        Self {
            catalog,
            ratings,
            predictor,
            like_threshold: DEFAULT_LIKE_THRESHOLD,
            aggregation: ScoreAggregation::Max,
            aggregator: RankAggregator::new(CandidateWindow::Full),
        }
    }

    /// Configure the liking threshold (default: 4.0)
    pub fn with_like_threshold(mut self, threshold: f32) -> Self {
        self.like_threshold = threshold;
        self
    }

    /// Configure how neighbor predictions are combined (default: max)
    pub fn with_aggregation(mut self, aggregation: ScoreAggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Configure how much of the ranking is considered before exclusion
    /// (default: every candidate)
    pub fn with_candidate_window(mut self, window: CandidateWindow) -> Self {
        self.aggregator = RankAggregator::new(window);
        self
    }

    /// Users who rated any of `items` at or above the threshold, ascending
    fn find_neighbors(&self, items: &BTreeSet<ItemId>) -> BTreeSet<UserId> {
        items
            .iter()
            .flat_map(|&item_id| self.ratings.get_item_ratings(item_id))
            .filter(|rating| rating.rating >= self.like_threshold)
            .map(|rating| rating.user_id)
            .collect()
    }

    /// Items the neighbors rated, minus `chosen` and anything without a title
    fn find_candidates(
        &self,
        neighbors: &BTreeSet<UserId>,
        chosen: &BTreeSet<ItemId>,
    ) -> BTreeSet<ItemId> {
        neighbors
            .iter()
            .flat_map(|&user_id| self.ratings.get_user_ratings(user_id))
            .map(|rating| rating.item_id)
            .filter(|item_id| !chosen.contains(item_id))
            .filter(|&item_id| self.catalog.get_by_id(item_id).is_some())
            .collect()
    }

    /// Score one candidate against every neighbor
    ///
    /// Failed or non-finite predictions are dropped; the rest are aggregated.
    fn score_candidate(&self, item_id: ItemId, neighbors: &[UserId]) -> (f64, usize) {
        let mut skipped = 0;
        let predictions: Vec<f32> = neighbors
            .iter()
            .filter_map(|&user_id| match self.predictor.predict(user_id, item_id) {
                Ok(estimate) if estimate.is_finite() => Some(estimate),
                Ok(_) => {
                    skipped += 1;
                    None
                }
                Err(e) => {
                    debug!("Skipping pair: {}", e);
                    skipped += 1;
                    None
                }
            })
            .collect();
        (self.aggregation.aggregate(&predictions), skipped)
    }
}

impl Recommender for CollaborativeRecommender {
    fn name(&self) -> &str {
        "collaborative"
    }

    #[instrument(skip(self, chosen_titles), fields(chosen = chosen_titles.len()))]
    fn recommend_detailed(
        &self,
        chosen_titles: &[String],
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        if top_n == 0 || self.ratings.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();

        let chosen = resolve_titles(&self.catalog, chosen_titles).item_ids(&self.catalog);
        if chosen.is_empty() {
            debug!("No chosen title resolved");
            return Ok(Vec::new());
        }

        let neighbors = self.find_neighbors(&chosen);
        debug!("Found {} neighbor users", neighbors.len());
        if neighbors.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self.find_candidates(&neighbors, &chosen);
        debug!("Found {} candidate items", candidates.len());

        let neighbors: Vec<UserId> = neighbors.into_iter().collect();
        let scored: Vec<(ScoredCandidate<ItemId>, usize)> = candidates
            .par_iter()
            .map(|&item_id| {
                let (score, skipped) = self.score_candidate(item_id, &neighbors);
                (ScoredCandidate::new(item_id, score), skipped)
            })
            .collect();

        let skipped: usize = scored.iter().map(|(_, skipped)| skipped).sum();
        if skipped > 0 {
            debug!("Skipped {} unusable predictions from {}", skipped, self.predictor.name());
        }

        let context = RankContext::new(chosen);
        let ranked = self.aggregator.rank(
            scored.into_iter().map(|(candidate, _)| candidate).collect(),
            &context,
            top_n,
        )?;

        let recommendations: Vec<Recommendation> = ranked
            .into_iter()
            .filter_map(|candidate| {
                let item = self.catalog.get_by_id(candidate.key)?;
                Some(Recommendation {
                    item_id: item.id,
                    title: item.title.clone(),
                    genres: item.genres.clone(),
                    score: candidate.score,
                })
            })
            .collect();

        debug!(
            "Returning {} collaborative recommendations in {:?}",
            recommendations.len(),
            start.elapsed()
        );
        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Item, Rating};
    use latent_model::{BaselinePredictor, ModelError, SvdModel};
    use std::collections::HashMap;

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn rating(user_id: UserId, item_id: ItemId, rating: f32) -> Rating {
        Rating { user_id, item_id, rating }
    }

    /// Fixed predictions per item; unknown items fail
    struct TablePredictor(HashMap<ItemId, f32>);

    impl RatingPredictor for TablePredictor {
        fn name(&self) -> &str {
            "TablePredictor"
        }

        fn predict(&self, user_id: UserId, item_id: ItemId) -> latent_model::Result<f32> {
            self.0
                .get(&item_id)
                .copied()
                .ok_or(ModelError::NonFinite { user_id, item_id })
        }
    }

    /// Predicts the user id as the rating, to tell max from mean
    struct UserIdPredictor;

    impl RatingPredictor for UserIdPredictor {
        fn name(&self) -> &str {
            "UserIdPredictor"
        }

        fn predict(&self, user_id: UserId, _item_id: ItemId) -> latent_model::Result<f32> {
            Ok(user_id as f32)
        }
    }

    fn create_test_catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::from_items((1..=6).map(|id| Item::new(id, format!("Movie {}", id), "text")))
                .unwrap(),
        )
    }

    /// Users 1 and 2 like movie 1; user 3 dislikes it; movie 99 has no catalog entry
    fn create_test_ratings() -> Arc<RatingsTable> {
        Arc::new(RatingsTable::from_ratings(vec![
            rating(1, 1, 5.0),
            rating(1, 2, 4.0),
            rating(1, 3, 2.0),
            rating(2, 1, 4.0),
            rating(2, 4, 5.0),
            rating(2, 99, 5.0),
            rating(3, 1, 1.0),
            rating(3, 5, 5.0),
        ]))
    }

    fn table_predictor(pairs: &[(ItemId, f32)]) -> Arc<dyn RatingPredictor> {
        Arc::new(TablePredictor(pairs.iter().copied().collect()))
    }

    #[test]
    fn test_neighbors_and_candidates() {
        let recommender = CollaborativeRecommender::new(
            create_test_catalog(),
            create_test_ratings(),
            table_predictor(&[]),
        );
        let chosen: BTreeSet<ItemId> = [1].into_iter().collect();

        let neighbors = recommender.find_neighbors(&chosen);
        assert_eq!(neighbors.into_iter().collect::<Vec<_>>(), vec![1, 2]);

        let neighbors: BTreeSet<UserId> = [1, 2].into_iter().collect();
        let candidates = recommender.find_candidates(&neighbors, &chosen);
        // Movie 5 is only rated by user 3, movie 99 is not in the catalog
        assert_eq!(candidates.into_iter().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_ranks_by_prediction() {
        let recommender = CollaborativeRecommender::new(
            create_test_catalog(),
            create_test_ratings(),
            table_predictor(&[(2, 3.0), (3, 4.5), (4, 4.0)]),
        );

        let result = recommender.recommend(&titles(&["Movie 1"]), 5).unwrap();
        assert_eq!(result, vec!["Movie 3", "Movie 4", "Movie 2"]);

        let result = recommender.recommend(&titles(&["Movie 1"]), 1).unwrap();
        assert_eq!(result, vec!["Movie 3"]);
    }

    #[test]
    fn test_failed_predictions_rank_last() {
        let recommender = CollaborativeRecommender::new(
            create_test_catalog(),
            create_test_ratings(),
            table_predictor(&[(3, 1.0), (4, f32::NAN)]),
        );

        let detailed = recommender
            .recommend_detailed(&titles(&["Movie 1"]), 5)
            .unwrap();
        let ids: Vec<ItemId> = detailed.iter().map(|r| r.item_id).collect();

        // 3 scores 1.0; 2 and 4 have no usable prediction and fall back to id order
        assert_eq!(ids, vec![3, 2, 4]);
        assert!(detailed[1].score.is_nan());
    }

    #[test]
    fn test_max_versus_mean() {
        let catalog = create_test_catalog();
        let ratings = create_test_ratings();

        let max = CollaborativeRecommender::new(catalog.clone(), ratings.clone(), Arc::new(UserIdPredictor));
        let mean = CollaborativeRecommender::new(catalog, ratings, Arc::new(UserIdPredictor))
            .with_aggregation(ScoreAggregation::Mean);

        let chosen = titles(&["Movie 1"]);
        let max_scores = max.recommend_detailed(&chosen, 1).unwrap();
        let mean_scores = mean.recommend_detailed(&chosen, 1).unwrap();

        // Neighbors are users 1 and 2
        assert_eq!(max_scores[0].score, 2.0);
        assert_eq!(mean_scores[0].score, 1.5);
    }

    #[test]
    fn test_like_threshold() {
        let recommender = CollaborativeRecommender::new(
            create_test_catalog(),
            create_test_ratings(),
            table_predictor(&[(5, 5.0)]),
        )
        .with_like_threshold(1.0);

        // User 3 now counts as a neighbor, bringing movie 5 in
        let result = recommender.recommend(&titles(&["Movie 1"]), 1).unwrap();
        assert_eq!(result, vec!["Movie 5"]);
    }

    #[test]
    fn test_insufficient_data() {
        let catalog = create_test_catalog();
        let predictor = table_predictor(&[]);

        let empty = CollaborativeRecommender::new(
            catalog.clone(),
            Arc::new(RatingsTable::new()),
            predictor.clone(),
        );
        assert!(empty.recommend(&titles(&["Movie 1"]), 5).unwrap().is_empty());

        let recommender = CollaborativeRecommender::new(catalog, create_test_ratings(), predictor);
        // Nobody rated movie 6
        assert!(recommender.recommend(&titles(&["Movie 6"]), 5).unwrap().is_empty());
        assert!(recommender.recommend(&titles(&["Unknown"]), 5).unwrap().is_empty());
        assert!(recommender.recommend(&titles(&["Movie 1"]), 0).unwrap().is_empty());
    }

    #[test]
    fn test_with_baseline_predictor() {
        let ratings = create_test_ratings();
        let predictor = Arc::new(BaselinePredictor::from_ratings(&ratings));
        let recommender = CollaborativeRecommender::new(create_test_catalog(), ratings, predictor);

        let chosen = titles(&["Movie 1"]);
        let first = recommender.recommend(&chosen, 3).unwrap();
        let second = recommender.recommend(&chosen, 3).unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert!(!first.contains(&"Movie 1".to_string()));
    }

    #[test]
    fn test_unvalidated_model_does_not_abort_request() {
        // Scale set after construction, so `validate` never ran
        let mut model = SvdModel::new(3.0, 0);
        model.rating_scale = (5.0, 0.5);
        let recommender =
            CollaborativeRecommender::new(create_test_catalog(), create_test_ratings(), Arc::new(model));

        let detailed = recommender
            .recommend_detailed(&titles(&["Movie 1"]), 5)
            .unwrap();
        let ids: Vec<ItemId> = detailed.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert!(detailed.iter().all(|r| r.score.is_nan()));
    }

    #[test]
    fn test_aggregate_empty_is_nan() {
        assert!(ScoreAggregation::Max.aggregate(&[]).is_nan());
        assert!(ScoreAggregation::Mean.aggregate(&[]).is_nan());
        assert_eq!(ScoreAggregation::Mean.aggregate(&[2.0, 4.0]), 3.0);
    }
}
