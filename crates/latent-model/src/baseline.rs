//! Baseline predictor: global mean plus damped item and user biases.
//!
//! `b_i = sum(r - mu) / (reg_item + n_i)` over the item's ratings, then
//! `b_u = sum(r - mu - b_i) / (reg_user + n_u)` over the user's ratings.
//! Used when no trained latent-factor artifact is configured.

use crate::{finish_estimate, RatingPredictor, Result};
use data_loader::{ItemId, RatingsTable, UserId, MAX_RATING, MIN_RATING};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BaselinePredictor {
    global_mean: f32,
    user_bias: HashMap<UserId, f32>,
    item_bias: HashMap<ItemId, f32>,
    rating_scale: (f32, f32),
}

impl BaselinePredictor {
    /// Default damping, in ratings, for item biases
    pub const DEFAULT_REG_ITEM: f32 = 10.0;
    /// Default damping, in ratings, for user biases
    pub const DEFAULT_REG_USER: f32 = 15.0;

    /// Estimate biases from a ratings table with the default damping
    pub fn from_ratings(ratings: &RatingsTable) -> Self {
        Self::with_regularization(ratings, Self::DEFAULT_REG_ITEM, Self::DEFAULT_REG_USER)
    }

    /// Estimate biases from a ratings table
    ///
    /// An empty table yields the midpoint of the rating scale for every pair.
    pub fn with_regularization(ratings: &RatingsTable, reg_item: f32, reg_user: f32) -> Self {
        let global_mean = ratings
            .global_mean()
            .unwrap_or((MIN_RATING + MAX_RATING) / 2.0);

        let mut item_sums: HashMap<ItemId, (f32, u32)> = HashMap::new();
        for rating in ratings.ratings() {
            let entry = item_sums.entry(rating.item_id).or_insert((0.0, 0));
            entry.0 += rating.rating - global_mean;
            entry.1 += 1;
        }
        let item_bias: HashMap<ItemId, f32> = item_sums
            .into_iter()
            .map(|(item_id, (sum, count))| (item_id, sum / (reg_item + count as f32)))
            .collect();

        let mut user_sums: HashMap<UserId, (f32, u32)> = HashMap::new();
        for rating in ratings.ratings() {
            let b_i = item_bias.get(&rating.item_id).copied().unwrap_or(0.0);
            let entry = user_sums.entry(rating.user_id).or_insert((0.0, 0));
            entry.0 += rating.rating - global_mean - b_i;
            entry.1 += 1;
        }
        let user_bias: HashMap<UserId, f32> = user_sums
            .into_iter()
            .map(|(user_id, (sum, count))| (user_id, sum / (reg_user + count as f32)))
            .collect();

        debug!(
            "Baseline estimated: mean {:.3}, {} item biases, {} user biases",
            global_mean,
            item_bias.len(),
            user_bias.len()
        );

        Self {
            global_mean,
            user_bias,
            item_bias,
            rating_scale: (MIN_RATING, MAX_RATING),
        }
    }

    pub fn global_mean(&self) -> f32 {
        self.global_mean
    }
}

impl RatingPredictor for BaselinePredictor {
    fn name(&self) -> &str {
        "BaselinePredictor"
    }

    fn predict(&self, user_id: UserId, item_id: ItemId) -> Result<f32> {
        let estimate = self.global_mean
            + self.user_bias.get(&user_id).copied().unwrap_or(0.0)
            + self.item_bias.get(&item_id).copied().unwrap_or(0.0);
        finish_estimate(estimate, self.rating_scale, user_id, item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Rating;

    fn create_test_table() -> RatingsTable {
        RatingsTable::from_ratings(vec![
            Rating { user_id: 1, item_id: 10, rating: 5.0 },
            Rating { user_id: 1, item_id: 20, rating: 4.0 },
            Rating { user_id: 2, item_id: 10, rating: 4.0 },
            Rating { user_id: 2, item_id: 20, rating: 1.0 },
        ])
    }

    #[test]
    fn test_unregularized_biases() {
        let predictor = BaselinePredictor::with_regularization(&create_test_table(), 0.0, 0.0);

        // mu = 3.5, b_10 = 1.0, b_20 = -1.0
        // b_1 = ((5 - 3.5 - 1) + (4 - 3.5 + 1)) / 2 = 1.0
        assert!((predictor.global_mean() - 3.5).abs() < 1e-6);
        assert!((predictor.predict(1, 10).unwrap() - 5.0).abs() < 1e-6);
        assert!((predictor.predict(2, 20).unwrap() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_item_bias_ranks_items() {
        let predictor = BaselinePredictor::from_ratings(&create_test_table());

        let liked = predictor.predict(3, 10).unwrap();
        let disliked = predictor.predict(3, 20).unwrap();
        assert!(liked > disliked);
    }

    #[test]
    fn test_cold_start_is_global_mean() {
        let predictor = BaselinePredictor::from_ratings(&create_test_table());
        assert!((predictor.predict(99, 99).unwrap() - 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_table_uses_scale_midpoint() {
        let predictor = BaselinePredictor::from_ratings(&RatingsTable::new());
        assert!((predictor.predict(1, 1).unwrap() - 2.75).abs() < 1e-6);
    }
}
