//! Loading, indexing and validation of the catalog and ratings table.
//!
//! - Parse the CSV files
//! - Build the id/title indices (catalog) and per-user/per-item indices (ratings)
//! - Compute per-item statistics in parallel
//! - Validate data integrity

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

impl Catalog {
    /// Load the content catalog from a CSV file
    ///
    /// Rows with an empty title can never be selected and fail validation.
    pub fn load_from_csv(path: &Path) -> Result<Self> {
        info!("Loading catalog from {:?}", path);

        let items = parser::parse_items_file(path)?;
        let catalog = Catalog::from_items(items)?;
        catalog.validate()?;

        let ambiguous = catalog
            .title_index
            .values()
            .filter(|rows| rows.len() > 1)
            .count();
        if ambiguous > 0 {
            warn!("{} titles are shared by more than one catalog row", ambiguous);
        }

        info!("Loaded {} catalog items", catalog.len());
        Ok(catalog)
    }

    /// Validate data integrity
    ///
    /// Every item must have a non-empty title.
    pub fn validate(&self) -> Result<()> {
        for item in &self.items {
            if item.title.trim().is_empty() {
                return Err(DataLoadError::InvalidValue {
                    field: "title".to_string(),
                    value: format!("<empty> (item {})", item.id),
                });
            }
        }
        Ok(())
    }
}

impl RatingsTable {
    /// Load the ratings table from a CSV file
    pub fn load_from_csv(path: &Path) -> Result<Self> {
        info!("Loading ratings from {:?}", path);

        let ratings = parser::parse_ratings_file(path)?;
        let table = RatingsTable::from_ratings(ratings);
        table.validate()?;

        let (users, items, ratings) = table.counts();
        info!("Loaded {} ratings from {} users over {} items", ratings, users, items);
        Ok(table)
    }

    /// Compute aggregate statistics for all rated items
    pub fn compute_item_stats(&mut self) {
        self.item_stats = self
            .item_ratings
            .par_iter()
            .map(|(&item_id, ratings)| {
                let rating_count = ratings.len() as u32;
                let avg_rating = if rating_count > 0 {
                    let total: f32 = ratings.iter().map(|r| r.rating).sum();
                    total / rating_count as f32
                } else {
                    0.0
                };
                (item_id, ItemStats { avg_rating, rating_count })
            })
            .collect();
    }

    /// Validate data integrity
    ///
    /// Ratings must be finite and inside [MIN_RATING, MAX_RATING].
    pub fn validate(&self) -> Result<()> {
        for rating in &self.ratings {
            if !rating.rating.is_finite()
                || rating.rating < MIN_RATING
                || rating.rating > MAX_RATING
            {
                return Err(DataLoadError::InvalidValue {
                    field: "rating".to_string(),
                    value: rating.rating.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Keep only the ratings of the `n` users with the most ratings
    ///
    /// Ties on rating count go to the lower user id so the subset is
    /// reproducible.
    pub fn restrict_to_most_active(&self, n: usize) -> RatingsTable {
        let mut activity: Vec<(UserId, usize)> = self
            .user_ratings
            .iter()
            .map(|(&user_id, ratings)| (user_id, ratings.len()))
            .collect();
        activity.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        activity.truncate(n);

        let keep: HashSet<UserId> = activity.into_iter().map(|(user_id, _)| user_id).collect();
        RatingsTable::from_ratings(
            self.ratings
                .iter()
                .filter(|rating| keep.contains(&rating.user_id))
                .copied(),
        )
    }
}
