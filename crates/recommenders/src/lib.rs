//! # Recommenders Crate
//!
//! The two recommendation strategies and the text machinery behind them.
//!
//! ## Components
//!
//! ### Content Recommender
//! "Movies whose descriptions read like the ones you picked":
//! - TF-IDF vectors over the cleaned overview text
//! - Cosine similarity matrix, built once and cached
//! - Mean similarity to the chosen movies, ranked
//!
//! ### Collaborative Recommender
//! "Users who liked what you picked would also rate these highly":
//! - Neighbor users: everyone who rated a chosen movie at or above the threshold
//! - Candidates: everything those neighbors rated
//! - Score: predicted rating from the latent-factor model, aggregated over neighbors
//!
//! ## Example Usage
//!
//! ```ignore
//! use recommenders::{ContentRecommender, Recommender};
//! use std::sync::Arc;
//!
//! let content = ContentRecommender::new(Arc::new(catalog));
//! let chosen = vec!["Toy Story (1995)".to_string(), "Up (2009)".to_string()];
//! let titles = content.recommend(&chosen, 5)?;
//! ```

pub mod error;
pub mod stop_words;
pub mod tfidf;
pub mod similarity;
pub mod selection;
pub mod content;
pub mod collaborative;

use data_loader::ItemId;
use serde::{Deserialize, Serialize};

pub use collaborative::{CollaborativeRecommender, ScoreAggregation};
pub use content::ContentRecommender;
pub use error::{RecommendError, Result};
pub use selection::{resolve_titles, Selection};
pub use similarity::{cosine_similarity, query_scores, SimilarityMatrix};
pub use stop_words::StopWords;
pub use tfidf::{FittedTfidf, SparseVector, TfidfVectorizer};

/// One recommended item with the score it was ranked by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub title: String,
    pub genres: Vec<String>,
    /// Mean cosine similarity (content) or aggregated predicted rating
    /// (collaborative)
    pub score: f64,
}

/// A strategy that turns a handful of liked titles into ranked titles.
///
/// ## Contract
/// - Unknown titles are ignored, never an error
/// - The chosen items never come back in the result
/// - At most `top_n` results, best first; an empty list means "not enough data"
/// - Calling twice with the same input gives the same output
pub trait Recommender: Send + Sync {
    /// Returns the name of this strategy (for logging)
    fn name(&self) -> &str;

    /// Ranked recommendations with their scores
    fn recommend_detailed(
        &self,
        chosen_titles: &[String],
        top_n: usize,
    ) -> Result<Vec<Recommendation>>;

    /// Ranked titles only
    fn recommend(&self, chosen_titles: &[String], top_n: usize) -> Result<Vec<String>> {
        Ok(self
            .recommend_detailed(chosen_titles, top_n)?
            .into_iter()
            .map(|rec| rec.title)
            .collect())
    }
}
