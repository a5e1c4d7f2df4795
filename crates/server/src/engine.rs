//! # Recommendation Engine
//!
//! Owns the read-only snapshot (catalog, ratings, rating predictor) and the
//! two recommenders built over it:
//! 1. Load catalog and ratings (optionally restricted to the most active users)
//! 2. Load the trained model, or estimate a baseline from the ratings
//! 3. Build both recommenders sharing the snapshot through `Arc`
//! 4. Optionally warm the content index
//!
//! Requests are synchronous and CPU-bound. The async entry point runs them
//! on tokio's blocking pool so concurrent callers never stall the runtime.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::EngineConfig;
use data_loader::{Catalog, RatingsTable};
use latent_model::{BaselinePredictor, RatingPredictor, SvdModel};
use recommenders::{CollaborativeRecommender, ContentRecommender, Recommendation, Recommender};

/// Which recommender answers a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Content,
    Collaborative,
}

#[derive(Error, Debug)]
#[error("Unknown strategy '{0}', expected 'content' or 'collaborative'")]
pub struct StrategyParseError(String);

impl FromStr for Strategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "content" | "content-based" => Ok(Strategy::Content),
            "collaborative" | "collaborative-based" => Ok(Strategy::Collaborative),
            _ => Err(StrategyParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Content => write!(f, "content"),
            Strategy::Collaborative => write!(f, "collaborative"),
        }
    }
}

/// Entry point for the UI layer: both strategies over one shared snapshot
#[derive(Clone)]
pub struct RecommendationEngine {
    catalog: Arc<Catalog>,
    ratings: Arc<RatingsTable>,
    content: Arc<ContentRecommender>,
    collaborative: Arc<CollaborativeRecommender>,
    default_top_n: usize,
}

impl RecommendationEngine {
    /// Build the engine from already-loaded collaborators
    pub fn new(
        catalog: Arc<Catalog>,
        ratings: Arc<RatingsTable>,
        predictor: Arc<dyn RatingPredictor>,
        config: &EngineConfig,
    ) -> Self {
        let content = ContentRecommender::new(catalog.clone())
            .with_max_features(config.content.max_features)
            .with_stop_words(config.content.stop_words.clone())
            .with_candidate_window(config.content.candidate_window);

        let collaborative =
            CollaborativeRecommender::new(catalog.clone(), ratings.clone(), predictor)
                .with_like_threshold(config.collaborative.like_threshold)
                .with_aggregation(config.collaborative.aggregation)
                .with_candidate_window(config.collaborative.candidate_window);

        Self {
            catalog,
            ratings,
            content: Arc::new(content),
            collaborative: Arc::new(collaborative),
            default_top_n: config.default_top_n,
        }
    }

    /// Load every input named in the configuration and build the engine
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let start = Instant::now();

        let catalog = Catalog::load_from_csv(&config.data.catalog_path)
            .context("Failed to load catalog")?;

        let mut ratings = RatingsTable::load_from_csv(&config.data.ratings_path)
            .context("Failed to load ratings")?;
        if let Some(n) = config.collaborative.most_active_users {
            ratings = ratings.restrict_to_most_active(n);
            info!("Restricted ratings to the {} most active users ({} ratings)", n, ratings.len());
        }

        let predictor: Arc<dyn RatingPredictor> = match &config.data.model_path {
            Some(path) => Arc::new(
                SvdModel::load(path).with_context(|| format!("Failed to load model {:?}", path))?,
            ),
            None => {
                info!("No model configured, estimating baseline predictor from ratings");
                Arc::new(BaselinePredictor::from_ratings(&ratings))
            }
        };

        let engine = Self::new(Arc::new(catalog), Arc::new(ratings), predictor, config);
        if config.warm_up {
            engine.warm_up()?;
        }

        info!("Engine ready in {:?}", start.elapsed());
        Ok(engine)
    }

    /// Build the content index now
    pub fn warm_up(&self) -> Result<()> {
        self.content
            .warm_up()
            .context("Failed to build content index")
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn ratings(&self) -> &Arc<RatingsTable> {
        &self.ratings
    }

    pub fn default_top_n(&self) -> usize {
        self.default_top_n
    }

    pub fn content(&self) -> &ContentRecommender {
        &self.content
    }

    fn recommender(&self, strategy: Strategy) -> &dyn Recommender {
        match strategy {
            Strategy::Content => self.content.as_ref(),
            Strategy::Collaborative => self.collaborative.as_ref(),
        }
    }

    /// Titles most similar in content to the chosen ones
    pub fn content_recommend(&self, chosen_titles: &[String], top_n: usize) -> Result<Vec<String>> {
        Ok(self.content.recommend(chosen_titles, top_n)?)
    }

    /// Titles the chosen ones' fans are predicted to rate highest
    pub fn collaborative_recommend(
        &self,
        chosen_titles: &[String],
        top_n: usize,
    ) -> Result<Vec<String>> {
        Ok(self.collaborative.recommend(chosen_titles, top_n)?)
    }

    /// Scored recommendations from either strategy
    pub fn recommend(
        &self,
        strategy: Strategy,
        chosen_titles: &[String],
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        let start = Instant::now();
        let recommender = self.recommender(strategy);

        let recommendations = recommender
            .recommend_detailed(chosen_titles, top_n)
            .with_context(|| format!("{} recommendation failed", recommender.name()))?;

        info!(
            "{} strategy returned {} of {} requested in {:.2?}",
            strategy,
            recommendations.len(),
            top_n,
            start.elapsed()
        );
        Ok(recommendations)
    }

    /// `recommend` on the blocking pool, for async callers
    pub async fn recommend_async(
        &self,
        strategy: Strategy,
        chosen_titles: Vec<String>,
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.recommend(strategy, &chosen_titles, top_n))
            .await
            .context("Recommendation task panicked")?
    }
}
