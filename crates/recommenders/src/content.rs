//! Content Recommender - "more like these"
//!
//! Ranks the catalog by how similar each item's overview text is to the
//! overviews of the chosen items.
//!
//! ## Algorithm
//! 1. Resolve the chosen titles to catalog rows (unknown titles dropped)
//! 2. Fit TF-IDF over every overview and build the similarity matrix
//!    (once per recommender, then cached)
//! 3. Score every item by its mean similarity to the chosen rows
//! 4. Rank by score, ties by lower catalog row, exclude the chosen rows
//! 5. Return the first `top_n`

use crate::error::{RecommendError, Result};
use crate::selection::resolve_titles;
use crate::similarity::{query_scores, SimilarityMatrix};
use crate::stop_words::StopWords;
use crate::tfidf::{FittedTfidf, TfidfVectorizer};
use crate::{Recommendation, Recommender};
use data_loader::Catalog;
use pipeline::{CandidateWindow, RankAggregator, RankContext, ScoredCandidate};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Vectors and pairwise similarities of the whole catalog
#[derive(Debug)]
pub struct ContentIndex {
    pub tfidf: FittedTfidf,
    pub similarity: SimilarityMatrix,
}

/// Content-based recommender over a shared, read-only catalog
pub struct ContentRecommender {
    catalog: Arc<Catalog>,
    vectorizer: TfidfVectorizer,
    aggregator: RankAggregator<usize>,
    /// Built on first use; the catalog never changes under us
    index: OnceLock<ContentIndex>,
}

impl ContentRecommender {
    /// Create a recommender with 5000 features, English stop words and
    /// full-catalog ranking
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            vectorizer: TfidfVectorizer::new(),
            aggregator: RankAggregator::new(CandidateWindow::Full),
            index: OnceLock::new(),
        }
    }

    /// Configure the vocabulary size (default: 5000)
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.vectorizer = self.vectorizer.with_max_features(max_features);
        self
    }

    /// Configure the stop-word policy (default: English)
    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.vectorizer = self.vectorizer.with_stop_words(stop_words);
        self
    }

    /// Configure how much of the ranking is considered before exclusion
    /// (default: the whole catalog)
    pub fn with_candidate_window(mut self, window: CandidateWindow) -> Self {
        self.aggregator = RankAggregator::new(window);
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Build the cached index now instead of on the first request
    pub fn warm_up(&self) -> Result<()> {
        self.index().map(|_| ())
    }

    /// The cached index, building it if needed
    ///
    /// Two threads racing here both build; one result is kept. Both are
    /// identical, so callers cannot tell.
    pub fn index(&self) -> Result<&ContentIndex> {
        if let Some(index) = self.index.get() {
            return Ok(index);
        }

        let start = Instant::now();
        let overviews = self.catalog.overviews();
        let tfidf = self.vectorizer.fit(&overviews)?;
        let similarity = SimilarityMatrix::from_vectors(tfidf.vectors());
        info!(
            "Built content index: {} items, {} terms in {:?}",
            self.catalog.len(),
            tfidf.dimension(),
            start.elapsed()
        );

        Ok(self.index.get_or_init(|| ContentIndex { tfidf, similarity }))
    }

    /// Rank the catalog against free text (e.g. "space horror crew")
    ///
    /// The text is vectorized with the catalog's vocabulary; nothing is
    /// excluded. Text sharing no term with the vocabulary gives an empty
    /// result.
    #[instrument(skip(self))]
    pub fn recommend_for_text(&self, text: &str, top_n: usize) -> Result<Vec<Recommendation>> {
        if top_n == 0 {
            return Ok(Vec::new());
        }
        let index = self.index()?;

        let query = index.tfidf.transform(text);
        if query.is_zero() {
            debug!("Query text has no known terms");
            return Ok(Vec::new());
        }

        let scores = query_scores(&query, index.tfidf.vectors());
        self.rank(scores, &RankContext::default(), top_n)
    }

    fn rank(
        &self,
        scores: Vec<f64>,
        context: &RankContext<usize>,
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        let candidates: Vec<ScoredCandidate<usize>> = scores
            .into_iter()
            .enumerate()
            .map(|(row, score)| ScoredCandidate::new(row, score))
            .collect();

        let ranked = self.aggregator.rank(candidates, context, top_n)?;
        Ok(ranked
            .into_iter()
            .filter_map(|candidate| {
                let item = self.catalog.get(candidate.key)?;
                Some(Recommendation {
                    item_id: item.id,
                    title: item.title.clone(),
                    genres: item.genres.clone(),
                    score: candidate.score,
                })
            })
            .collect())
    }
}

impl Recommender for ContentRecommender {
    fn name(&self) -> &str {
        "content"
    }

    #[instrument(skip(self, chosen_titles), fields(chosen = chosen_titles.len()))]
    fn recommend_detailed(
        &self,
        chosen_titles: &[String],
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        if top_n == 0 {
            return Ok(Vec::new());
        }
        if self.catalog.is_empty() {
            return Err(RecommendError::EmptyCatalog);
        }

        let selection = resolve_titles(&self.catalog, chosen_titles);
        debug!(
            "Resolved {} catalog rows ({} titles unresolved)",
            selection.rows.len(),
            selection.unresolved.len()
        );
        if selection.is_empty() {
            return Ok(Vec::new());
        }

        let index = self.index()?;
        let rows = selection.rows();
        let Some(scores) = index.similarity.mean_of_rows(&rows) else {
            return Ok(Vec::new());
        };

        let context = RankContext::new(rows);
        let recommendations = self.rank(scores, &context, top_n)?;
        debug!("Returning {} content recommendations", recommendations.len());
        Ok(recommendations)
    }
}
