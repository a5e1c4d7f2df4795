//! Rank aggregation: the last step of every recommendation.
//!
//! Given per-candidate scores, the aggregator orders candidates by score
//! descending (ties by ascending key), drops excluded keys, and keeps the
//! first `top_n`. The ordering is total: NaN scores sort after every real
//! score, so the result is deterministic for any input.

use crate::candidate::{RankContext, ScoredCandidate};
use crate::filter_pipeline::FilterPipeline;
use crate::filters::ExcludedItemsFilter;
use crate::traits::Filter;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::Hash;
use tracing::debug;

/// How much of the ordered candidate list is considered before exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateWindow {
    /// Rank every candidate, exclude, then truncate. Always returns
    /// `min(top_n, candidates - excluded)` results.
    #[default]
    Full,
    /// Keep only the first `top_n * factor` candidates before exclusion.
    /// May return fewer than `top_n` results when excluded keys rank high.
    OverFetch(usize),
}

impl CandidateWindow {
    fn limit(&self, top_n: usize) -> Option<usize> {
        match self {
            CandidateWindow::Full => None,
            CandidateWindow::OverFetch(factor) => Some(top_n.saturating_mul(*factor)),
        }
    }
}

/// Map a score onto the ranking axis; NaN ranks lowest
fn rank_score(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}

/// Total order used for ranking: score descending, then key ascending
pub fn compare_candidates<K: Ord>(a: &ScoredCandidate<K>, b: &ScoredCandidate<K>) -> Ordering {
    rank_score(b.score)
        .total_cmp(&rank_score(a.score))
        .then_with(|| a.key.cmp(&b.key))
}

/// Orders scored candidates and selects the top of the list.
///
/// ## Usage
/// ```ignore
/// let aggregator = RankAggregator::new(CandidateWindow::Full);
/// let top = aggregator.rank(candidates, &RankContext::new(chosen_rows), 5)?;
/// ```
pub struct RankAggregator<K> {
    window: CandidateWindow,
    filters: FilterPipeline<K>,
}

impl<K> RankAggregator<K>
where
    K: Ord + Hash + Send + Sync + 'static,
{
    /// Create an aggregator whose pipeline starts with `ExcludedItemsFilter`
    pub fn new(window: CandidateWindow) -> Self {
        Self {
            window,
            filters: FilterPipeline::new().add_filter(ExcludedItemsFilter),
        }
    }

    /// Append a filter after the exclusion step
    pub fn with_filter(mut self, filter: impl Filter<K> + 'static) -> Self {
        self.filters = self.filters.add_filter(filter);
        self
    }

    pub fn window(&self) -> CandidateWindow {
        self.window
    }

    /// Rank `candidates` and return at most `top_n` of them, best first.
    ///
    /// ## Algorithm
    /// 1. Sort by `compare_candidates`
    /// 2. Cut to the candidate window, if bounded
    /// 3. Run the filter pipeline (exclusion first)
    /// 4. Truncate to `top_n`
    pub fn rank(
        &self,
        mut candidates: Vec<ScoredCandidate<K>>,
        context: &RankContext<K>,
        top_n: usize,
    ) -> Result<Vec<ScoredCandidate<K>>> {
        if top_n == 0 || candidates.is_empty() {
            return Ok(Vec::new());
        }

        let total = candidates.len();
        candidates.sort_by(compare_candidates);

        if let Some(limit) = self.window.limit(top_n) {
            candidates.truncate(limit);
        }

        let mut ranked = self.filters.apply(candidates, context)?;
        ranked.truncate(top_n);

        debug!(
            "Ranked {} candidates into {} results (window {:?}, {} excluded keys)",
            total,
            ranked.len(),
            self.window,
            context.excluded.len()
        );

        Ok(ranked)
    }

    /// Same as `rank`, returning only the keys
    pub fn rank_keys(
        &self,
        candidates: Vec<ScoredCandidate<K>>,
        context: &RankContext<K>,
        top_n: usize,
    ) -> Result<Vec<K>> {
        Ok(self
            .rank(candidates, context, top_n)?
            .into_iter()
            .map(|c| c.key)
            .collect())
    }
}

impl<K> Default for RankAggregator<K>
where
    K: Ord + Hash + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(CandidateWindow::default())
    }
}
