//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to ranked candidate lists.

use crate::candidate::{RankContext, ScoredCandidate};
use anyhow::Result;

/// Core trait for filtering candidates.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Contract
/// - `Send + Sync` allows filters to be shared across worker threads
/// - Filters take ownership of the Vec and return a filtered Vec
/// - Filters must keep the relative order of the candidates they keep;
///   the aggregator sorts once, before filtering
pub trait Filter<K>: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    ///
    /// # Arguments
    /// * `candidates` - The candidates to filter (takes ownership)
    /// * `context` - Request context holding the excluded keys
    fn apply(
        &self,
        candidates: Vec<ScoredCandidate<K>>,
        context: &RankContext<K>,
    ) -> Result<Vec<ScoredCandidate<K>>>;
}
