//! Candidate and context types passed through the pipeline.

use std::collections::HashSet;
use std::hash::Hash;

/// A key with the score a recommender assigned to it.
///
/// `K` is whatever identifies a candidate to its recommender: a catalog row
/// for content scoring, an item id for collaborative scoring. A NaN score
/// means "no usable score" and ranks below every real score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate<K> {
    pub key: K,
    pub score: f64,
}

impl<K> ScoredCandidate<K> {
    pub fn new(key: K, score: f64) -> Self {
        Self { key, score }
    }
}

/// Per-request state shared by every filter in a pipeline
#[derive(Debug, Clone)]
pub struct RankContext<K> {
    /// Keys that must never appear in the output
    pub excluded: HashSet<K>,
}

impl<K: Eq + Hash> RankContext<K> {
    pub fn new(excluded: impl IntoIterator<Item = K>) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
        }
    }

    pub fn is_excluded(&self, key: &K) -> bool {
        self.excluded.contains(key)
    }
}

impl<K: Eq + Hash> Default for RankContext<K> {
    fn default() -> Self {
        Self {
            excluded: HashSet::new(),
        }
    }
}
