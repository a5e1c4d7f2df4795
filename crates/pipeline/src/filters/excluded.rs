//! Filter to remove the items a request was built from.
//!
//! A user never wants the movies they picked (or already rated highly)
//! recommended back to them, so this is the one filter every
//! `RankAggregator` starts with.

use crate::candidate::{RankContext, ScoredCandidate};
use crate::traits::Filter;
use anyhow::Result;
use std::hash::Hash;

/// Removes candidates whose key is in `RankContext::excluded`.
///
/// ## Algorithm
/// Uses the HashSet in the context for O(1) lookups.
pub struct ExcludedItemsFilter;

impl<K> Filter<K> for ExcludedItemsFilter
where
    K: Eq + Hash + Send + Sync,
{
    fn name(&self) -> &str {
        "ExcludedItemsFilter"
    }

    fn apply(
        &self,
        candidates: Vec<ScoredCandidate<K>>,
        context: &RankContext<K>,
    ) -> Result<Vec<ScoredCandidate<K>>> {
        let filtered: Vec<ScoredCandidate<K>> = candidates
            .into_iter()
            .filter(|candidate| !context.is_excluded(&candidate.key))
            .collect();
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_items_filter() {
        let context = RankContext::new([100u32, 200]);

        let candidates = vec![
            ScoredCandidate::new(100, 0.9),
            ScoredCandidate::new(101, 0.8),
            ScoredCandidate::new(200, 0.7),
            ScoredCandidate::new(300, 0.6),
        ];

        let filtered = ExcludedItemsFilter.apply(candidates, &context).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].key, 101);
        assert_eq!(filtered[1].key, 300);
    }

    #[test]
    fn test_nothing_excluded() {
        let context: RankContext<usize> = RankContext::default();
        let candidates = vec![ScoredCandidate::new(0usize, 1.0), ScoredCandidate::new(1, 0.5)];

        let filtered = ExcludedItemsFilter.apply(candidates.clone(), &context).unwrap();
        assert_eq!(filtered, candidates);
    }
}
