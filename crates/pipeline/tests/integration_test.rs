//! Integration tests for the pipeline.
//!
//! These tests verify that the aggregator, the exclusion step and extra
//! filters work together the way both recommenders use them.

use anyhow::Result;
use pipeline::filters::ExcludedItemsFilter;
use pipeline::{
    CandidateWindow, Filter, FilterPipeline, RankAggregator, RankContext, ScoredCandidate,
};

/// Drops candidates below a score floor, like a "predicted rating >= x" rule
struct ScoreFloorFilter(f64);

impl Filter<u32> for ScoreFloorFilter {
    fn name(&self) -> &str {
        "ScoreFloorFilter"
    }

    fn apply(
        &self,
        candidates: Vec<ScoredCandidate<u32>>,
        _context: &RankContext<u32>,
    ) -> Result<Vec<ScoredCandidate<u32>>> {
        Ok(candidates.into_iter().filter(|c| c.score >= self.0).collect())
    }
}

/// Predicted ratings for a handful of items; 10 and 20 were liked already
fn create_test_candidates() -> Vec<ScoredCandidate<u32>> {
    vec![
        ScoredCandidate::new(10, 4.9),
        ScoredCandidate::new(20, 4.8),
        ScoredCandidate::new(30, 4.1),
        ScoredCandidate::new(40, 4.1),
        ScoredCandidate::new(50, 2.0),
        ScoredCandidate::new(60, f64::NAN),
    ]
}

#[test]
fn test_collaborative_style_ranking() {
    let aggregator = RankAggregator::new(CandidateWindow::Full);
    let context = RankContext::new([10u32, 20]);

    let ranked = aggregator.rank(create_test_candidates(), &context, 3).unwrap();
    let keys: Vec<u32> = ranked.iter().map(|c| c.key).collect();

    assert_eq!(keys, vec![30, 40, 50]);
    assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_extra_filter_after_exclusion() {
    let aggregator = RankAggregator::new(CandidateWindow::Full).with_filter(ScoreFloorFilter(4.0));
    let context = RankContext::new([10u32]);

    let keys = aggregator
        .rank_keys(create_test_candidates(), &context, 10)
        .unwrap();

    assert_eq!(keys, vec![20, 30, 40]);
}

#[test]
fn test_over_fetch_window_matches_legacy_behaviour() {
    let full = RankAggregator::new(CandidateWindow::Full);
    let windowed = RankAggregator::new(CandidateWindow::OverFetch(2));
    let context = RankContext::new([10u32, 20, 30]);

    // top_n = 2 -> window of 4 holds 10, 20, 30, 40; only 40 survives
    let full_keys = full.rank_keys(create_test_candidates(), &context, 2).unwrap();
    let windowed_keys = windowed
        .rank_keys(create_test_candidates(), &context, 2)
        .unwrap();

    assert_eq!(full_keys, vec![40, 50]);
    assert_eq!(windowed_keys, vec![40]);
}

#[test]
fn test_standalone_pipeline_keeps_order() {
    let pipeline = FilterPipeline::new()
        .add_filter(ExcludedItemsFilter)
        .add_filter(ScoreFloorFilter(3.0));
    let context = RankContext::new([30u32]);

    let filtered = pipeline.apply(create_test_candidates(), &context).unwrap();
    let keys: Vec<u32> = filtered.iter().map(|c| c.key).collect();

    assert_eq!(keys, vec![10, 20, 40]);
}
