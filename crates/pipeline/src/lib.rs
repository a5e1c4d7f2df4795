//! Ranking pipeline shared by the content and collaborative recommenders.
//!
//! This crate provides:
//! - `ScoredCandidate` and the `RankContext` filters consult
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - RankAggregator: sort by score, exclude, truncate
//!
//! ## Architecture
//! Both recommenders reduce their output to a flat list of scored keys
//! (catalog rows for content, item ids for collaborative) and hand it to
//! the aggregator:
//! 1. Candidates are ordered by score descending, ties by ascending key
//! 2. The candidate window optionally cuts the ordered list early
//! 3. Filters remove unwanted candidates (the query items themselves)
//! 4. The first `top_n` survivors are returned
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{CandidateWindow, RankAggregator, RankContext, ScoredCandidate};
//!
//! let aggregator = RankAggregator::new(CandidateWindow::Full);
//! let context = RankContext::new([0usize]);
//! let ranked = aggregator.rank(candidates, &context, 5)?;
//! ```

pub mod candidate;
pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod rank;

// Re-export main types
pub use candidate::{RankContext, ScoredCandidate};
pub use traits::Filter;
pub use filter_pipeline::FilterPipeline;
pub use rank::{compare_candidates, CandidateWindow, RankAggregator};
