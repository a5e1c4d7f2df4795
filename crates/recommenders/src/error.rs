//! Error types for the recommenders.

use thiserror::Error;

/// Hard failures of a recommendation request.
///
/// Soft conditions (unknown titles, no neighbors, no ratings) are not
/// errors; they shorten or empty the result instead.
#[derive(Error, Debug)]
pub enum RecommendError {
    /// Vectorization was asked to run over zero documents
    #[error("Cannot vectorize an empty catalog")]
    EmptyCatalog,

    /// A filter in the ranking pipeline failed
    #[error(transparent)]
    Ranking(#[from] anyhow::Error),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, RecommendError>;
