//! Rating prediction over a trained latent-factor model.
//!
//! This crate is the model collaborator of the collaborative recommender.
//! It provides:
//! - The `RatingPredictor` trait: `predict(user, item) -> rating`
//! - `SvdModel`: a biased matrix-factorization model loaded from a JSON artifact
//! - `BaselinePredictor`: global mean plus user/item biases, for when no
//!   trained artifact is available
//!
//! Training the factorization itself is not done here; artifacts come from
//! the surrounding application.

pub mod baseline;
pub mod svd;

use data_loader::{ItemId, UserId};
use thiserror::Error;

pub use baseline::BaselinePredictor;
pub use svd::{LatentVector, SvdModel};

/// Errors that can occur when loading a model or predicting with it
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed model artifact: {0}")]
    Json(#[from] serde_json::Error),

    /// A factor vector does not have the model's dimension
    #[error("{entity} {id} has {found} latent factors, expected {expected}")]
    DimensionMismatch {
        entity: &'static str,
        id: u32,
        expected: usize,
        found: usize,
    },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// The model produced NaN or infinity for a pair
    #[error("Non-finite prediction for user {user_id}, item {item_id}")]
    NonFinite { user_id: UserId, item_id: ItemId },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ModelError>;

/// Estimates how a user would rate an item.
///
/// Implementations are pure functions of their state. Users or items the
/// model has never seen still get a best-effort estimate; an `Err` means the
/// pair could not be scored and callers are expected to skip it.
pub trait RatingPredictor: Send + Sync {
    /// Returns the name of this predictor (for logging)
    fn name(&self) -> &str;

    fn predict(&self, user_id: UserId, item_id: ItemId) -> Result<f32>;
}

/// Clamp an estimate into the rating scale, rejecting NaN and infinity
///
/// The scale is checked here as well as in `SvdModel::validate`, since a
/// deserialized model can reach `predict` without being validated.
pub(crate) fn finish_estimate(
    estimate: f32,
    scale: (f32, f32),
    user_id: UserId,
    item_id: ItemId,
) -> Result<f32> {
    let (low, high) = scale;
    if !(low < high) {
        return Err(ModelError::InvalidModel(format!(
            "rating scale ({}, {}) is empty",
            low, high
        )));
    }
    if !estimate.is_finite() {
        return Err(ModelError::NonFinite { user_id, item_id });
    }
    Ok(estimate.clamp(low, high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_estimate_clamps() {
        assert_eq!(finish_estimate(6.3, (0.5, 5.0), 1, 1).unwrap(), 5.0);
        assert_eq!(finish_estimate(-1.0, (0.5, 5.0), 1, 1).unwrap(), 0.5);
        assert_eq!(finish_estimate(3.25, (0.5, 5.0), 1, 1).unwrap(), 3.25);
    }

    #[test]
    fn test_finish_estimate_rejects_nan() {
        let err = finish_estimate(f32::NAN, (0.5, 5.0), 7, 9).unwrap_err();
        assert!(matches!(err, ModelError::NonFinite { user_id: 7, item_id: 9 }));
    }

    #[test]
    fn test_finish_estimate_rejects_inverted_scale() {
        let err = finish_estimate(3.0, (5.0, 0.5), 1, 1).unwrap_err();
        assert!(matches!(err, ModelError::InvalidModel(_)));

        let err = finish_estimate(3.0, (f32::NAN, 5.0), 1, 1).unwrap_err();
        assert!(matches!(err, ModelError::InvalidModel(_)));
    }
}
