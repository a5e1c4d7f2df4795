//! Biased matrix-factorization model ("SVD" in the recommender literature).
//!
//! Prediction: `mu + b_u + b_i + p_u . q_i`, clipped to the rating scale.
//! An unknown user contributes neither `b_u` nor `p_u`, an unknown item
//! neither `b_i` nor `q_i`, so cold-start pairs fall back to the global mean
//! plus whichever bias is known.

use crate::{finish_estimate, ModelError, RatingPredictor, Result};
use data_loader::{ItemId, UserId, MAX_RATING, MIN_RATING};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

/// Bias and latent factors of one user or one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentVector {
    pub bias: f32,
    pub factors: Vec<f32>,
}

impl LatentVector {
    pub fn new(bias: f32, factors: Vec<f32>) -> Self {
        Self { bias, factors }
    }
}

fn default_scale() -> (f32, f32) {
    (MIN_RATING, MAX_RATING)
}

/// A trained latent-factor model.
///
/// The JSON artifact is this struct serialized with `serde_json`; map keys
/// are the user and item ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvdModel {
    pub global_mean: f32,
    #[serde(default = "default_scale")]
    pub rating_scale: (f32, f32),
    pub n_factors: usize,
    #[serde(default)]
    pub users: HashMap<UserId, LatentVector>,
    #[serde(default)]
    pub items: HashMap<ItemId, LatentVector>,
}

impl SvdModel {
    /// Create a model with no users or items; every prediction is the global mean
    pub fn new(global_mean: f32, n_factors: usize) -> Self {
        Self {
            global_mean,
            rating_scale: default_scale(),
            n_factors,
            users: HashMap::new(),
            items: HashMap::new(),
        }
    }

    pub fn with_user(mut self, user_id: UserId, vector: LatentVector) -> Self {
        self.users.insert(user_id, vector);
        self
    }

    pub fn with_item(mut self, item_id: ItemId, vector: LatentVector) -> Self {
        self.items.insert(item_id, vector);
        self
    }

    /// Load and validate a JSON artifact
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading latent-factor model from {:?}", path);
        let reader = BufReader::new(File::open(path)?);
        let model: SvdModel = serde_json::from_reader(reader)?;
        model.validate()?;
        info!(
            "Loaded model with {} users, {} items, {} factors",
            model.users.len(),
            model.items.len(),
            model.n_factors
        );
        Ok(model)
    }

    /// Parse and validate a JSON artifact held in memory
    pub fn from_json(json: &str) -> Result<Self> {
        let model: SvdModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Check the model's shape: finite mean, sane scale, one dimension for all factors
    pub fn validate(&self) -> Result<()> {
        if !self.global_mean.is_finite() {
            return Err(ModelError::InvalidModel("global mean is not finite".to_string()));
        }
        let (low, high) = self.rating_scale;
        if !(low < high) {
            return Err(ModelError::InvalidModel(format!(
                "rating scale ({}, {}) is empty",
                low, high
            )));
        }

        let entities = self
            .users
            .iter()
            .map(|(id, v)| ("user", *id, v))
            .chain(self.items.iter().map(|(id, v)| ("item", *id, v)));
        for (entity, id, vector) in entities {
            if vector.factors.len() != self.n_factors {
                return Err(ModelError::DimensionMismatch {
                    entity,
                    id,
                    expected: self.n_factors,
                    found: vector.factors.len(),
                });
            }
        }
        Ok(())
    }
}

impl RatingPredictor for SvdModel {
    fn name(&self) -> &str {
        "SvdModel"
    }

    fn predict(&self, user_id: UserId, item_id: ItemId) -> Result<f32> {
        let user = self.users.get(&user_id);
        let item = self.items.get(&item_id);

        let mut estimate = self.global_mean;
        if let Some(user) = user {
            estimate += user.bias;
        }
        if let Some(item) = item {
            estimate += item.bias;
        }
        if let (Some(user), Some(item)) = (user, item) {
            if user.factors.len() != item.factors.len() {
                return Err(ModelError::DimensionMismatch {
                    entity: "item",
                    id: item_id,
                    expected: user.factors.len(),
                    found: item.factors.len(),
                });
            }
            let dot: f32 = user
                .factors
                .iter()
                .zip(&item.factors)
                .map(|(p, q)| p * q)
                .sum();
            estimate += dot;
        }

        finish_estimate(estimate, self.rating_scale, user_id, item_id)
    }
}
