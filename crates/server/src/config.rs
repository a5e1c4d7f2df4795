//! Engine configuration.
//!
//! Defaults are compiled in; an optional file (TOML, JSON, YAML... anything
//! the `config` crate reads) overrides them, and `CINEMATCH_*` environment
//! variables override the file. Nested keys use `__`:
//!
//! ```text
//! CINEMATCH_DEFAULT_TOP_N=10
//! CINEMATCH_CONTENT__MAX_FEATURES=3000
//! CINEMATCH_COLLABORATIVE__AGGREGATION=mean
//! CINEMATCH_DATA__MODEL_PATH=resources/models/svd.json
//! ```

use anyhow::{Context, Result};
use pipeline::CandidateWindow;
use recommenders::{ScoreAggregation, StopWords};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "CINEMATCH";

/// Where the engine reads its inputs from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub catalog_path: PathBuf,
    pub ratings_path: PathBuf,
    /// Trained latent-factor artifact; the baseline predictor is used when unset
    pub model_path: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("resources/data/content_data_clean.csv"),
            ratings_path: PathBuf::from("resources/data/ratings.csv"),
            model_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub max_features: usize,
    pub stop_words: StopWords,
    pub candidate_window: CandidateWindow,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            stop_words: StopWords::English,
            candidate_window: CandidateWindow::Full,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaborativeConfig {
    pub like_threshold: f32,
    pub aggregation: ScoreAggregation,
    /// Keep only the ratings of this many most active users
    pub most_active_users: Option<usize>,
    pub candidate_window: CandidateWindow,
}

impl Default for CollaborativeConfig {
    fn default() -> Self {
        Self {
            like_threshold: 4.0,
            aggregation: ScoreAggregation::Max,
            most_active_users: None,
            candidate_window: CandidateWindow::Full,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_top_n: usize,
    /// Build the similarity matrix at start-up instead of on the first request
    pub warm_up: bool,
    pub data: DataConfig,
    pub content: ContentConfig,
    pub collaborative: CollaborativeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_top_n: 5,
            warm_up: true,
            data: DataConfig::default(),
            content: ContentConfig::default(),
            collaborative: CollaborativeConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults, then `path` (if any), then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::build(path, environment())
    }

    fn build(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(env)
            .build()
            .with_context(|| format!("Failed to read configuration {:?}", path))?;

        let config: EngineConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_top_n == 0 {
            anyhow::bail!("default_top_n must be greater than 0");
        }
        if self.content.max_features == 0 {
            anyhow::bail!("content.max_features must be greater than 0");
        }
        if !self.collaborative.like_threshold.is_finite() {
            anyhow::bail!("collaborative.like_threshold must be a number");
        }
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(source))
    }

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::build(None, env(&[])).unwrap();

        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.default_top_n, 5);
        assert_eq!(config.content.max_features, 5000);
        assert_eq!(config.collaborative.like_threshold, 4.0);
        assert_eq!(config.collaborative.aggregation, ScoreAggregation::Max);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = write_temp(
            "engine.toml",
            r#"
default_top_n = 10

[content]
max_features = 300
candidate_window = { over_fetch = 2 }

[collaborative]
aggregation = "mean"
most_active_users = 500

[data]
model_path = "models/svd.json"
"#,
        );

        let config = EngineConfig::build(Some(&path), env(&[])).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.default_top_n, 10);
        assert_eq!(config.content.max_features, 300);
        assert_eq!(config.content.candidate_window, CandidateWindow::OverFetch(2));
        assert_eq!(config.collaborative.aggregation, ScoreAggregation::Mean);
        assert_eq!(config.collaborative.most_active_users, Some(500));
        assert_eq!(config.data.model_path, Some(PathBuf::from("models/svd.json")));
        // Untouched keys keep their defaults
        assert_eq!(config.collaborative.like_threshold, 4.0);
        assert_eq!(config.data.ratings_path, DataConfig::default().ratings_path);
    }

    #[test]
    fn test_environment_overrides() {
        let config = EngineConfig::build(
            None,
            env(&[
                ("CINEMATCH_DEFAULT_TOP_N", "8"),
                ("CINEMATCH_COLLABORATIVE__LIKE_THRESHOLD", "3.5"),
                ("CINEMATCH_CONTENT__STOP_WORDS", "none"),
            ]),
        )
        .unwrap();

        assert_eq!(config.default_top_n, 8);
        assert_eq!(config.collaborative.like_threshold, 3.5);
        assert_eq!(config.content.stop_words, StopWords::None);
    }

    #[test]
    fn test_rejects_zero_top_n() {
        let err = EngineConfig::build(None, env(&[("CINEMATCH_DEFAULT_TOP_N", "0")]));
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("does/not/exist.toml");
        assert!(EngineConfig::build(Some(path), env(&[])).is_err());
    }
}
