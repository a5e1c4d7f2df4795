//! Server crate for the CineMatch recommendation engine.
//!
//! This crate contains the engine that owns the shared, read-only data
//! snapshot and dispatches requests to the content and collaborative
//! recommenders, plus the configuration it is built from.

pub mod config;
pub mod engine;

pub use config::{CollaborativeConfig, ContentConfig, DataConfig, EngineConfig};
pub use engine::{RecommendationEngine, Strategy, StrategyParseError};
