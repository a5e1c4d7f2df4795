//! Simple test harness for the recommendation engine.
//!
//! Loads the configured dataset, then asks both strategies for
//! recommendations for the titles given on the command line (or a default
//! trio) and logs the results.
//!
//! Usage: `server [CONFIG_FILE] [TITLE...]`

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use server::{EngineConfig, RecommendationEngine, Strategy};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server=debug,recommenders=debug,pipeline=debug".into()),
        )
        .init();

    info!("Starting CineMatch engine test harness");

    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from);
    let mut chosen: Vec<String> = args.collect();
    if chosen.is_empty() {
        chosen = vec![
            "Toy Story (1995)".to_string(),
            "Jumanji (1995)".to_string(),
            "Heat (1995)".to_string(),
        ];
    }

    let config = EngineConfig::load(config_path.as_deref())?;
    info!("Loading engine from {:?}", config.data);
    let engine = tokio::task::spawn_blocking(move || RecommendationEngine::from_config(&config))
        .await??;

    let top_n = engine.default_top_n();
    for strategy in [Strategy::Content, Strategy::Collaborative] {
        let recommendations = engine.recommend_async(strategy, chosen.clone(), top_n).await?;

        info!("{} recommendations for {:?}:", strategy, chosen);
        if recommendations.is_empty() {
            info!("   (not enough data)");
        }
        for (i, rec) in recommendations.iter().enumerate() {
            info!("{}. {} - Score: {:.3}", i + 1, rec.title, rec.score);
            info!("   Genres: {}", rec.genres.join(", "));
        }
    }

    Ok(())
}
