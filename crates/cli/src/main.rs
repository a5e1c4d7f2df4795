use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::ItemId;
use rand::Rng;
use recommenders::Recommendation;
use server::{EngineConfig, RecommendationEngine, Strategy};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// CineMatch - Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "cinematch")]
#[command(about = "Movie recommendations from content similarity or collaborative filtering", long_about = None)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML); CINEMATCH_* variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog CSV (movieId,title,genres,cleaned_overview)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Ratings CSV (userId,movieId,rating)
    #[arg(long)]
    ratings: Option<PathBuf>,

    /// Trained latent-factor model (JSON); a baseline is estimated when absent
    #[arg(long)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend movies from three favourites
    Recommend {
        /// content or collaborative
        #[arg(long, default_value = "content")]
        strategy: Strategy,

        /// A favourite movie title (repeat three times)
        #[arg(long = "movie", required = true)]
        movies: Vec<String>,

        /// Number of recommendations to return
        #[arg(long)]
        top_n: Option<usize>,

        /// Show scores and genres for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Search for movies by title words and genres
    Search {
        /// Words that must all appear in the title (case-insensitive)
        #[arg(long, default_value = "")]
        title: String,

        /// Words that must all appear in the genres, e.g. "comedy drama"
        #[arg(long, default_value = "")]
        genre: String,
    },

    /// Recommend movies matching a free-text description
    Describe {
        /// Words describing the movie, e.g. "space horror crew"
        #[arg(long)]
        text: String,

        #[arg(long)]
        top_n: Option<usize>,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,

        #[arg(long, default_value = "content")]
        strategy: Strategy,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.catalog {
        config.data.catalog_path = path;
    }
    if let Some(path) = cli.ratings {
        config.data.ratings_path = path;
    }
    if let Some(path) = cli.model {
        config.data.model_path = Some(path);
    }

    // Load the catalog, ratings and model (this may take a moment)
    println!("Loading data from {}...", config.data.catalog_path.display());
    let start = Instant::now();
    let engine = tokio::task::spawn_blocking(move || RecommendationEngine::from_config(&config))
        .await
        .context("Loading task panicked")?
        .context("Failed to load recommendation engine")?;
    println!("{} Engine ready in {:?}", "✓".green(), start.elapsed());
    info!(
        "Engine loaded: {} items, {} ratings",
        engine.catalog().len(),
        engine.ratings().len()
    );

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            strategy,
            movies,
            top_n,
            explain,
        } => handle_recommend(&engine, strategy, movies, top_n, explain).await?,
        Commands::Search { title, genre } => handle_search(&engine, &title, &genre)?,
        Commands::Describe { text, top_n } => handle_describe(&engine, &text, top_n)?,
        Commands::Benchmark {
            requests,
            concurrent,
            strategy,
        } => handle_benchmark(engine, requests, concurrent, strategy).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    engine: &RecommendationEngine,
    strategy: Strategy,
    movies: Vec<String>,
    top_n: Option<usize>,
    explain: bool,
) -> Result<()> {
    if movies.len() != 3 {
        println!(
            "{} expected three favourites, got {}",
            "!".yellow(),
            movies.len()
        );
    }
    for title in &movies {
        if !engine.catalog().lookup_title(title).is_found() {
            println!("{} '{}' is not in the catalog and will be ignored", "!".yellow(), title);
        }
    }

    let top_n = top_n.unwrap_or(engine.default_top_n());
    let recommendations = engine.recommend_async(strategy, movies, top_n).await?;

    if recommendations.is_empty() {
        println!("{}", "Not enough data to recommend anything for these movies.".yellow());
        return Ok(());
    }
    print_recommendations(&recommendations, strategy, explain);
    Ok(())
}

/// Handle the 'search' command
fn handle_search(engine: &RecommendationEngine, title: &str, genre: &str) -> Result<()> {
    if title.trim().is_empty() && genre.trim().is_empty() {
        bail!("give --title, --genre or both");
    }

    let title_lower = title.trim().to_lowercase();
    let ratings = engine.ratings();
    let mut matches: Vec<(ItemId, &str, &[String], f32, u32, u8)> = Vec::new();

    for item in engine.catalog().filter(title, genre) {
        // Exact title first
        let relevance = if item.title.to_lowercase() == title_lower { 0 } else { 1 };

        let stats = ratings.get_item_stats(item.id);
        matches.push((
            item.id,
            item.title.as_str(),
            item.genres.as_slice(),
            stats.map(|s| s.avg_rating).unwrap_or(0.0),
            stats.map(|s| s.rating_count).unwrap_or(0),
            relevance,
        ));
    }

    // Sort by relevance (exact match first), then by average rating
    matches.sort_by(|a, b| {
        a.5.cmp(&b.5)
            .then_with(|| b.3.total_cmp(&a.3))
            .then_with(|| a.0.cmp(&b.0))
    });

    info!("Search matched {} items", matches.len());
    println!(
        "{}",
        format!("Search results for title '{}', genre '{}':", title, genre).bold().blue()
    );
    if matches.is_empty() {
        println!("  no matches");
    }
    for (item_id, item_title, genres, avg_rating, rating_count, _) in matches.iter().take(20) {
        println!(
            "{}: {} [{}] avg {:.2} ({} ratings)",
            item_id,
            item_title,
            genres.join(", "),
            avg_rating,
            rating_count
        );
    }
    Ok(())
}

/// Handle the 'describe' command
fn handle_describe(engine: &RecommendationEngine, text: &str, top_n: Option<usize>) -> Result<()> {
    let top_n = top_n.unwrap_or(engine.default_top_n());
    let recommendations = engine.content().recommend_for_text(text, top_n)?;

    if recommendations.is_empty() {
        println!("{}", "No catalog movie shares a word with that description.".yellow());
        return Ok(());
    }
    print_recommendations(&recommendations, Strategy::Content, true);
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    engine: RecommendationEngine,
    requests: usize,
    concurrent: usize,
    strategy: Strategy,
) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be greater than 0");
    }
    let items = engine.catalog().items();
    if items.is_empty() {
        bail!("catalog is empty");
    }

    // Random favourite trios drawn from the catalog
    let trios: Vec<Vec<String>> = {
        let mut rng = rand::rng();
        (0..requests)
            .map(|_| {
                (0..3)
                    .map(|_| items[rng.random_range(0..items.len())].title.clone())
                    .collect()
            })
            .collect()
    };

    let top_n = engine.default_top_n();
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();

    let mut handles = vec![];
    for chosen in trios {
        let engine = engine.clone();
        let permits = permits.clone();
        let handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            engine.recommend_async(strategy, chosen, top_n).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    // Wait for all tasks to complete and collect timings
    let mut timings: Vec<Duration> = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let sum: Duration = timings.iter().sum();
    let avg_latency = sum / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p).round() as usize];
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", format!("Benchmark results ({} strategy):", strategy).bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[Recommendation], strategy: Strategy, explain: bool) {
    println!("{}", format!("Movie Recommendations ({}):", strategy).bold().blue());
    for (i, rec) in recommendations.iter().enumerate() {
        println!("{}. {}", (i + 1).to_string().green(), rec.title);
        if explain {
            let score_label = match strategy {
                Strategy::Content => "similarity",
                Strategy::Collaborative => "predicted rating",
            };
            println!("   Genres: {}", rec.genres.join(", "));
            println!("   {}: {:.3}", score_label, rec.score);
        }
    }
}
