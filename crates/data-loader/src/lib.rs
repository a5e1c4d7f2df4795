//! # Data Loader Crate
//!
//! Loads and indexes the two read-only inputs of the recommendation engine:
//! the content catalog (titles + cleaned overview text) and the ratings table.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Item, Rating, Catalog, RatingsTable)
//! - **parser**: Parse the CSV files into Rust structs
//! - **index**: Loading, statistics and validation
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Catalog, RatingsTable};
//! use std::path::Path;
//!
//! let catalog = Catalog::load_from_csv(Path::new("resources/data/content_data_clean.csv"))?;
//! let ratings = RatingsTable::load_from_csv(Path::new("resources/data/ratings.csv"))?;
//!
//! let rows = catalog.lookup_title("Toy Story (1995)");
//! println!("{} catalog rows, {} ratings", catalog.len(), ratings.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    UserId,
    ItemId,
    // Core types
    Item,
    Rating,
    ItemStats,
    Catalog,
    RatingsTable,
    TitleMatch,
    // Rating scale
    MIN_RATING,
    MAX_RATING,
};
