use data_loader::{Catalog, RatingsTable};
use std::path::Path;
use std::time::Instant;

fn main() -> Result<(), data_loader::DataLoadError> {
    let data_dir = Path::new("resources/data");

    println!("Loading catalog and ratings...\n");

    let start = Instant::now();
    let catalog = Catalog::load_from_csv(&data_dir.join("content_data_clean.csv"))?;
    let catalog_elapsed = start.elapsed();

    let start = Instant::now();
    let ratings = RatingsTable::load_from_csv(&data_dir.join("ratings.csv"))?;
    let ratings_elapsed = start.elapsed();

    let (users, items, total) = ratings.counts();

    println!("\n=== Load Complete ===");
    println!("Catalog: {} items in {:?}", catalog.len(), catalog_elapsed);
    println!("Ratings: {} ({} users, {} items) in {:?}", total, users, items, ratings_elapsed);
    println!("\nPerformance: {:.0} ratings/second",
             total as f64 / ratings_elapsed.as_secs_f64());
    Ok(())
}
