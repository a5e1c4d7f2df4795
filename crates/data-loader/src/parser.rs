//! Parser for the catalog and ratings CSV files.
//!
//! - catalog: movieId,title,genres,cleaned_overview
//! - ratings: userId,movieId,rating[,timestamp]
//!
//! Columns are matched by header name, so extra columns are ignored and the
//! order does not matter. Genres are pipe-separated: "Animation|Comedy".

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Placeholder MovieLens uses for a movie without genres
const NO_GENRES: &str = "(no genres listed)";

#[derive(Debug, Deserialize)]
struct ItemRecord {
    #[serde(alias = "movieId", alias = "item_id")]
    id: ItemId,
    title: String,
    #[serde(default)]
    genres: String,
    #[serde(alias = "cleaned_overview", default)]
    overview: String,
}

#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(alias = "userId")]
    user_id: UserId,
    #[serde(alias = "movieId", alias = "itemId")]
    item_id: ItemId,
    rating: f32,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Turn a csv error into a ParseError that names the file and line
fn csv_error(source: &str, err: csv::Error) -> DataLoadError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io_err) => DataLoadError::IoError(io_err),
        _ => DataLoadError::ParseError {
            file: source.to_string(),
            line,
            reason,
        },
    }
}

/// Parse catalog rows from any reader
///
/// `source` is only used in error messages.
pub fn parse_items<R: Read>(reader: R, source: &str) -> Result<Vec<Item>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let mut items = Vec::new();

    for record in csv_reader.deserialize::<ItemRecord>() {
        let record = record.map_err(|e| csv_error(source, e))?;
        items.push(Item {
            id: record.id,
            title: record.title,
            overview: record.overview,
            genres: parse_genres(&record.genres),
        });
    }

    Ok(items)
}

/// Parse the catalog CSV file
pub fn parse_items_file(path: &Path) -> Result<Vec<Item>> {
    let file = open(path)?;
    parse_items(file, &source_name(path))
}

/// Parse rating rows from any reader
pub fn parse_ratings<R: Read>(reader: R, source: &str) -> Result<Vec<Rating>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut ratings = Vec::new();

    for record in csv_reader.deserialize::<RatingRecord>() {
        let record = record.map_err(|e| csv_error(source, e))?;
        ratings.push(Rating {
            user_id: record.user_id,
            item_id: record.item_id,
            rating: record.rating,
        });
    }

    Ok(ratings)
}

/// Parse the ratings CSV file
pub fn parse_ratings_file(path: &Path) -> Result<Vec<Rating>> {
    let file = open(path)?;
    parse_ratings(file, &source_name(path))
}

/// Parse pipe-separated genres
///
/// Example: "Action|Adventure|Sci-Fi" -> ["Action", "Adventure", "Sci-Fi"]
pub fn parse_genres(s: &str) -> Vec<String> {
    s.split('|')
        .map(str::trim)
        .filter(|genre| !genre.is_empty() && *genre != NO_GENRES)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = "\
movieId,title,genres,cleaned_overview
1,Toy Story (1995),Animation|Children|Comedy,\"animation children comedy tom hanks, toy\"
2,Jumanji (1995),Adventure|Fantasy,adventure fantasy robin williams board game
3,Heat (1995),(no genres listed),
";

    #[test]
    fn test_parse_items() {
        let items = parse_items(CATALOG.as_bytes(), "catalog.csv").unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[0].title, "Toy Story (1995)");
        assert_eq!(items[0].genres, vec!["Animation", "Children", "Comedy"]);
        assert_eq!(items[0].overview, "animation children comedy tom hanks, toy");
        assert!(items[2].genres.is_empty());
        assert!(items[2].overview.is_empty());
    }

    #[test]
    fn test_parse_items_accepts_plain_column_names() {
        let csv = "item_id,title,overview\n7,Alien,space horror monster\n";
        let items = parse_items(csv.as_bytes(), "catalog.csv").unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 7);
        assert_eq!(items[0].overview, "space horror monster");
    }

    #[test]
    fn test_parse_ratings_ignores_extra_columns() {
        let csv = "userId,movieId,rating,timestamp\n1,31,2.5,1260759144\n1,1029,3.0,1260759179\n";
        let ratings = parse_ratings(csv.as_bytes(), "ratings.csv").unwrap();

        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].user_id, 1);
        assert_eq!(ratings[0].item_id, 31);
        assert_eq!(ratings[1].rating, 3.0);
    }

    #[test]
    fn test_parse_ratings_reports_line() {
        let csv = "userId,movieId,rating\n1,31,2.5\n2,abc,4.0\n";
        let err = parse_ratings(csv.as_bytes(), "ratings.csv").unwrap_err();

        match err {
            DataLoadError::ParseError { file, line, .. } => {
                assert_eq!(file, "ratings.csv");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = parse_items_file(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }

    #[test]
    fn test_parse_genres() {
        assert_eq!(parse_genres("Action|Sci-Fi"), vec!["Action", "Sci-Fi"]);
        assert!(parse_genres("").is_empty());
        assert!(parse_genres(NO_GENRES).is_empty());
    }
}
