//! Error types for the data-loader crate.

use thiserror::Error;

/// Errors that can occur while loading the catalog or the ratings table.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A CSV record couldn't be decoded into the expected columns
    ///
    /// `line` is the 1-based line in the source file (the header is line 1).
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: u64,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The same item id appears twice in the catalog
    #[error("Duplicate item id {id} in catalog")]
    DuplicateItem { id: u32 },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
