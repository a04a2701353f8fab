//! Error types for aqcast_data.

use thiserror::Error;

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading, scaling or windowing a series.
#[derive(Error, Debug)]
pub enum DataError {
    /// Invalid data shape.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Empty dataset.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Batch size error.
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(String),

    /// Split error.
    #[error("Split error: {0}")]
    SplitError(String),

    /// A required column is absent from the input file.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Two rows share a timestamp.
    #[error("Duplicate timestamp: {0}")]
    DuplicateTimestamp(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// CSV reader error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Core error.
    #[error("Core error: {0}")]
    CoreError(#[from] aqcast_core::CoreError),
}
