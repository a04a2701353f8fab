//! Error types for training and evaluation.

use thiserror::Error;

/// Result type alias for training operations.
pub type Result<T> = std::result::Result<T, TrainError>;

/// Errors that can occur during a run.
///
/// Every variant is fatal: the run aborts and the error reaches the driver.
#[derive(Error, Debug)]
pub enum TrainError {
    /// A batch produced a NaN or infinite loss.
    #[error("Non-finite loss {value} at epoch {epoch}, batch {batch}")]
    NonFiniteLoss {
        /// Epoch index (0-based).
        epoch: usize,
        /// Batch index within the epoch (0-based).
        batch: usize,
        /// The offending loss value.
        value: f32,
    },

    /// Invalid run configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing an output artifact failed.
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// An epoch observer asked to abort the run.
    #[error("Observer error: {0}")]
    Observer(String),

    /// Data error.
    #[error("Data error: {0}")]
    DataError(#[from] aqcast_data::DataError),

    /// Core error.
    #[error("Core error: {0}")]
    CoreError(#[from] aqcast_core::CoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<csv::Error> for TrainError {
    fn from(err: csv::Error) -> Self {
        Self::Artifact(err.to_string())
    }
}

impl From<serde_json::Error> for TrainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
