//! Error types for aqcast_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors shared by every aqcast crate.
///
/// All of them are fatal for a run: they propagate to the driver and abort it.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Required configuration is missing or inconsistent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A tensor disagrees with the declared model dimensions.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A numeric computation is undefined for the given data.
    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// A windowed view was indexed outside its valid range.
    #[error("Index {index} out of range for length {length}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of valid indices.
        length: usize,
    },

    /// Tensor data could not be converted.
    #[error("Tensor data error: {0}")]
    TensorData(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Build a [`CoreError::Configuration`] from anything displayable.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`CoreError::ShapeMismatch`] from anything displayable.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_message() {
        let err = CoreError::IndexOutOfRange { index: 7, length: 6 };
        assert_eq!(err.to_string(), "Index 7 out of range for length 6");
    }

    #[test]
    fn test_config_helper() {
        let err = CoreError::config("multi-channel input requires an explicit target column");
        assert!(matches!(err, CoreError::Configuration(_)));
        assert!(err.to_string().contains("explicit target column"));
    }
}
