//! Error types for model loading, scoring and explanation.

use credence_data::DataError;
use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised by the model layer.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model dump is not valid JSON or has the wrong shape
    #[error("Model parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The model dump is well-formed JSON but structurally invalid
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Only binary classification ensembles are supported
    #[error("Unsupported objective: {0}")]
    UnsupportedObjective(String),

    /// Model and feature table disagree on the number of features
    #[error("Feature count mismatch: model expects {model}, table has {table}")]
    FeatureCountMismatch {
        /// Features the model was trained on
        model: usize,
        /// Columns in the feature table
        table: usize,
    },

    /// Row index is past the end of the feature table
    #[error("Row {index} out of range for {len} clients")]
    RowOutOfRange {
        /// Requested row
        index: usize,
        /// Number of rows
        len: usize,
    },

    /// Data layer error
    #[error("Data error: {0}")]
    Data(#[from] DataError),
}
