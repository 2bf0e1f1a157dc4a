//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading and querying the dashboard tables.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP error
    #[error("HTTP {status} while fetching {url}")]
    Http {
        /// Status code returned by the server
        status: u16,
        /// URL that was requested
        url: String,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// A required column is absent from a table
    #[error("Missing column {column} in {table}")]
    MissingColumn {
        /// Table that was inspected
        table: &'static str,
        /// Name of the absent column
        column: String,
    },

    /// Client and feature tables are not row-aligned
    #[error("Row count mismatch: {clients} client rows but {features} feature rows")]
    RowCountMismatch {
        /// Rows in the client table
        clients: usize,
        /// Rows in the feature table
        features: usize,
    },

    /// Client identifiers are not unique
    #[error("Duplicate client identifier: {0}")]
    DuplicateClient(i64),

    /// Client identifier is not in the table
    #[error("Unknown client identifier: {0}")]
    UnknownClient(i64),

    /// Row index is past the end of a table
    #[error("Row {index} out of range for table with {len} rows")]
    RowOutOfRange {
        /// Requested row
        index: usize,
        /// Table length
        len: usize,
    },

    /// Cache error
    #[error("Cache error: {0}")]
    Cache(String),
}
