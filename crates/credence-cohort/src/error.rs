//! Error types for cohort selection.

use thiserror::Error;

/// Result type for cohort operations.
pub type Result<T> = std::result::Result<T, CohortError>;

/// Errors raised while selecting a cohort.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CohortError {
    /// Neighbour count outside the allowed range
    #[error("Neighbour count {count} outside [{min}, {max}]")]
    NeighborCountOutOfRange {
        /// Requested count
        count: usize,
        /// Smallest allowed count
        min: usize,
        /// Largest allowed count
        max: usize,
    },

    /// Target row is past the end of the population
    #[error("Target row {index} out of range for {len} clients")]
    TargetOutOfRange {
        /// Requested row
        index: usize,
        /// Population size
        len: usize,
    },
}
