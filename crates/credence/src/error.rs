//! Error type of the dashboard layer.

use credence_cohort::CohortError;
use credence_data::DataError;
use credence_model::ModelError;
use credence_output::{ChartError, ExportError};
use thiserror::Error;

/// Result type for dashboard operations.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Errors raised while loading the context or rendering a view.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Data loading or table error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Model, scoring or attribution error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Cohort selection error
    #[error(transparent)]
    Cohort(#[from] CohortError),

    /// Chart rendering error
    #[error(transparent)]
    Chart(#[from] ChartError),

    /// Export error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// The view needs a selected client
    #[error("View {0} requires a selected client")]
    NoClientSelected(&'static str),
}
