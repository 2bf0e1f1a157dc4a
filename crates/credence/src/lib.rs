#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/credence/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod view;

// Re-export main types from sub-crates
pub use credence_cohort as cohort;
pub use credence_data as data;
pub use credence_model as model;
pub use credence_output as output;

pub use context::DashboardContext;
pub use error::{DashboardError, Result};
pub use view::{
    ComparisonView, RenderedView, ScoreView, SelectionState, TableView, View, render,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
