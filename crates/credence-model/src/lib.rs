#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/credence/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod classifier;
pub mod error;
pub mod explain;
pub mod gbdt;
pub mod scorer;

pub use classifier::{ClassProbabilities, Classifier};
pub use error::{ModelError, Result};
pub use explain::{Attributions, FeatureContribution, TreeExplainer};
pub use gbdt::{Objective, Tree, TreeEnsemble};
pub use scorer::{DECISION_THRESHOLD, Decision, Score, score};

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
