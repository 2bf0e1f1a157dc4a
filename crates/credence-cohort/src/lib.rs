#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/credence/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod neighbors;

pub use error::{CohortError, Result};
pub use neighbors::{Cohort, CohortScope, NeighborCount, NeighborFinder};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
