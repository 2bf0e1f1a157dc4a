#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/credence/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod clients;
pub mod error;
pub mod features;
pub mod filter;
mod io;
pub mod source;

pub use cache::ArtifactCache;
pub use clients::{ClientRecord, ClientTable};
pub use error::{DataError, Result};
pub use features::FeatureTable;
pub use filter::{FilterColumn, FilterValue, FilteredTable, TableFilters};
pub use source::{
    ArtifactFetcher, ArtifactKind, ArtifactSource, FetchConfig, RawArtifacts, SourceConfig,
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
