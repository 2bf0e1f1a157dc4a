#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/credence/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod charts;
pub mod export;
pub mod report;
pub mod summary;

pub use charts::{
    AttributionChart, ChartError, ComparisonChart, CountChart, DensityChart, GaugeChart,
};
pub use export::{Cell, ClientListing, ExportError, ExportFormat, Exporter, ScoreExport};
pub use report::{Report, ReportBuilder, ReportError};
pub use summary::{ClientCard, ScoreSummary};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
