#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/restock/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod forecast;
pub mod sink;
pub mod summary;

pub use export::{ExportError, ExportFormat, Exporter};
pub use forecast::{ForecastRow, ForecastTable};
pub use sink::{DEFAULT_TABLE, FileSink, ResultSink, SinkError, SqliteSink};
pub use summary::{DailyTotal, ForecastSummary};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
