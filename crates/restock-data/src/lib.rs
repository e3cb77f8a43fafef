#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/restock/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod history;
pub mod ingest;
pub mod reference;
pub mod series;

pub use error::{DataError, Result};
pub use history::{HistoryStore, Observation, ObservationView};
pub use ingest::{DataSet, IngestConfig, ReferenceSet};
pub use reference::{CalendarRow, CalendarTable, PriceRow, PriceTable};
pub use series::{Day, ID_COLUMNS, SeriesKey, SeriesUniverse};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
