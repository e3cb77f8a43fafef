#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/restock/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;

// Re-export main types from sub-crates
pub use restock_data as data;
pub use restock_features as features;
pub use restock_model as model;
pub use restock_output as output;

pub use config::{DEFAULT_HORIZON, DEFAULT_MODEL_PATH, ForecastConfig};
pub use engine::{DayReport, RecursiveForecastEngine};
pub use error::{ForecastError, Result};
pub use pipeline::{codebook_from_dir, derive_codebook, prepare_engine, resolve_codebook};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
