#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/restock/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod error;
pub mod lags;
pub mod registry;
pub mod rolling;

pub use builder::{FeatureBuilder, FeatureFrame};
pub use error::{BuildError, Result};
pub use lags::LagSet;
pub use registry::{FeatureInfo, FeatureSource, describe_features};
pub use rolling::{ROLLING_OFFSET, RollingStat, WindowSet};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
