#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/restock/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod codebook;
pub mod error;
pub mod lightgbm;
pub mod model;
pub mod scorer;

pub use codebook::{CODEBOOK_VERSION, Codebook};
pub use error::{ModelError, ModelResult, ScoringError};
pub use lightgbm::{LightGbmModel, ModelSummary, Objective};
pub use model::ForecastModel;
pub use scorer::{MISSING_SENTINEL, Scorer, check_schema};

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
