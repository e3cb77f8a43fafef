//! Errors of a forecast run.

use restock_data::{DataError, Day};
use restock_features::BuildError;
use restock_model::{ModelError, ScoringError};
use restock_output::SinkError;
use thiserror::Error;

/// Result type for forecast runs.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Any failure that aborts a run. Nothing is retried.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Feature construction failed for a day.
    #[error("Feature build failed for day {day}: {source}")]
    Build {
        /// Day being forecast
        day: Day,
        /// Underlying error
        #[source]
        source: BuildError,
    },

    /// Scoring failed for a day.
    #[error("Scoring failed for day {day}: {source}")]
    Scoring {
        /// Day being forecast
        day: Day,
        /// Underlying error
        #[source]
        source: ScoringError,
    },

    /// Appending a day's forecasts to history failed.
    #[error("Could not append forecasts for day {day}: {source}")]
    Append {
        /// Day being forecast
        day: Day,
        /// Underlying error
        #[source]
        source: DataError,
    },

    /// Invalid run configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Data loading error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Model loading error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Feature configuration error
    #[error("Feature error: {0}")]
    Features(#[from] BuildError),

    /// Result delivery error
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForecastError {
    /// Day the run failed on, if the failure happened inside the loop.
    pub const fn day(&self) -> Option<Day> {
        match self {
            Self::Build { day, .. } | Self::Scoring { day, .. } | Self::Append { day, .. } => {
                Some(*day)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_and_message() {
        let err = ForecastError::Append {
            day: 1914,
            source: DataError::DuplicateKey {
                series_id: "FOODS_1_001_CA_1".to_string(),
                day: 1914,
            },
        };
        assert_eq!(err.day(), Some(1914));
        assert!(err.to_string().contains("day 1914"));
        assert!(std::error::Error::source(&err).is_some());

        assert_eq!(ForecastError::Config("x".into()).day(), None);
    }
}
