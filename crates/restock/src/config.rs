//! Run configuration.

use crate::error::{ForecastError, Result};
use restock_data::{Day, IngestConfig};
use restock_features::{LagSet, WindowSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default model artifact.
pub const DEFAULT_MODEL_PATH: &str = "m5_stable_model.txt";

/// Default horizon in days.
pub const DEFAULT_HORIZON: usize = 28;

/// Configuration of a forecast run.
///
/// Every field has a default, so a JSON file only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Model artifact location.
    pub model_path: PathBuf,

    /// Number of days to forecast.
    pub horizon_days: usize,

    /// Lag offsets, strictly ascending.
    pub lag_set: LagSet,

    /// Rolling window lengths.
    pub window_set: WindowSet,

    /// Days of sales history to load before the first forecast day.
    pub history_days: usize,

    /// First forecast day; defaults to the day after the last history day.
    pub first_forecast_day: Option<Day>,

    /// Frozen codebook to load instead of deriving one.
    pub codebook_path: Option<PathBuf>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            horizon_days: DEFAULT_HORIZON,
            lag_set: LagSet::default(),
            window_set: WindowSet::default(),
            history_days: IngestConfig::default().history_days,
            first_forecast_day: None,
            codebook_path: None,
        }
    }
}

impl ForecastConfig {
    /// Read a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration. Lag and window sets validate themselves
    /// when constructed or deserialized.
    pub fn validate(&self) -> Result<()> {
        if self.horizon_days == 0 {
            return Err(ForecastError::Config(
                "horizon_days must be at least 1".to_string(),
            ));
        }
        if self.history_days == 0 {
            return Err(ForecastError::Config(
                "history_days must be at least 1".to_string(),
            ));
        }
        if let Some(day) = self.first_forecast_day
            && day < 1
        {
            return Err(ForecastError::Config(format!(
                "first_forecast_day must be positive, got {day}"
            )));
        }

        let needed = usize::try_from(self.lag_set.max()).unwrap_or_default();
        if self.history_days < needed {
            tracing::warn!(
                history_days = self.history_days,
                max_lag = needed,
                "history is shorter than the longest lag; early lags will be null"
            );
        }
        Ok(())
    }

    /// Ingestion settings derived from this configuration.
    pub const fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            history_days: self.history_days,
            first_forecast_day: self.first_forecast_day,
        }
    }
}
