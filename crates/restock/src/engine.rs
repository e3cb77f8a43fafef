//! The recursive day loop.
//!
//! Each day is built from the history as it stands after every earlier
//! forecast day has been appended, so the forecast for day `D` feeds the
//! `sales_lag_L` feature of day `D + L` and the rolling windows that cover it.

use crate::error::{ForecastError, Result};
use chrono::Utc;
use restock_data::{Day, HistoryStore, Observation, SeriesUniverse};
use restock_features::FeatureBuilder;
use restock_model::{ForecastModel, Scorer};
use restock_output::ForecastTable;
use std::time::{Duration, Instant};

/// Progress of a run after one day has been forecast and appended.
#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    /// Day just forecast.
    pub day: Day,
    /// 1-based position within the horizon.
    pub position: usize,
    /// Horizon length.
    pub horizon: usize,
    /// Number of series forecast.
    pub series: usize,
    /// Mean forecast over all series.
    pub mean_forecast: f64,
}

/// Forecasts a fixed horizon one day at a time.
///
/// Running consumes the engine: a finished or failed run cannot be resumed,
/// because the history it owns has already been extended.
#[derive(Debug)]
pub struct RecursiveForecastEngine<M> {
    builder: FeatureBuilder,
    scorer: Scorer,
    model: M,
    history: HistoryStore,
    universe: SeriesUniverse,
    first_day: Day,
    horizon: usize,
}

impl<M: ForecastModel> RecursiveForecastEngine<M> {
    /// Create an engine. `first_day` is normally the day after the last
    /// history day; `horizon` must be at least one day.
    pub fn new(
        builder: FeatureBuilder,
        scorer: Scorer,
        model: M,
        history: HistoryStore,
        universe: SeriesUniverse,
        first_day: Day,
        horizon: usize,
    ) -> Result<Self> {
        if horizon == 0 {
            return Err(ForecastError::Config(
                "forecast horizon must be at least 1 day".to_string(),
            ));
        }
        Ok(Self {
            builder,
            scorer,
            model,
            history,
            universe,
            first_day,
            horizon,
        })
    }

    /// First forecast day.
    pub const fn first_day(&self) -> Day {
        self.first_day
    }

    /// Horizon length in days.
    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    /// Series forecast by this engine.
    pub const fn universe(&self) -> &SeriesUniverse {
        &self.universe
    }

    /// History the first day will be built from.
    pub const fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Run the full horizon.
    pub fn run(self) -> Result<ForecastTable> {
        self.run_with_progress(|_| {})
    }

    /// Run the full horizon, calling `on_day` after each day is appended.
    ///
    /// The first failure aborts the run and no rows are returned. Every row of
    /// a successful run carries the same timestamp, taken once at the end.
    pub fn run_with_progress<F>(mut self, mut on_day: F) -> Result<ForecastTable>
    where
        F: FnMut(&DayReport),
    {
        let series_ids: Vec<String> = self.universe.ids().map(str::to_string).collect();
        let started = Instant::now();
        tracing::info!(
            series = series_ids.len(),
            first_day = self.first_day,
            horizon = self.horizon,
            "starting recursive forecast"
        );

        let mut daily = Vec::with_capacity(self.horizon);
        let mut day = self.first_day;
        for position in 1..=self.horizon {
            let day_started = Instant::now();

            let rows = self
                .builder
                .build(&self.history, &self.universe, day)
                .map_err(|source| ForecastError::Build { day, source })?;
            let forecasts = self
                .scorer
                .score(&rows, &self.model)
                .map_err(|source| ForecastError::Scoring { day, source })?;

            self.history
                .append(
                    series_ids
                        .iter()
                        .zip(&forecasts)
                        .map(|(id, &quantity)| Observation::new(id.as_str(), day, quantity)),
                )
                .map_err(|source| ForecastError::Append { day, source })?;

            let mean_forecast = if forecasts.is_empty() {
                0.0
            } else {
                forecasts.iter().sum::<f64>() / forecasts.len() as f64
            };
            tracing::info!(
                day,
                position,
                horizon = self.horizon,
                mean_forecast,
                elapsed_ms = elapsed_ms(day_started.elapsed()),
                "forecast day complete"
            );
            on_day(&DayReport {
                day,
                position,
                horizon: self.horizon,
                series: forecasts.len(),
                mean_forecast,
            });

            daily.push((day, forecasts));
            day += 1;
        }

        let table = ForecastTable::from_daily(&series_ids, daily, Utc::now());
        tracing::info!(
            rows = table.len(),
            elapsed_ms = elapsed_ms(started.elapsed()),
            "recursive forecast finished"
        );
        Ok(table)
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
