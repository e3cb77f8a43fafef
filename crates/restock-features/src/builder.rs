//! Per-day feature frame construction.
//!
//! The builder starts from one row per series, stamps the target day, left
//! joins the calendar on `d` and the prices on (store, item, week), then joins
//! the lag and rolling columns computed from the history store. The result is
//! narrowed to exactly the columns the model declares, in its order.

use crate::error::{BuildError, Result};
use crate::lags::{LagSet, lag_values};
use crate::registry::{lag_column, rolling_mean_column, rolling_std_column};
use crate::rolling::{WindowSet, rolling_stats};
use polars::prelude::*;
use restock_data::reference::calendar::DAY_COLUMN;
use restock_data::reference::prices::PRICE_KEYS;
use restock_data::{CalendarTable, Day, HistoryStore, PriceTable, SeriesUniverse};

const ROW_INDEX: &str = "__row";

/// Feature rows of one target day, one per series in universe order.
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    day: Day,
    frame: DataFrame,
    series_ids: Vec<String>,
}

impl FeatureFrame {
    /// Wrap an already built frame. `series_ids[i]` names row `i`.
    pub fn new(day: Day, frame: DataFrame, series_ids: Vec<String>) -> Self {
        Self {
            day,
            frame,
            series_ids,
        }
    }

    /// Target day.
    pub const fn day(&self) -> Day {
        self.day
    }

    /// Feature columns.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Series id of each row.
    pub fn series_ids(&self) -> &[String] {
        &self.series_ids
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Consume into the inner frame.
    pub fn into_frame(self) -> DataFrame {
        self.frame
    }
}

/// Builds model-ready feature frames from history and reference tables.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    calendar: CalendarTable,
    prices: PriceTable,
    lags: LagSet,
    windows: WindowSet,
    required: Vec<String>,
}

impl FeatureBuilder {
    /// Create a builder.
    ///
    /// `required` is the model's declared feature list; it fixes both the
    /// output columns and their order.
    pub fn new(
        calendar: CalendarTable,
        prices: PriceTable,
        lags: LagSet,
        windows: WindowSet,
        required: Vec<String>,
    ) -> Self {
        Self {
            calendar,
            prices,
            lags,
            windows,
            required,
        }
    }

    /// Columns every built frame carries, in order.
    pub fn required_columns(&self) -> &[String] {
        &self.required
    }

    /// Lags this builder computes.
    pub const fn lags(&self) -> &LagSet {
        &self.lags
    }

    /// Rolling windows this builder computes.
    pub const fn windows(&self) -> &WindowSet {
        &self.windows
    }

    /// Calendar reference table.
    pub const fn calendar(&self) -> &CalendarTable {
        &self.calendar
    }

    /// Price reference table.
    pub const fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Build the model-ready rows for `target_day`.
    pub fn build(
        &self,
        history: &HistoryStore,
        universe: &SeriesUniverse,
        target_day: Day,
    ) -> Result<FeatureFrame> {
        let full = self.build_full(history, universe, target_day)?;

        let present = full.get_column_names();
        if let Some(missing) = self
            .required
            .iter()
            .find(|name| !present.iter().any(|p| p.as_str() == name.as_str()))
        {
            return Err(BuildError::MissingColumn {
                day: target_day,
                column: missing.clone(),
            });
        }

        let frame = full.select(self.required.iter().map(String::as_str))?;
        tracing::debug!(
            day = target_day,
            rows = frame.height(),
            columns = frame.width(),
            "built feature frame"
        );
        Ok(FeatureFrame::new(
            target_day,
            frame,
            universe.ids().map(str::to_string).collect(),
        ))
    }

    /// Every joined and derived column for `target_day`, before narrowing to
    /// the model's feature list.
    pub fn build_full(
        &self,
        history: &HistoryStore,
        universe: &SeriesUniverse,
        target_day: Day,
    ) -> Result<DataFrame> {
        let expected = universe.len();
        let rows = u32::try_from(expected).map_err(|_| {
            BuildError::InvalidConfig(format!("universe of {expected} series is too large"))
        })?;

        let mut base = universe.to_frame()?;
        base.with_column(Column::new(DAY_COLUMN.into(), vec![target_day; expected]))?;
        base.with_column(Column::new(ROW_INDEX.into(), (0..rows).collect::<Vec<u32>>()))?;

        let derived = self.history_features(history, universe, target_day)?;
        let price_keys: Vec<Expr> = PRICE_KEYS.iter().map(|k| col(*k)).collect();

        let joined = base
            .lazy()
            .join(
                self.calendar.frame().clone().lazy(),
                [col(DAY_COLUMN)],
                [col(DAY_COLUMN)],
                JoinArgs::new(JoinType::Left),
            )
            .join(
                self.prices.frame().clone().lazy(),
                price_keys.clone(),
                price_keys,
                JoinArgs::new(JoinType::Left),
            )
            .join(
                derived.lazy(),
                [col("id")],
                [col("id")],
                JoinArgs::new(JoinType::Left),
            )
            .sort([ROW_INDEX], Default::default())
            .collect()?;

        if joined.height() != expected {
            return Err(BuildError::RowCount {
                day: target_day,
                expected,
                actual: joined.height(),
            });
        }

        if !self.calendar.contains(target_day) {
            tracing::debug!(day = target_day, "calendar has no row for target day");
        }

        Ok(joined.drop(ROW_INDEX)?)
    }

    /// Lag and rolling columns keyed by series id.
    fn history_features(
        &self,
        history: &HistoryStore,
        universe: &SeriesUniverse,
        target_day: Day,
    ) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(1 + self.lags.len() + 2 * self.windows.len());
        columns.push(Column::new(
            "id".into(),
            universe.ids().map(str::to_string).collect::<Vec<_>>(),
        ));

        for lag in self.lags.iter() {
            let values = lag_values(history, universe, target_day, lag);
            columns.push(Column::new(lag_column(lag).into(), values));
        }

        for window in self.windows.iter() {
            let stats = rolling_stats(history, universe, target_day, window);
            let means: Vec<Option<f64>> = stats.iter().map(|s| s.mean).collect();
            let stds: Vec<Option<f64>> = stats.iter().map(|s| s.std).collect();
            columns.push(Column::new(rolling_mean_column(window).into(), means));
            columns.push(Column::new(rolling_std_column(window).into(), stds));
        }

        Ok(DataFrame::new(columns)?)
    }
}
