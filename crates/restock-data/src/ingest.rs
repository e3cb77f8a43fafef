//! CSV ingestion for the M5 file layout.
//!
//! Reads the wide sales matrix, the calendar and the weekly prices from a data
//! directory and turns them into the in-memory inputs of a forecast run. Only
//! the trailing `history_days` of sales before the first forecast day are
//! melted into the history store; older days are never read by any lag or
//! rolling window of the default feature set.

use crate::error::{DataError, Result};
use crate::history::{HistoryStore, Observation};
use crate::reference::{CalendarTable, PriceTable};
use crate::series::{Day, SeriesUniverse, day_label, parse_day_label};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Wide sales matrix file name.
pub const SALES_FILE: &str = "sales_train_validation.csv";

/// Calendar file name.
pub const CALENDAR_FILE: &str = "calendar.csv";

/// Weekly price file name.
pub const PRICES_FILE: &str = "sell_prices.csv";

/// Rows used for CSV schema inference.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Configuration for loading sales history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Number of days before the first forecast day to load.
    pub history_days: usize,
    /// First day to forecast; defaults to the day after the last sales column.
    pub first_forecast_day: Option<Day>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            history_days: 100,
            first_forecast_day: None,
        }
    }
}

/// Everything a forecast run reads, loaded and validated.
#[derive(Debug, Clone)]
pub struct DataSet {
    /// Series to forecast.
    pub universe: SeriesUniverse,
    /// Seeded sales history.
    pub history: HistoryStore,
    /// Calendar reference table.
    pub calendar: CalendarTable,
    /// Price reference table.
    pub prices: PriceTable,
    /// First day to forecast.
    pub first_forecast_day: Day,
}

impl DataSet {
    /// Load the three M5 files from a directory.
    pub fn load_dir(dir: impl AsRef<Path>, config: &IngestConfig) -> Result<Self> {
        let dir = dir.as_ref();
        let sales = read_csv(dir.join(SALES_FILE))?;
        let calendar = CalendarTable::from_frame(read_csv(dir.join(CALENDAR_FILE))?)?;
        let prices = PriceTable::from_frame(read_csv(dir.join(PRICES_FILE))?)?;

        let (universe, history, first_forecast_day) = melt_sales(&sales, config)?;

        tracing::info!(
            series = universe.len(),
            observations = history.len(),
            calendar_days = calendar.len(),
            price_rows = prices.len(),
            first_forecast_day,
            "loaded data set from {}",
            dir.display()
        );

        Ok(Self {
            universe,
            history,
            calendar,
            prices,
            first_forecast_day,
        })
    }
}

/// Series and reference tables of a data directory, without sales history.
///
/// Enough to derive a codebook: no day columns are read, so any number of
/// `d_<n>` columns is accepted.
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    /// Series found in the sales file.
    pub universe: SeriesUniverse,
    /// Calendar reference table.
    pub calendar: CalendarTable,
    /// Price reference table.
    pub prices: PriceTable,
}

impl ReferenceSet {
    /// Load the series list, calendar and prices from a directory.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let sales = read_csv(dir.join(SALES_FILE))?;
        let reference = Self {
            universe: SeriesUniverse::from_frame(&sales)?,
            calendar: CalendarTable::from_frame(read_csv(dir.join(CALENDAR_FILE))?)?,
            prices: PriceTable::from_frame(read_csv(dir.join(PRICES_FILE))?)?,
        };
        tracing::debug!(
            series = reference.universe.len(),
            calendar_days = reference.calendar.len(),
            price_rows = reference.prices.len(),
            "loaded reference tables from {}",
            dir.display()
        );
        Ok(reference)
    }
}

/// Read a CSV file with a header row.
pub fn read_csv(path: impl Into<PathBuf>) -> Result<DataFrame> {
    let path = path.into();
    if !path.is_file() {
        return Err(DataError::MissingFile(path));
    }
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .try_into_reader_with_file_path(Some(path))?
        .finish()?;
    Ok(frame)
}

/// Day columns (`d_<n>`) present in a wide sales frame, ascending.
pub fn day_columns(sales: &DataFrame) -> Vec<Day> {
    let mut days: Vec<Day> = sales
        .get_column_names()
        .iter()
        .filter(|name| name.starts_with("d_"))
        .filter_map(|name| parse_day_label(name))
        .collect();
    days.sort_unstable();
    days
}

/// Melt the wide sales matrix into a universe and a seeded history.
///
/// Returns the universe, the history covering
/// `[first_forecast_day - history_days, first_forecast_day)` and the first
/// forecast day. Every day of that range must exist as a column.
pub fn melt_sales(
    sales: &DataFrame,
    config: &IngestConfig,
) -> Result<(SeriesUniverse, HistoryStore, Day)> {
    let days = day_columns(sales);
    let last_day = *days
        .last()
        .ok_or_else(|| DataError::shape("sales history has no d_<n> day columns"))?;
    let first_forecast_day = config.first_forecast_day.unwrap_or(last_day + 1);
    let history_days = Day::try_from(config.history_days)
        .map_err(|_| DataError::shape("history_days does not fit a day index"))?;
    let start = first_forecast_day - history_days;

    let universe = SeriesUniverse::from_frame(sales)?;
    let ids = sales.column("id")?.cast(&DataType::String)?;
    let ids = ids.str()?;

    let mut observations = Vec::with_capacity(sales.height() * config.history_days);
    for day in start..first_forecast_day {
        let label = day_label(day);
        let quantities = sales
            .column(&label)
            .map_err(|_| {
                DataError::shape(format!(
                    "sales history has no column {label} (history starts at day {start})"
                ))
            })?
            .cast(&DataType::Float64)?;
        let quantities = quantities.f64()?;

        for (id, quantity) in ids.into_iter().zip(quantities) {
            let id = id.ok_or_else(|| DataError::shape("null series id in sales history"))?;
            observations.push(Observation {
                series_id: id.to_string(),
                day,
                quantity,
            });
        }
    }

    let history = HistoryStore::seed(observations)?;
    Ok((universe, history, first_forecast_day))
}
