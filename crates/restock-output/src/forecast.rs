//! Forecast rows and the table a run produces.

use crate::sink::SinkError;
use chrono::{DateTime, Utc};
use restock_data::Day;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// One forecast for one series and day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    /// Series id.
    pub series_id: String,
    /// Forecast day index.
    pub day: Day,
    /// Forecast quantity, never negative.
    pub forecast: f64,
    /// When the run finished; shared by every row of a run.
    pub generated_at: DateTime<Utc>,
}

impl ForecastRow {
    /// Create a forecast row.
    pub fn new(
        series_id: impl Into<String>,
        day: Day,
        forecast: f64,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            series_id: series_id.into(),
            day,
            forecast,
            generated_at,
        }
    }
}

/// Ordered forecast rows of a run: by day, then by series in universe order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    rows: Vec<ForecastRow>,
}

impl ForecastTable {
    /// Wrap rows as they are.
    pub const fn new(rows: Vec<ForecastRow>) -> Self {
        Self { rows }
    }

    /// Build a table from per-day forecasts, `values[i]` belonging to `series_ids[i]`.
    pub fn from_daily(
        series_ids: &[String],
        daily: Vec<(Day, Vec<f64>)>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let rows = daily
            .into_iter()
            .flat_map(|(day, values)| {
                series_ids
                    .iter()
                    .zip(values)
                    .map(move |(id, forecast)| ForecastRow::new(id.clone(), day, forecast, generated_at))
            })
            .collect();
        Self { rows }
    }

    /// All rows in order.
    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct forecast days, ascending.
    pub fn days(&self) -> Vec<Day> {
        self.rows
            .iter()
            .map(|r| r.day)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of distinct series.
    pub fn series_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.series_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Generation timestamp of the run, if the table has rows.
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.rows.first().map(|r| r.generated_at)
    }

    /// Forecast of one series on one day.
    pub fn get(&self, series_id: &str, day: Day) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.day == day && r.series_id == series_id)
            .map(|r| r.forecast)
    }

    /// Check the table is a full grid: every series on every day exactly
    /// once, contiguous days, non-negative values, one shared timestamp.
    pub fn check_complete(&self) -> Result<(), SinkError> {
        let days = self.days();
        if let (Some(first), Some(last)) = (days.first(), days.last())
            && usize::try_from(last - first + 1).ok() != Some(days.len())
        {
            return Err(SinkError::Incomplete(format!(
                "forecast days {first}..={last} have gaps"
            )));
        }

        let mut seen: HashSet<(&str, Day)> = HashSet::with_capacity(self.rows.len());
        let mut per_series: HashMap<&str, usize> = HashMap::new();
        for row in &self.rows {
            if !seen.insert((row.series_id.as_str(), row.day)) {
                return Err(SinkError::Incomplete(format!(
                    "series {} is forecast twice for day {}",
                    row.series_id, row.day
                )));
            }
            if row.forecast.is_nan() || row.forecast < 0.0 {
                return Err(SinkError::Incomplete(format!(
                    "series {} has forecast {} on day {}",
                    row.series_id, row.forecast, row.day
                )));
            }
            *per_series.entry(row.series_id.as_str()).or_default() += 1;
        }

        if let Some((series, count)) = per_series.iter().find(|(_, c)| **c != days.len()) {
            return Err(SinkError::Incomplete(format!(
                "series {series} has {count} forecasts over {} days",
                days.len()
            )));
        }

        if let Some(stamp) = self.generated_at()
            && self.rows.iter().any(|r| r.generated_at != stamp)
        {
            return Err(SinkError::Incomplete(
                "rows carry different generation timestamps".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    #[test]
    fn test_from_daily_orders_by_day_then_series() {
        let now = Utc::now();
        let table = ForecastTable::from_daily(
            &ids(),
            vec![(1914, vec![1.0, 2.0]), (1915, vec![3.0, 4.0])],
            now,
        );

        assert_eq!(table.len(), 4);
        assert_eq!(table.rows()[1].series_id, "B");
        assert_eq!(table.rows()[2].day, 1915);
        assert_eq!(table.days(), vec![1914, 1915]);
        assert_eq!(table.series_count(), 2);
        assert_eq!(table.get("A", 1915), Some(3.0));
        assert_eq!(table.generated_at(), Some(now));
        assert!(table.check_complete().is_ok());
    }

    #[test]
    fn test_check_complete_rejects_gaps_and_duplicates() {
        let now = Utc::now();
        let gap = ForecastTable::from_daily(&ids(), vec![(1, vec![1.0, 1.0]), (3, vec![1.0, 1.0])], now);
        assert!(matches!(gap.check_complete(), Err(SinkError::Incomplete(m)) if m.contains("gaps")));

        let duplicate = ForecastTable::new(vec![
            ForecastRow::new("A", 1, 1.0, now),
            ForecastRow::new("A", 1, 2.0, now),
        ]);
        assert!(duplicate.check_complete().is_err());

        let ragged = ForecastTable::new(vec![
            ForecastRow::new("A", 1, 1.0, now),
            ForecastRow::new("A", 2, 1.0, now),
            ForecastRow::new("B", 1, 1.0, now),
        ]);
        assert!(ragged.check_complete().is_err());

        let negative = ForecastTable::new(vec![ForecastRow::new("A", 1, -0.5, now)]);
        assert!(negative.check_complete().is_err());
    }

    #[test]
    fn test_empty_table_is_complete() {
        assert!(ForecastTable::default().check_complete().is_ok());
    }
}
