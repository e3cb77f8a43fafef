//! Run summary.
//!
//! Aggregates a finished forecast table into per-day totals and renders it for
//! a terminal or for Markdown documentation.

use crate::forecast::ForecastTable;
use chrono::{DateTime, Utc};
use restock_data::Day;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Aggregate forecast for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    /// Forecast day.
    pub day: Day,
    /// Sum of forecasts over all series.
    pub total: f64,
    /// Mean forecast per series.
    pub mean: f64,
    /// Series forecast at exactly zero.
    pub zeros: usize,
}

/// Summary of a forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    /// Number of forecast rows.
    pub rows: usize,

    /// Number of distinct series.
    pub series: usize,

    /// Number of forecast days.
    pub days: usize,

    /// First forecast day.
    pub first_day: Option<Day>,

    /// Last forecast day.
    pub last_day: Option<Day>,

    /// Shared generation timestamp.
    pub generated_at: Option<DateTime<Utc>>,

    /// Sum of all forecasts.
    pub total: f64,

    /// Share of rows forecast at zero (0.0 to 1.0).
    pub zero_share: f64,

    /// Per-day aggregates, ascending by day.
    pub daily: Vec<DailyTotal>,
}

impl ForecastSummary {
    /// Summarize a forecast table.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use restock_output::{ForecastSummary, ForecastTable};
    ///
    /// let ids = vec!["A".to_string(), "B".to_string()];
    /// let table = ForecastTable::from_daily(&ids, vec![(1914, vec![2.0, 0.0])], Utc::now());
    /// let summary = ForecastSummary::from_table(&table);
    ///
    /// assert_eq!(summary.rows, 2);
    /// assert_eq!(summary.zero_share, 0.5);
    /// ```
    pub fn from_table(table: &ForecastTable) -> Self {
        let mut by_day: BTreeMap<Day, (f64, usize, usize)> = BTreeMap::new();
        for row in table.rows() {
            let entry = by_day.entry(row.day).or_default();
            entry.0 += row.forecast;
            entry.1 += 1;
            if row.forecast == 0.0 {
                entry.2 += 1;
            }
        }

        let daily: Vec<DailyTotal> = by_day
            .into_iter()
            .map(|(day, (total, count, zeros))| DailyTotal {
                day,
                total,
                mean: if count > 0 { total / count as f64 } else { 0.0 },
                zeros,
            })
            .collect();

        let rows = table.len();
        let zeros: usize = daily.iter().map(|d| d.zeros).sum();
        Self {
            rows,
            series: table.series_count(),
            days: daily.len(),
            first_day: daily.first().map(|d| d.day),
            last_day: daily.last().map(|d| d.day),
            generated_at: table.generated_at(),
            total: daily.iter().map(|d| d.total).sum(),
            zero_share: if rows > 0 {
                zeros as f64 / rows as f64
            } else {
                0.0
            },
            daily,
        }
    }

    /// Mean forecast over all rows.
    pub fn mean(&self) -> f64 {
        if self.rows == 0 {
            return 0.0;
        }
        self.total / self.rows as f64
    }

    fn period(&self) -> String {
        match (self.first_day, self.last_day) {
            (Some(first), Some(last)) => format!("d_{first} to d_{last}"),
            _ => "no forecast days".to_string(),
        }
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nForecast Summary\n");
        output.push_str(&format!("Period: {}\n", self.period()));
        if let Some(at) = self.generated_at {
            output.push_str(&format!("Generated: {}\n", at.to_rfc3339()));
        }
        output.push_str(&"=".repeat(60));
        output.push('\n');

        output.push_str(&format!("  Series:                 {}\n", self.series));
        output.push_str(&format!("  Days:                   {}\n", self.days));
        output.push_str(&format!("  Rows:                   {}\n", self.rows));
        output.push_str(&format!("  Total units:            {:.2}\n", self.total));
        output.push_str(&format!("  Mean per row:           {:.4}\n", self.mean()));
        output.push_str(&format!(
            "  Zero forecasts:         {:.1}%\n",
            self.zero_share * 100.0
        ));

        if !self.daily.is_empty() {
            output.push_str("\nDaily Totals:\n");
            output.push_str(&"-".repeat(60));
            output.push('\n');
            output.push_str(&format!(
                "{:<10} {:>16} {:>14} {:>14}\n",
                "Day", "Total", "Mean", "Zeros"
            ));
            output.push_str(&"-".repeat(60));
            output.push('\n');
            for day in &self.daily {
                output.push_str(&format!(
                    "{:<10} {:>16.2} {:>14.4} {:>14}\n",
                    format!("d_{}", day.day),
                    day.total,
                    day.mean,
                    day.zeros
                ));
            }
        }

        output.push_str(&"=".repeat(60));
        output.push('\n');
        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Forecast Summary\n\n");
        output.push_str(&format!("**Period:** {}\n\n", self.period()));
        output.push_str(&format!("- **Series:** {}\n", self.series));
        output.push_str(&format!("- **Days:** {}\n", self.days));
        output.push_str(&format!("- **Total units:** {:.2}\n", self.total));
        output.push_str(&format!(
            "- **Zero forecasts:** {:.1}%\n\n",
            self.zero_share * 100.0
        ));

        if !self.daily.is_empty() {
            output.push_str("## Daily Totals\n\n");
            output.push_str("| Day | Total | Mean | Zeros |\n");
            output.push_str("|-----|-------|------|-------|\n");
            for day in &self.daily {
                output.push_str(&format!(
                    "| d_{} | {:.2} | {:.4} | {} |\n",
                    day.day, day.total, day.mean, day.zeros
                ));
            }
        }

        output
    }
}

impl fmt::Display for ForecastSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecast Summary ({})", self.period())?;
        writeln!(f, "  Series: {}", self.series)?;
        writeln!(f, "  Rows: {}", self.rows)?;
        writeln!(f, "  Total units: {:.2}", self.total)?;
        writeln!(f, "  Zero forecasts: {:.1}%", self.zero_share * 100.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ForecastSummary {
        let ids = vec!["A".to_string(), "B".to_string()];
        let table = ForecastTable::from_daily(
            &ids,
            vec![(1914, vec![1.0, 0.0]), (1915, vec![3.0, 4.0])],
            Utc::now(),
        );
        ForecastSummary::from_table(&table)
    }

    #[test]
    fn test_summary_aggregates() {
        let summary = summary();
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.series, 2);
        assert_eq!(summary.days, 2);
        assert_eq!(summary.first_day, Some(1914));
        assert_eq!(summary.last_day, Some(1915));
        assert_eq!(summary.total, 8.0);
        assert_eq!(summary.mean(), 2.0);
        assert_eq!(summary.zero_share, 0.25);
        assert_eq!(summary.daily[1].total, 7.0);
        assert_eq!(summary.daily[0].zeros, 1);
    }

    #[test]
    fn test_renderings() {
        let summary = summary();
        let ascii = summary.to_ascii_table();
        assert!(ascii.contains("d_1914 to d_1915"));
        assert!(ascii.contains("Daily Totals"));

        let markdown = summary.to_markdown();
        assert!(markdown.contains("| d_1915 | 7.00 | 3.5000 | 0 |"));

        assert!(summary.to_string().contains("Rows: 4"));
    }

    #[test]
    fn test_empty_table() {
        let summary = ForecastSummary::from_table(&ForecastTable::default());
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.zero_share, 0.0);
        assert!(summary.to_ascii_table().contains("no forecast days"));
    }
}
