//! Calendar reference table (day → static attributes).

use super::{coerce_key_column, ensure_unique};
use crate::error::{DataError, Result};
use crate::series::{Day, parse_day_label};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column holding the day index.
pub const DAY_COLUMN: &str = "d";

/// Column holding the week key used to look up prices.
pub const WEEK_COLUMN: &str = "wm_yr_wk";

/// One calendar day in the M5 layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRow {
    /// Day index.
    pub day: Day,
    /// ISO date (`YYYY-MM-DD`).
    pub date: String,
    /// Walmart week key.
    pub wm_yr_wk: i64,
    /// Weekday name.
    pub weekday: String,
    /// Day of week, 1 = Saturday.
    pub wday: i32,
    /// Month of year.
    pub month: i32,
    /// Calendar year.
    pub year: i32,
    /// First event name, if any.
    pub event_name_1: Option<String>,
    /// First event type, if any.
    pub event_type_1: Option<String>,
    /// Second event name, if any.
    pub event_name_2: Option<String>,
    /// Second event type, if any.
    pub event_type_2: Option<String>,
    /// SNAP day flag for California.
    pub snap_ca: i32,
    /// SNAP day flag for Texas.
    pub snap_tx: i32,
    /// SNAP day flag for Wisconsin.
    pub snap_wi: i32,
}

/// Validated calendar keyed by day.
#[derive(Debug, Clone)]
pub struct CalendarTable {
    frame: DataFrame,
    weeks: HashMap<Day, i64>,
}

impl CalendarTable {
    /// Validate a calendar frame.
    ///
    /// `d` may hold labels (`d_1914`) or integers; it is stored as `Int32`.
    /// `wm_yr_wk` is stored as `Int64`. Every other column passes through
    /// untouched so the model can select whichever attributes it was trained on.
    pub fn from_frame(mut frame: DataFrame) -> Result<Self> {
        let day_column = frame
            .column(DAY_COLUMN)
            .map_err(|_| DataError::shape("calendar table has no 'd' column"))?;

        if day_column.dtype() == &DataType::String {
            let labels = day_column.str()?;
            let mut days = Vec::with_capacity(labels.len());
            for (row, label) in labels.into_iter().enumerate() {
                let day = label.and_then(parse_day_label).ok_or_else(|| {
                    DataError::shape(format!(
                        "calendar row {row} has unparseable day label {label:?}"
                    ))
                })?;
                days.push(day);
            }
            frame.with_column(Column::new(DAY_COLUMN.into(), days))?;
        }

        coerce_key_column(&mut frame, "calendar", DAY_COLUMN, &DataType::Int32)?;
        coerce_key_column(&mut frame, "calendar", WEEK_COLUMN, &DataType::Int64)?;
        ensure_unique(&frame, "calendar", &[DAY_COLUMN])?;

        let weeks = frame
            .column(DAY_COLUMN)?
            .i32()?
            .into_iter()
            .zip(frame.column(WEEK_COLUMN)?.i64()?)
            .filter_map(|(day, week)| Some((day?, week?)))
            .collect();

        Ok(Self { frame, weeks })
    }

    /// Build a calendar from typed rows.
    pub fn from_rows(rows: &[CalendarRow]) -> Result<Self> {
        let strings = |f: fn(&CalendarRow) -> &str| -> Vec<String> {
            rows.iter().map(|r| f(r).to_string()).collect()
        };
        let optional = |f: fn(&CalendarRow) -> Option<&str>| -> Vec<Option<String>> {
            rows.iter().map(|r| f(r).map(str::to_string)).collect()
        };
        let ints = |f: fn(&CalendarRow) -> i32| -> Vec<i32> { rows.iter().map(f).collect() };

        let frame = DataFrame::new(vec![
            Column::new("date".into(), strings(|r| r.date.as_str())),
            Column::new(
                WEEK_COLUMN.into(),
                rows.iter().map(|r| r.wm_yr_wk).collect::<Vec<i64>>(),
            ),
            Column::new("weekday".into(), strings(|r| r.weekday.as_str())),
            Column::new("wday".into(), ints(|r| r.wday)),
            Column::new("month".into(), ints(|r| r.month)),
            Column::new("year".into(), ints(|r| r.year)),
            Column::new(DAY_COLUMN.into(), ints(|r| r.day)),
            Column::new("event_name_1".into(), optional(|r| r.event_name_1.as_deref())),
            Column::new("event_type_1".into(), optional(|r| r.event_type_1.as_deref())),
            Column::new("event_name_2".into(), optional(|r| r.event_name_2.as_deref())),
            Column::new("event_type_2".into(), optional(|r| r.event_type_2.as_deref())),
            Column::new("snap_CA".into(), ints(|r| r.snap_ca)),
            Column::new("snap_TX".into(), ints(|r| r.snap_tx)),
            Column::new("snap_WI".into(), ints(|r| r.snap_wi)),
        ])?;

        Self::from_frame(frame)
    }

    /// The validated frame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Price week key for a day.
    pub fn week_of(&self, day: Day) -> Option<i64> {
        self.weeks.get(&day).copied()
    }

    /// Whether the calendar covers a day.
    pub fn contains(&self, day: Day) -> bool {
        self.weeks.contains_key(&day)
    }

    /// Number of calendar days.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    /// Whether the calendar is empty.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: Day, week: i64) -> CalendarRow {
        CalendarRow {
            day,
            date: format!("2016-04-{:02}", day % 30 + 1),
            wm_yr_wk: week,
            weekday: "Monday".to_string(),
            wday: 3,
            month: 4,
            year: 2016,
            event_name_1: None,
            event_type_1: None,
            event_name_2: None,
            event_type_2: None,
            snap_ca: 0,
            snap_tx: 1,
            snap_wi: 0,
        }
    }

    #[test]
    fn test_from_rows_indexes_weeks() {
        let calendar = CalendarTable::from_rows(&[row(1914, 11613), row(1915, 11613)]).unwrap();
        assert_eq!(calendar.len(), 2);
        assert_eq!(calendar.week_of(1914), Some(11613));
        assert!(calendar.contains(1915));
        assert_eq!(calendar.week_of(1916), None);
        assert_eq!(calendar.frame().column(DAY_COLUMN).unwrap().dtype(), &DataType::Int32);
    }

    #[test]
    fn test_day_labels_are_parsed() {
        let frame = DataFrame::new(vec![
            Column::new("d".into(), ["d_1", "d_2"]),
            Column::new("wm_yr_wk".into(), [11101i64, 11101]),
        ])
        .unwrap();
        let calendar = CalendarTable::from_frame(frame).unwrap();
        assert_eq!(calendar.week_of(2), Some(11101));
    }

    #[test]
    fn test_bad_day_label_is_rejected() {
        let frame = DataFrame::new(vec![
            Column::new("d".into(), ["d_1", "tomorrow"]),
            Column::new("wm_yr_wk".into(), [11101i64, 11101]),
        ])
        .unwrap();
        assert!(matches!(
            CalendarTable::from_frame(frame),
            Err(DataError::DataShape(_))
        ));
    }

    #[test]
    fn test_repeated_day_is_rejected() {
        let err = CalendarTable::from_rows(&[row(7, 1), row(7, 2)]).unwrap_err();
        assert!(matches!(err, DataError::DataShape(msg) if msg.contains("repeats")));
    }

    #[test]
    fn test_missing_week_column_is_rejected() {
        let frame = DataFrame::new(vec![Column::new("d".into(), [1i32, 2])]).unwrap();
        assert!(matches!(
            CalendarTable::from_frame(frame),
            Err(DataError::DataShape(_))
        ));
    }
}
