//! Series identities and the fixed forecast universe.
//!
//! A series is one (item, store) pair from the M5 sales matrix. The universe is
//! derived once from history and never changes during a run, so every forecast
//! day scores exactly the same rows in exactly the same order.

use crate::error::{DataError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Integer day index (`d_1` is day 1).
pub type Day = i32;

/// Identifier columns of the sales matrix, in source order.
pub const ID_COLUMNS: [&str; 6] = ["id", "item_id", "dept_id", "cat_id", "store_id", "state_id"];

/// Categorical identity of one forecast series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    /// Unique series id (e.g. `HOBBIES_1_001_CA_1_validation`).
    pub id: String,
    /// Item id.
    pub item_id: String,
    /// Department id.
    pub dept_id: String,
    /// Category id.
    pub cat_id: String,
    /// Store id.
    pub store_id: String,
    /// State id.
    pub state_id: String,
}

impl SeriesKey {
    /// Create a series key.
    pub fn new(
        id: impl Into<String>,
        item_id: impl Into<String>,
        dept_id: impl Into<String>,
        cat_id: impl Into<String>,
        store_id: impl Into<String>,
        state_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            item_id: item_id.into(),
            dept_id: dept_id.into(),
            cat_id: cat_id.into(),
            store_id: store_id.into(),
            state_id: state_id.into(),
        }
    }
}

/// Deduplicated, ordered set of series to forecast.
#[derive(Debug, Clone, Default)]
pub struct SeriesUniverse {
    keys: Vec<SeriesKey>,
    index: HashMap<String, usize>,
}

impl SeriesUniverse {
    /// Build a universe from keys, keeping the first occurrence of each id.
    pub fn new(keys: impl IntoIterator<Item = SeriesKey>) -> Self {
        let mut universe = Self::default();
        for key in keys {
            if universe.index.contains_key(&key.id) {
                continue;
            }
            universe.index.insert(key.id.clone(), universe.keys.len());
            universe.keys.push(key);
        }
        universe
    }

    /// Derive the universe from a frame carrying the [`ID_COLUMNS`].
    pub fn from_frame(frame: &DataFrame) -> Result<Self> {
        let mut columns = Vec::with_capacity(ID_COLUMNS.len());
        for name in ID_COLUMNS {
            let column = frame
                .column(name)
                .map_err(|_| DataError::shape(format!("sales history has no '{name}' column")))?
                .cast(&DataType::String)?;
            columns.push(column);
        }

        let mut keys = Vec::with_capacity(frame.height());
        for row in 0..frame.height() {
            let mut values = Vec::with_capacity(ID_COLUMNS.len());
            for (name, column) in ID_COLUMNS.iter().zip(&columns) {
                let value = column.str()?.get(row).ok_or_else(|| {
                    DataError::shape(format!("null '{name}' in sales history row {row}"))
                })?;
                values.push(value.to_string());
            }
            let [id, item_id, dept_id, cat_id, store_id, state_id]: [String; 6] = values
                .try_into()
                .map_err(|_| DataError::shape("series identity must have six columns"))?;
            keys.push(SeriesKey {
                id,
                item_id,
                dept_id,
                cat_id,
                store_id,
                state_id,
            });
        }

        Ok(Self::new(keys))
    }

    /// Series keys in universe order.
    pub fn keys(&self) -> &[SeriesKey] {
        &self.keys
    }

    /// Series ids in universe order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.id.as_str())
    }

    /// Position of a series id in the universe.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Check whether a series id is part of the universe.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of series.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the universe is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// One row per series with the [`ID_COLUMNS`] as string columns.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let pick = |f: fn(&SeriesKey) -> &str| -> Vec<String> {
            self.keys.iter().map(|k| f(k).to_string()).collect()
        };
        let frame = DataFrame::new(vec![
            Column::new("id".into(), pick(|k| k.id.as_str())),
            Column::new("item_id".into(), pick(|k| k.item_id.as_str())),
            Column::new("dept_id".into(), pick(|k| k.dept_id.as_str())),
            Column::new("cat_id".into(), pick(|k| k.cat_id.as_str())),
            Column::new("store_id".into(), pick(|k| k.store_id.as_str())),
            Column::new("state_id".into(), pick(|k| k.state_id.as_str())),
        ])?;
        Ok(frame)
    }
}

/// Parse a day label such as `d_1914` into its day index.
///
/// The first run of ASCII digits is taken, so bare numbers parse as well.
pub fn parse_day_label(label: &str) -> Option<Day> {
    let start = label.find(|c: char| c.is_ascii_digit())?;
    let digits: String = label[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Column label for a day in the wide sales matrix.
pub fn day_label(day: Day) -> String {
    format!("d_{day}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn key(id: &str, store: &str) -> SeriesKey {
        SeriesKey::new(id, "FOODS_1_001", "FOODS_1", "FOODS", store, "CA")
    }

    #[test]
    fn test_universe_deduplicates_on_id() {
        let universe = SeriesUniverse::new([key("a", "CA_1"), key("b", "CA_2"), key("a", "CA_3")]);

        assert_eq!(universe.len(), 2);
        assert_eq!(universe.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(universe.keys()[0].store_id, "CA_1");
        assert_eq!(universe.position("b"), Some(1));
        assert!(!universe.contains("c"));
    }

    #[test]
    fn test_universe_frame_roundtrip_keeps_order() {
        let universe = SeriesUniverse::new([key("z", "CA_1"), key("a", "CA_2")]);
        let frame = universe.to_frame().unwrap();
        assert_eq!(frame.height(), 2);

        let back = SeriesUniverse::from_frame(&frame).unwrap();
        assert_eq!(back.keys(), universe.keys());
    }

    #[test]
    fn test_universe_from_frame_requires_id_columns() {
        let frame = DataFrame::new(vec![Column::new("id".into(), vec!["a"])]).unwrap();
        let err = SeriesUniverse::from_frame(&frame).unwrap_err();
        assert!(matches!(err, DataError::DataShape(_)));
    }

    #[rstest]
    #[case("d_1914", Some(1914))]
    #[case("d_1", Some(1))]
    #[case("1886", Some(1886))]
    #[case("day", None)]
    fn test_parse_day_label(#[case] label: &str, #[case] expected: Option<Day>) {
        assert_eq!(parse_day_label(label), expected);
    }

    #[test]
    fn test_day_label() {
        assert_eq!(day_label(1913), "d_1913");
        assert_eq!(parse_day_label(&day_label(42)), Some(42));
    }
}
