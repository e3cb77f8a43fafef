//! Append-only store of daily sales observations.
//!
//! The store is seeded with true history and then extended with one day of
//! forecasts per iteration of the recursive loop. Rows are never replaced or
//! removed, so a feature computed for an earlier day can always be reproduced
//! from the same store.

use crate::error::{DataError, Result};
use crate::series::Day;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::RangeInclusive;

/// One (series, day, quantity) fact.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Series id.
    pub series_id: String,
    /// Day index.
    pub day: Day,
    /// Quantity sold (or forecast); `None` when unknown.
    pub quantity: Option<f64>,
}

impl Observation {
    /// Create a known observation.
    pub fn new(series_id: impl Into<String>, day: Day, quantity: f64) -> Self {
        Self {
            series_id: series_id.into(),
            day,
            quantity: Some(quantity),
        }
    }

    /// Create an observation whose quantity is unknown.
    pub fn unknown(series_id: impl Into<String>, day: Day) -> Self {
        Self {
            series_id: series_id.into(),
            day,
            quantity: None,
        }
    }
}

/// Borrowed view of a stored observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationView<'a> {
    /// Series id.
    pub series_id: &'a str,
    /// Day index.
    pub day: Day,
    /// Stored quantity.
    pub quantity: Option<f64>,
}

/// Time-indexed table of observations, keyed by (day, series).
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    days: BTreeMap<Day, HashMap<String, Option<f64>>>,
    len: usize,
}

impl HistoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the initial history.
    ///
    /// Fails with [`DataError::DuplicateKey`] if the seed repeats a (series, day).
    pub fn seed(observations: impl IntoIterator<Item = Observation>) -> Result<Self> {
        let mut store = Self::new();
        store.append(observations)?;
        tracing::debug!(
            observations = store.len,
            first_day = ?store.first_day(),
            last_day = ?store.last_day(),
            "seeded history store"
        );
        Ok(store)
    }

    /// Add observations to the store.
    ///
    /// The batch is checked before anything is written: if any (series, day)
    /// already exists, or appears twice in the batch, the store is left
    /// untouched and [`DataError::DuplicateKey`] is returned.
    pub fn append(&mut self, observations: impl IntoIterator<Item = Observation>) -> Result<()> {
        let batch: Vec<Observation> = observations.into_iter().collect();

        let mut seen: HashSet<(&str, Day)> = HashSet::with_capacity(batch.len());
        for obs in &batch {
            let exists = self
                .days
                .get(&obs.day)
                .is_some_and(|day| day.contains_key(&obs.series_id));
            if exists || !seen.insert((obs.series_id.as_str(), obs.day)) {
                return Err(DataError::DuplicateKey {
                    series_id: obs.series_id.clone(),
                    day: obs.day,
                });
            }
        }

        self.len += batch.len();
        for obs in batch {
            self.days
                .entry(obs.day)
                .or_default()
                .insert(obs.series_id, obs.quantity);
        }
        Ok(())
    }

    /// Observations for the given series within a closed day range.
    ///
    /// `series` of `None` selects every series. The result carries no ordering
    /// guarantee and simply omits days that were never observed.
    pub fn window<'a>(
        &'a self,
        series: Option<&HashSet<&str>>,
        days: RangeInclusive<Day>,
    ) -> Vec<ObservationView<'a>> {
        if days.is_empty() {
            return Vec::new();
        }
        self.days
            .range(days)
            .flat_map(|(&day, values)| {
                values
                    .iter()
                    .filter(move |(id, _)| series.is_none_or(|set| set.contains(id.as_str())))
                    .map(move |(id, &quantity)| ObservationView {
                        series_id: id.as_str(),
                        day,
                        quantity,
                    })
            })
            .collect()
    }

    /// Quantity per series id for one exact day.
    pub fn values_on_day(&self, day: Day) -> Option<&HashMap<String, Option<f64>>> {
        self.days.get(&day)
    }

    /// Quantity of one series on one day, `None` when absent or unknown.
    pub fn get(&self, series_id: &str, day: Day) -> Option<f64> {
        self.days.get(&day).and_then(|d| d.get(series_id).copied().flatten())
    }

    /// Whether an observation exists for (series, day), known or not.
    pub fn contains(&self, series_id: &str, day: Day) -> bool {
        self.days
            .get(&day)
            .is_some_and(|d| d.contains_key(series_id))
    }

    /// Earliest stored day.
    pub fn first_day(&self) -> Option<Day> {
        self.days.keys().next().copied()
    }

    /// Latest stored day.
    pub fn last_day(&self) -> Option<Day> {
        self.days.keys().next_back().copied()
    }

    /// Total number of observations.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the store holds no observations.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> HistoryStore {
        HistoryStore::seed([
            Observation::new("a", 1, 1.0),
            Observation::new("a", 2, 2.0),
            Observation::new("b", 1, 5.0),
            Observation::unknown("b", 2),
            Observation::new("a", 4, 4.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_seed_and_lookup() {
        let store = seeded();
        assert_eq!(store.len(), 5);
        assert_eq!(store.first_day(), Some(1));
        assert_eq!(store.last_day(), Some(4));
        assert_eq!(store.get("a", 2), Some(2.0));
        assert_eq!(store.get("b", 2), None);
        assert!(store.contains("b", 2));
        assert!(!store.contains("b", 3));
    }

    #[test]
    fn test_seed_rejects_duplicates() {
        let err = HistoryStore::seed([Observation::new("a", 1, 1.0), Observation::new("a", 1, 2.0)])
            .unwrap_err();
        assert!(matches!(err, DataError::DuplicateKey { ref series_id, day: 1 } if series_id == "a"));
    }

    #[test]
    fn test_append_collision_leaves_store_untouched() {
        let mut store = seeded();
        let err = store
            .append([Observation::new("c", 5, 1.0), Observation::new("a", 2, 9.0)])
            .unwrap_err();

        assert!(matches!(err, DataError::DuplicateKey { day: 2, .. }));
        assert_eq!(store.len(), 5);
        assert!(!store.contains("c", 5));
        assert_eq!(store.get("a", 2), Some(2.0));
    }

    #[test]
    fn test_append_extends_history() {
        let mut store = seeded();
        store
            .append([Observation::new("a", 5, 7.0), Observation::new("b", 5, 0.0)])
            .unwrap();
        assert_eq!(store.last_day(), Some(5));
        assert_eq!(store.values_on_day(5).map(HashMap::len), Some(2));
        assert_eq!(store.get("a", 5), Some(7.0));
    }

    #[test]
    fn test_values_on_day() {
        let store = seeded();
        let day1 = store.values_on_day(1).unwrap();
        assert_eq!(day1.get("a"), Some(&Some(1.0)));
        assert_eq!(day1.get("b"), Some(&Some(5.0)));
        assert!(store.values_on_day(3).is_none());
    }

    #[test]
    fn test_window_is_closed_and_filtered() {
        let store = seeded();

        let all = store.window(None, 2..=4);
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|o| (2..=4).contains(&o.day)));

        let only_a: HashSet<&str> = ["a"].into_iter().collect();
        let mut a = store.window(Some(&only_a), 1..=4);
        a.sort_by_key(|o| o.day);
        let days: Vec<Day> = a.iter().map(|o| o.day).collect();
        assert_eq!(days, vec![1, 2, 4]);

        #[allow(clippy::reversed_empty_ranges)]
        let empty = store.window(None, 4..=1);
        assert!(empty.is_empty());
    }
}
