//! Lagged sales features.
//!
//! `sales_lag_L` on target day `D` is the sales quantity of the same series on
//! day `D - L`. An absent or unknown observation gives a null.

use crate::error::{BuildError, Result};
use restock_data::{Day, HistoryStore, SeriesUniverse};
use serde::{Deserialize, Serialize};

/// Default lags, all at least as long as the forecast horizon.
pub const DEFAULT_LAGS: [Day; 5] = [28, 35, 42, 49, 56];

/// Strictly increasing set of positive lags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Day>", into = "Vec<Day>")]
pub struct LagSet(Vec<Day>);

impl LagSet {
    /// Validate and create a lag set.
    pub fn new(lags: impl Into<Vec<Day>>) -> Result<Self> {
        let lags = lags.into();
        if lags.is_empty() {
            return Err(BuildError::InvalidConfig("lag set is empty".to_string()));
        }
        if let Some(bad) = lags.iter().find(|&&lag| lag < 1) {
            return Err(BuildError::InvalidConfig(format!(
                "lag {bad} is not a positive number of days"
            )));
        }
        if lags.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(BuildError::InvalidConfig(format!(
                "lags must be strictly increasing, got {lags:?}"
            )));
        }
        Ok(Self(lags))
    }

    /// Lags in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Day> + '_ {
        self.0.iter().copied()
    }

    /// Shortest lag.
    pub fn min(&self) -> Day {
        self.0.first().copied().unwrap_or_default()
    }

    /// Longest lag.
    pub fn max(&self) -> Day {
        self.0.last().copied().unwrap_or_default()
    }

    /// Number of lags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty (never true for a validated set).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for LagSet {
    fn default() -> Self {
        Self(DEFAULT_LAGS.to_vec())
    }
}

impl TryFrom<Vec<Day>> for LagSet {
    type Error = BuildError;

    fn try_from(lags: Vec<Day>) -> Result<Self> {
        Self::new(lags)
    }
}

impl From<LagSet> for Vec<Day> {
    fn from(lags: LagSet) -> Self {
        lags.0
    }
}

/// Lag values for every series of the universe, in universe order.
pub fn lag_values(
    history: &HistoryStore,
    universe: &SeriesUniverse,
    target_day: Day,
    lag: Day,
) -> Vec<Option<f64>> {
    let Some(values) = history.values_on_day(target_day - lag) else {
        return vec![None; universe.len()];
    };
    universe
        .ids()
        .map(|id| values.get(id).copied().flatten())
        .collect()
}
