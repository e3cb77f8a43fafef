//! Rolling sales statistics.
//!
//! For target day `D` and window `W` the window covers
//! `[D - ROLLING_OFFSET - W + 1, D - ROLLING_OFFSET]`, so no rolling feature
//! ever reads a day inside the forecast horizon. Only known quantities take
//! part: an empty window gives null mean and std, a single value gives a mean
//! and a null sample std.

use crate::error::{BuildError, Result};
use restock_data::{Day, HistoryStore, SeriesUniverse};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Distance between the target day and the newest day a window reads.
pub const ROLLING_OFFSET: Day = 28;

/// Default window lengths.
pub const DEFAULT_WINDOWS: [usize; 3] = [7, 14, 28];

/// Distinct, positive window lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct WindowSet(Vec<usize>);

impl WindowSet {
    /// Validate and create a window set.
    pub fn new(windows: impl Into<Vec<usize>>) -> Result<Self> {
        let windows = windows.into();
        if windows.is_empty() {
            return Err(BuildError::InvalidConfig("window set is empty".to_string()));
        }
        if windows.contains(&0) {
            return Err(BuildError::InvalidConfig(
                "rolling window length must be at least one day".to_string(),
            ));
        }
        let mut sorted = windows.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != windows.len() {
            return Err(BuildError::InvalidConfig(format!(
                "rolling windows repeat a length: {windows:?}"
            )));
        }
        Ok(Self(windows))
    }

    /// Window lengths in configured order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Longest window.
    pub fn max(&self) -> usize {
        self.0.iter().copied().max().unwrap_or_default()
    }

    /// Number of windows.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty (never true for a validated set).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for WindowSet {
    fn default() -> Self {
        Self(DEFAULT_WINDOWS.to_vec())
    }
}

impl TryFrom<Vec<usize>> for WindowSet {
    type Error = BuildError;

    fn try_from(windows: Vec<usize>) -> Result<Self> {
        Self::new(windows)
    }
}

impl From<WindowSet> for Vec<usize> {
    fn from(windows: WindowSet) -> Self {
        windows.0
    }
}

/// Days read by a window of length `window` for `target_day`.
pub fn rolling_range(target_day: Day, window: usize) -> RangeInclusive<Day> {
    let end = target_day - ROLLING_OFFSET;
    let len = Day::try_from(window).unwrap_or(Day::MAX);
    end.saturating_sub(len - 1)..=end
}

/// Mean and sample standard deviation of the known values in a window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RollingStat {
    /// Mean, null when the window holds no known value
    pub mean: Option<f64>,
    /// Sample std (n - 1), null with fewer than two known values
    pub std: Option<f64>,
    /// Known values in the window
    pub count: usize,
}

/// Summarize a set of known values.
pub fn summarize(values: &[f64]) -> RollingStat {
    let count = values.len();
    if count == 0 {
        return RollingStat::default();
    }
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });
    RollingStat {
        mean: Some(mean),
        std,
        count,
    }
}

/// Rolling statistics for every series of the universe, in universe order.
pub fn rolling_stats(
    history: &HistoryStore,
    universe: &SeriesUniverse,
    target_day: Day,
    window: usize,
) -> Vec<RollingStat> {
    let mut values: Vec<Vec<f64>> = vec![Vec::with_capacity(window); universe.len()];
    for obs in history.window(None, rolling_range(target_day, window)) {
        if let (Some(position), Some(quantity)) = (universe.position(obs.series_id), obs.quantity)
        {
            values[position].push(quantity);
        }
    }
    values.iter().map(|v| summarize(v)).collect()
}
