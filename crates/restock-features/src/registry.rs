//! Feature Registry
//!
//! Naming scheme for derived sales features and a classifier that maps any
//! model column back to where the builder sources it from.

use crate::rolling::ROLLING_OFFSET;
use restock_data::reference::calendar::DAY_COLUMN;
use restock_data::reference::prices::PRICE_COLUMN;
use restock_data::{Day, ID_COLUMNS};
use std::collections::HashMap;

const LAG_PREFIX: &str = "sales_lag_";
const ROLLING_MEAN_PREFIX: &str = "sales_rolling_mean_";
const ROLLING_STD_PREFIX: &str = "sales_rolling_std_";

/// Where a feature column comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureSource {
    /// Series identity column (item, store, ...)
    Series,
    /// Target day stamp
    Day,
    /// Calendar join
    Calendar,
    /// Price join
    Price,
    /// Sales lag of the given number of days
    Lag(Day),
    /// Rolling mean over the given window length
    RollingMean(usize),
    /// Rolling sample standard deviation over the given window length
    RollingStd(usize),
}

impl FeatureSource {
    /// Short label used in reports.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Day => "day",
            Self::Calendar => "calendar",
            Self::Price => "price",
            Self::Lag(_) => "lag",
            Self::RollingMean(_) => "rolling_mean",
            Self::RollingStd(_) => "rolling_std",
        }
    }
}

/// Feature metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureInfo {
    /// Column name as declared by the model
    pub name: String,
    /// Source of the column
    pub source: FeatureSource,
    /// Human readable description
    pub description: String,
}

/// Column name of a lag feature.
pub fn lag_column(lag: Day) -> String {
    format!("{LAG_PREFIX}{lag}")
}

/// Column name of a rolling mean feature.
pub fn rolling_mean_column(window: usize) -> String {
    format!("{ROLLING_MEAN_PREFIX}{window}")
}

/// Column name of a rolling standard deviation feature.
pub fn rolling_std_column(window: usize) -> String {
    format!("{ROLLING_STD_PREFIX}{window}")
}

/// Classify a column name by its source.
///
/// Anything that is not an identity, day, price or derived sales column is
/// assumed to come from the calendar join.
pub fn classify(name: &str) -> FeatureSource {
    if let Some(lag) = name.strip_prefix(LAG_PREFIX).and_then(|s| s.parse().ok()) {
        return FeatureSource::Lag(lag);
    }
    if let Some(w) = name.strip_prefix(ROLLING_MEAN_PREFIX).and_then(|s| s.parse().ok()) {
        return FeatureSource::RollingMean(w);
    }
    if let Some(w) = name.strip_prefix(ROLLING_STD_PREFIX).and_then(|s| s.parse().ok()) {
        return FeatureSource::RollingStd(w);
    }
    match name {
        n if ID_COLUMNS.contains(&n) => FeatureSource::Series,
        DAY_COLUMN => FeatureSource::Day,
        PRICE_COLUMN => FeatureSource::Price,
        _ => FeatureSource::Calendar,
    }
}

/// Describe every column of a model's feature list, in order.
pub fn describe_features<S: AsRef<str>>(names: &[S]) -> Vec<FeatureInfo> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let source = classify(name);
            let description = match source {
                FeatureSource::Series => format!("series identity '{name}'"),
                FeatureSource::Day => "target day index".to_string(),
                FeatureSource::Calendar => format!("calendar attribute '{name}'"),
                FeatureSource::Price => "weekly sell price".to_string(),
                FeatureSource::Lag(lag) => format!("sales {lag} days before the target day"),
                FeatureSource::RollingMean(w) | FeatureSource::RollingStd(w) => {
                    let stat = if matches!(source, FeatureSource::RollingMean(_)) {
                        "mean"
                    } else {
                        "sample std"
                    };
                    format!(
                        "{stat} of sales over the {w} days ending {ROLLING_OFFSET} days before the target day"
                    )
                }
            };
            FeatureInfo {
                name: name.to_string(),
                source,
                description,
            }
        })
        .collect()
}

/// Count features by source label
pub fn count_by_source(features: &[FeatureInfo]) -> HashMap<&'static str, usize> {
    let mut counts = HashMap::new();
    for feature in features {
        *counts.entry(feature.source.label()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sales_lag_28", FeatureSource::Lag(28))]
    #[case("sales_lag_56", FeatureSource::Lag(56))]
    #[case("sales_rolling_mean_7", FeatureSource::RollingMean(7))]
    #[case("sales_rolling_std_28", FeatureSource::RollingStd(28))]
    #[case("item_id", FeatureSource::Series)]
    #[case("store_id", FeatureSource::Series)]
    #[case("d", FeatureSource::Day)]
    #[case("sell_price", FeatureSource::Price)]
    #[case("snap_CA", FeatureSource::Calendar)]
    #[case("sales_lag_x", FeatureSource::Calendar)]
    fn test_classify(#[case] name: &str, #[case] expected: FeatureSource) {
        assert_eq!(classify(name), expected);
    }

    #[test]
    fn test_column_names_round_trip() {
        assert_eq!(classify(&lag_column(35)), FeatureSource::Lag(35));
        assert_eq!(
            classify(&rolling_mean_column(14)),
            FeatureSource::RollingMean(14)
        );
        assert_eq!(classify(&rolling_std_column(7)), FeatureSource::RollingStd(7));
    }

    #[test]
    fn test_describe_features_keeps_order() {
        let names = ["item_id", "sales_lag_28", "sales_rolling_std_7", "wday"];
        let features = describe_features(&names);

        assert_eq!(features.len(), 4);
        assert_eq!(features[1].name, "sales_lag_28");
        assert!(features[2].description.contains("sample std"));
        assert!(features[3].description.contains("calendar"));

        let counts = count_by_source(&features);
        assert_eq!(counts.get("series"), Some(&1));
        assert_eq!(counts.get("lag"), Some(&1));
        assert_eq!(counts.get("rolling_std"), Some(&1));
        assert_eq!(counts.get("calendar"), Some(&1));
    }
}
