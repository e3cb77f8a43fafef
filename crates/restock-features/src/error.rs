//! Error types for feature construction.

use polars::prelude::PolarsError;
use restock_data::{DataError, Day};
use thiserror::Error;

/// Errors raised while building a feature frame.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A column the model requires is absent after all joins.
    #[error("Required feature column '{column}' is missing after joins for day {day}")]
    MissingColumn {
        /// Target day being built
        day: Day,
        /// Missing column name
        column: String,
    },

    /// Joins changed the number of rows.
    #[error("Feature frame for day {day} has {actual} rows, expected one per series ({expected})")]
    RowCount {
        /// Target day being built
        day: Day,
        /// Series in the universe
        expected: usize,
        /// Rows produced
        actual: usize,
    },

    /// Lag or window settings are unusable.
    #[error("Invalid feature configuration: {0}")]
    InvalidConfig(String),

    /// Underlying data error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Result type for feature construction.
pub type Result<T> = std::result::Result<T, BuildError>;
