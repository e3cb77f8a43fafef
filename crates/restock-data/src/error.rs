//! Error types for history and reference data.

use crate::series::Day;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or extending sales data.
#[derive(Debug, Error)]
pub enum DataError {
    /// An observation for this (series, day) pair is already stored.
    #[error("Duplicate observation for series {series_id} on day {day}")]
    DuplicateKey {
        /// Series that collided
        series_id: String,
        /// Day that collided
        day: Day,
    },

    /// A reference or history table is malformed or incomplete.
    #[error("Malformed data: {0}")]
    DataShape(String),

    /// An expected input file does not exist.
    #[error("Missing input file: {}", .0.display())]
    MissingFile(PathBuf),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Shorthand for a [`DataError::DataShape`] error.
    pub fn shape(message: impl Into<String>) -> Self {
        Self::DataShape(message.into())
    }
}
