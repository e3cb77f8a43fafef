//! Error types for model loading and scoring.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while loading or evaluating a model artifact.
#[derive(Debug, Error)]
pub enum ModelError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value in the artifact could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The artifact is structurally invalid
    #[error("Invalid model format: {0}")]
    Format(String),

    /// The objective has no supported output transform
    #[error("Unsupported objective: {0}")]
    UnsupportedObjective(String),

    /// The model produces more than one output per row
    #[error("Model has {0} trees per iteration; only single-output models are supported")]
    MultiOutput(usize),

    /// Input matrix width does not match the model
    #[error("Model expects {expected} input columns, got {actual}")]
    InputWidth {
        /// Declared feature count
        expected: usize,
        /// Columns supplied
        actual: usize,
    },

    /// Codebook content is invalid
    #[error("Invalid codebook: {0}")]
    Codebook(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Result type for model loading and evaluation.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Errors raised while scoring one day's feature frame.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Feature columns differ from the model's declared list
    #[error("Feature columns do not match the model: {}", schema_diff(.expected, .actual))]
    SchemaMismatch {
        /// Model's declared feature list
        expected: Vec<String>,
        /// Columns of the frame
        actual: Vec<String>,
    },

    /// A column has a dtype the scorer cannot coerce
    #[error("Column '{column}' has unsupported dtype {dtype}")]
    UnsupportedDtype {
        /// Column name
        column: String,
        /// Offending dtype
        dtype: String,
    },

    /// The model returned the wrong number of predictions
    #[error("Model returned {actual} predictions for {expected} rows")]
    PredictionCount {
        /// Rows scored
        expected: usize,
        /// Predictions returned
        actual: usize,
    },

    /// Model evaluation error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

fn schema_diff(expected: &[String], actual: &[String]) -> String {
    let missing: Vec<&str> = expected
        .iter()
        .filter(|name| !actual.contains(name))
        .map(String::as_str)
        .collect();
    let extra: Vec<&str> = actual
        .iter()
        .filter(|name| !expected.contains(name))
        .map(String::as_str)
        .collect();
    if missing.is_empty() && extra.is_empty() {
        let position = expected
            .iter()
            .zip(actual)
            .position(|(e, a)| e != a)
            .unwrap_or(0);
        return format!("same columns in a different order (first at position {position})");
    }
    format!(
        "expected {} columns, got {}; missing {missing:?}; unexpected {extra:?}",
        expected.len(),
        actual.len()
    )
}
