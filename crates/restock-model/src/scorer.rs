//! Model input contract and batch scoring.
//!
//! The scorer turns a day's feature frame into the matrix the model was
//! trained on:
//! - text columns are encoded through the frozen [`Codebook`]
//! - floats are rounded through single precision
//! - every remaining null becomes [`MISSING_SENTINEL`]
//!
//! One `predict` call is made per day and every output is clamped at zero.

use crate::codebook::Codebook;
use crate::error::ScoringError;
use crate::model::ForecastModel;
use ndarray::{Array2, ArrayViewMut1};
use polars::prelude::*;
use restock_features::FeatureFrame;

/// Value fed to the model for nulls and unknown categories.
pub const MISSING_SENTINEL: f64 = -1.0;

/// Applies the model's input contract and runs batch inference.
#[derive(Debug, Clone)]
pub struct Scorer {
    codebook: Codebook,
}

impl Scorer {
    /// Create a scorer bound to a frozen codebook.
    pub const fn new(codebook: Codebook) -> Self {
        Self { codebook }
    }

    /// The codebook used for text columns.
    pub const fn codebook(&self) -> &Codebook {
        &self.codebook
    }

    /// Score one day's rows. Returns one non-negative forecast per row.
    pub fn score<M: ForecastModel + ?Sized>(
        &self,
        rows: &FeatureFrame,
        model: &M,
    ) -> Result<Vec<f64>, ScoringError> {
        check_schema(rows.frame(), model.feature_names())?;
        let matrix = self.encode(rows.frame())?;

        let predictions = model.predict(matrix.view())?;
        if predictions.len() != matrix.nrows() {
            return Err(ScoringError::PredictionCount {
                expected: matrix.nrows(),
                actual: predictions.len(),
            });
        }

        // f64::max maps NaN to the other operand
        Ok(predictions.iter().map(|p| p.max(0.0)).collect())
    }

    /// Coerce a frame into the numeric matrix fed to the model.
    pub fn encode(&self, frame: &DataFrame) -> Result<Array2<f64>, ScoringError> {
        let mut matrix = Array2::zeros((frame.height(), frame.width()));
        for (column, target) in frame.get_columns().iter().zip(matrix.columns_mut()) {
            self.encode_column(column, target)?;
        }
        Ok(matrix)
    }

    fn encode_column(
        &self,
        column: &Column,
        mut target: ArrayViewMut1<'_, f64>,
    ) -> Result<(), ScoringError> {
        let name = column.name().as_str();
        match column.dtype() {
            DataType::String => {
                let mut unknown = 0usize;
                for (slot, value) in target.iter_mut().zip(column.str()?) {
                    *slot = match value {
                        Some(v) => match self.codebook.code(name, v) {
                            Some(code) => code as f64,
                            None => {
                                unknown += 1;
                                MISSING_SENTINEL
                            }
                        },
                        None => MISSING_SENTINEL,
                    };
                }
                if unknown > 0 {
                    tracing::warn!(
                        column = name,
                        unknown,
                        "values missing from codebook encoded as {MISSING_SENTINEL}"
                    );
                }
            }
            DataType::Float32 | DataType::Float64 => {
                let values = column.cast(&DataType::Float64)?;
                for (slot, value) in target.iter_mut().zip(values.f64()?) {
                    *slot = match value {
                        Some(v) if !v.is_nan() => f64::from(v as f32),
                        _ => MISSING_SENTINEL,
                    };
                }
            }
            dtype if dtype.is_integer() || dtype.is_bool() => {
                let values = column.cast(&DataType::Float64)?;
                for (slot, value) in target.iter_mut().zip(values.f64()?) {
                    *slot = value.unwrap_or(MISSING_SENTINEL);
                }
            }
            other => {
                return Err(ScoringError::UnsupportedDtype {
                    column: name.to_string(),
                    dtype: other.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Fail unless `frame` carries exactly `expected`, by name and order.
pub fn check_schema(frame: &DataFrame, expected: &[String]) -> Result<(), ScoringError> {
    let actual: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    if actual != expected {
        return Err(ScoringError::SchemaMismatch {
            expected: expected.to_vec(),
            actual,
        });
    }
    Ok(())
}
