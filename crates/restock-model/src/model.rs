//! Model contract.

use crate::error::ModelError;
use ndarray::{Array1, ArrayView2};
use std::sync::Arc;

/// A pretrained demand model.
///
/// The declared feature list is the single source of truth for which columns
/// a feature frame must carry and in which order.
pub trait ForecastModel: Send + Sync {
    /// Ordered feature names the model was trained on.
    fn feature_names(&self) -> &[String];

    /// Predict one value per row of `rows` (`n_rows x n_features`).
    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError>;
}

impl<M: ForecastModel + ?Sized> ForecastModel for Box<M> {
    fn feature_names(&self) -> &[String] {
        (**self).feature_names()
    }

    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        (**self).predict(rows)
    }
}

impl<M: ForecastModel + ?Sized> ForecastModel for Arc<M> {
    fn feature_names(&self) -> &[String] {
        (**self).feature_names()
    }

    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        (**self).predict(rows)
    }
}
