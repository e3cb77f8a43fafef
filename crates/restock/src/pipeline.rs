//! Wiring a loaded data set and a model into an engine.

use crate::config::ForecastConfig;
use crate::engine::RecursiveForecastEngine;
use crate::error::Result;
use restock_data::{CalendarTable, DataSet, PriceTable, ReferenceSet, SeriesUniverse};
use restock_features::FeatureBuilder;
use restock_model::{Codebook, ForecastModel, Scorer};
use std::path::Path;

/// Derive the codebook for `features` from the series identifiers, the
/// calendar and the price table.
///
/// The codebook is derived once per run, before the first forecast day, and
/// never changes while the run is in progress.
pub fn derive_codebook(
    universe: &SeriesUniverse,
    calendar: &CalendarTable,
    prices: &PriceTable,
    features: &[String],
) -> Result<Codebook> {
    let universe = universe.to_frame()?;
    let codebook = Codebook::derive(&[&universe, calendar.frame(), prices.frame()], features)?;
    Ok(codebook)
}

/// Derive the codebook for `features` from the files in `dir`.
///
/// Only series identity is read from the sales file, so the result does not
/// depend on how many days of history it holds.
pub fn codebook_from_dir(dir: impl AsRef<Path>, features: &[String]) -> Result<Codebook> {
    let reference = ReferenceSet::load_dir(dir)?;
    derive_codebook(
        &reference.universe,
        &reference.calendar,
        &reference.prices,
        features,
    )
}

/// Load the codebook named in the configuration, or derive one.
pub fn resolve_codebook(
    data: &DataSet,
    features: &[String],
    config: &ForecastConfig,
) -> Result<Codebook> {
    match &config.codebook_path {
        Some(path) => {
            tracing::info!("using frozen codebook {}", path.display());
            Ok(Codebook::load(path)?)
        }
        None => derive_codebook(&data.universe, &data.calendar, &data.prices, features),
    }
}

/// Build an engine for `data` and `model` under `config`.
pub fn prepare_engine<M: ForecastModel>(
    data: DataSet,
    model: M,
    config: &ForecastConfig,
) -> Result<RecursiveForecastEngine<M>> {
    config.validate()?;
    let features = model.feature_names().to_vec();
    let codebook = resolve_codebook(&data, &features, config)?;
    tracing::debug!(
        features = features.len(),
        codebook_columns = codebook.len(),
        "prepared model inputs"
    );

    let DataSet {
        universe,
        history,
        calendar,
        prices,
        first_forecast_day,
    } = data;
    let builder = FeatureBuilder::new(
        calendar,
        prices,
        config.lag_set.clone(),
        config.window_set.clone(),
        features,
    );

    RecursiveForecastEngine::new(
        builder,
        Scorer::new(codebook),
        model,
        history,
        universe,
        first_forecast_day,
        config.horizon_days,
    )
}
