//! Forecast run driven from the command line.

use indicatif::{ProgressBar, ProgressStyle};
use restock::data::{DataSet, Day};
use restock::model::LightGbmModel;
use restock::output::ForecastTable;
use restock::{ForecastConfig, prepare_engine};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config fields that can be set from flags.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) model: Option<PathBuf>,
    pub(crate) horizon: Option<usize>,
    pub(crate) first_day: Option<Day>,
    pub(crate) history_days: Option<usize>,
    pub(crate) codebook: Option<PathBuf>,
}

/// Read the config file (if any), then apply flag overrides.
pub(crate) fn resolve_config(
    path: Option<&Path>,
    overrides: Overrides,
) -> restock::Result<ForecastConfig> {
    let mut config = match path {
        Some(path) => ForecastConfig::from_json_file(path)?,
        None => ForecastConfig::default(),
    };

    if let Some(model) = overrides.model {
        config.model_path = model;
    }
    if let Some(horizon) = overrides.horizon {
        config.horizon_days = horizon;
    }
    if let Some(day) = overrides.first_day {
        config.first_forecast_day = Some(day);
    }
    if let Some(days) = overrides.history_days {
        config.history_days = days;
    }
    if let Some(codebook) = overrides.codebook {
        config.codebook_path = Some(codebook);
    }

    config.validate()?;
    Ok(config)
}

/// Load inputs, run the full horizon and return the table.
pub(crate) fn forecast_with_progress(
    data_dir: &Path,
    config: &ForecastConfig,
) -> Result<ForecastTable, Box<dyn Error>> {
    print!("Loading data from {}...", data_dir.display());
    std::io::Write::flush(&mut std::io::stdout())?;
    let data = DataSet::load_dir(data_dir, &config.ingest_config())?;
    println!(
        " ✓ ({} series, {} observations)",
        data.universe.len(),
        data.history.len()
    );

    print!("Loading model {}...", config.model_path.display());
    std::io::Write::flush(&mut std::io::stdout())?;
    let model = LightGbmModel::from_file(&config.model_path)?;
    println!(" ✓ ({} trees)", model.num_trees());

    let engine = prepare_engine(data, model, config)?;
    println!(
        "Forecasting d_{} to d_{}",
        engine.first_day(),
        engine.first_day() + Day::try_from(engine.horizon())? - 1
    );

    let pb = ProgressBar::new(u64::try_from(engine.horizon()).unwrap_or(u64::MAX));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Building features...");

    let result = engine.run_with_progress(|report| {
        pb.inc(1);
        pb.set_message(format!(
            "d_{} mean {:.3}",
            report.day, report.mean_forecast
        ));
    });

    match result {
        Ok(table) => {
            pb.finish_with_message(format!("Forecast {} rows", table.len()));
            Ok(table)
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = resolve_config(
            None,
            Overrides {
                horizon: Some(7),
                first_day: Some(1914),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.horizon_days, 7);
        assert_eq!(config.first_forecast_day, Some(1914));
        assert_eq!(config.history_days, 100);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let result = resolve_config(
            None,
            Overrides {
                horizon: Some(0),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }
}
