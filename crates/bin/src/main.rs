//! Restock CLI binary.
//!
//! Runs recursive demand forecasts and inspects model artifacts.

mod integration;

use clap::{Parser, Subcommand};
use integration::inspect::feature_report;
use integration::run::{Overrides, forecast_with_progress, resolve_config};
use integration::store_location::open_sqlite;
use restock::codebook_from_dir;
use restock::data::Day;
use restock::model::{ForecastModel, LightGbmModel};
use restock::output::{DEFAULT_TABLE, ExportFormat, FileSink, ForecastSummary, ResultSink};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "restock")]
#[command(about = "Restock: recursive retail demand forecasting", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast every series over the horizon
    Forecast {
        /// Directory holding the sales, calendar and price CSV files
        #[arg(long)]
        data_dir: PathBuf,

        /// Model artifact (LightGBM text format)
        #[arg(long)]
        model: Option<PathBuf>,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of days to forecast
        #[arg(long)]
        horizon: Option<usize>,

        /// First forecast day index
        #[arg(long)]
        first_day: Option<Day>,

        /// Days of history to load
        #[arg(long)]
        history_days: Option<usize>,

        /// Frozen codebook to use instead of deriving one
        #[arg(long)]
        codebook: Option<PathBuf>,

        /// Also write the forecasts to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// File format (csv, json or pretty-json)
        #[arg(long, default_value = "csv")]
        format: String,

        /// SQLite database (defaults to the platform data directory)
        #[arg(long)]
        sqlite: Option<PathBuf>,

        /// SQLite table name
        #[arg(long, default_value = DEFAULT_TABLE)]
        table: String,

        /// Skip the SQLite load
        #[arg(long)]
        no_sqlite: bool,

        /// Print the summary as Markdown
        #[arg(long)]
        markdown: bool,
    },

    /// Describe a model artifact
    InspectModel {
        /// Model artifact (LightGBM text format)
        path: PathBuf,
    },

    /// Derive and save the category codebook for a model
    Codebook {
        /// Directory holding the sales, calendar and price CSV files
        #[arg(long)]
        data_dir: PathBuf,

        /// Model artifact (LightGBM text format)
        #[arg(long)]
        model: PathBuf,

        /// Output JSON file
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        let mut source = std::error::Error::source(&*e);
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Forecast {
            data_dir,
            model,
            config,
            horizon,
            first_day,
            history_days,
            codebook,
            output,
            format,
            sqlite,
            table,
            no_sqlite,
            markdown,
        } => {
            let config = resolve_config(
                config.as_deref(),
                Overrides {
                    model,
                    horizon,
                    first_day,
                    history_days,
                    codebook,
                },
            )?;
            let format: ExportFormat = format.parse()?;

            let forecasts = forecast_with_progress(&data_dir, &config)?;

            let mut sinks: Vec<Box<dyn ResultSink>> = Vec::new();
            if !no_sqlite {
                sinks.push(Box::new(open_sqlite(sqlite.as_deref(), &table)?));
            }
            if let Some(path) = output {
                sinks.push(Box::new(FileSink::new(path, format)));
            }
            for sink in &mut sinks {
                let rows = sink.write(&forecasts)?;
                println!("Wrote {} rows to {}", rows, sink.describe());
            }

            let summary = ForecastSummary::from_table(&forecasts);
            if markdown {
                println!("{}", summary.to_markdown());
            } else {
                println!("{}", summary.to_ascii_table());
            }
        }
        Commands::InspectModel { path } => {
            let model = LightGbmModel::from_file(&path)?;
            println!("\n{}", model.summary());
            print!("{}", feature_report(model.feature_names()));
        }
        Commands::Codebook {
            data_dir,
            model,
            out,
        } => {
            let model = LightGbmModel::from_file(&model)?;
            let codebook = codebook_from_dir(&data_dir, model.feature_names())?;
            if let Some(parent) = out.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            codebook.save(&out)?;
            println!(
                "Wrote codebook v{} ({} columns) to {}",
                codebook.version(),
                codebook.len(),
                out.display()
            );
            for column in codebook.column_names() {
                let count = codebook.categories(column).map_or(0, <[String]>::len);
                println!("  {:<16} {} categories", column, count);
            }
        }
    }

    Ok(())
}
