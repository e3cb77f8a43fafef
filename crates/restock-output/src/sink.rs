//! Result sinks: where a finished forecast table is delivered.
//!
//! A sink only ever sees a complete table. Every implementation checks the
//! table with [`ForecastTable::check_complete`] before writing anything.

use crate::export::{ExportError, ExportFormat, Exporter};
use crate::forecast::{ForecastRow, ForecastTable};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default SQLite table name.
pub const DEFAULT_TABLE: &str = "forecasts";

/// Errors raised while delivering results.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The table is not a full (series x day) grid
    #[error("Incomplete forecast table: {0}")]
    Incomplete(String),

    /// Table name is not a plain SQL identifier
    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    /// Export error
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for the rows of a finished run.
pub trait ResultSink {
    /// Short description used in logs.
    fn describe(&self) -> String;

    /// Deliver the table, returning the number of rows written.
    fn write(&mut self, table: &ForecastTable) -> Result<usize, SinkError>;
}

/// Writes the table to a CSV or JSON file.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    format: ExportFormat,
}

impl FileSink {
    /// Create a file sink.
    pub fn new(path: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for FileSink {
    fn describe(&self) -> String {
        format!("{} file {}", self.format.extension(), self.path.display())
    }

    fn write(&mut self, table: &ForecastTable) -> Result<usize, SinkError> {
        table.check_complete()?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        table.export_to_file(&self.path, self.format)?;
        tracing::info!(rows = table.len(), "wrote forecasts to {}", self.path.display());
        Ok(table.len())
    }
}

/// Loads the table into SQLite with write-truncate semantics.
///
/// The delete and every insert run in one transaction, so readers see either
/// the previous run or the new one.
#[derive(Debug)]
pub struct SqliteSink {
    conn: Connection,
    table: String,
}

impl SqliteSink {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>, table: impl Into<String>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?, table)
    }

    /// Create an in-memory database (useful for testing).
    pub fn in_memory(table: impl Into<String>) -> Result<Self, SinkError> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: impl Into<String>) -> Result<Self, SinkError> {
        let table = table.into();
        let valid = !table.is_empty()
            && !table.starts_with(|c: char| c.is_ascii_digit())
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(SinkError::InvalidTable(table));
        }

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    series_id TEXT NOT NULL,
                    day INTEGER NOT NULL,
                    forecast REAL NOT NULL,
                    generated_at TEXT NOT NULL,
                    PRIMARY KEY (series_id, day)
                )"
            ),
            [],
        )?;
        Ok(Self { conn, table })
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Number of stored rows.
    pub fn count(&self) -> Result<usize, SinkError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Read stored rows ordered by day, then series id.
    pub fn read_all(&self) -> Result<Vec<ForecastRow>, SinkError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT series_id, day, forecast, generated_at FROM {} ORDER BY day, series_id",
            self.table
        ))?;
        let rows = stmt
            .query_map([], |row| {
                let stamp: String = row.get(3)?;
                let generated_at = DateTime::parse_from_rfc3339(&stamp)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            3,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                Ok(ForecastRow {
                    series_id: row.get(0)?,
                    day: row.get(1)?,
                    forecast: row.get(2)?,
                    generated_at,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl ResultSink for SqliteSink {
    fn describe(&self) -> String {
        format!("sqlite table {}", self.table)
    }

    fn write(&mut self, table: &ForecastTable) -> Result<usize, SinkError> {
        table.check_complete()?;

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", self.table), [])?;
        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {} (series_id, day, forecast, generated_at) VALUES (?1, ?2, ?3, ?4)",
                self.table
            ))?;
            for row in table.rows() {
                insert.execute(params![
                    row.series_id,
                    row.day,
                    row.forecast,
                    row.generated_at.to_rfc3339()
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!(rows = table.len(), table = %self.table, "loaded forecasts into SQLite");
        Ok(table.len())
    }
}
