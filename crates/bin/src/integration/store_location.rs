//! Default location of the forecast database.

use restock::output::{SinkError, SqliteSink};
use std::path::{Path, PathBuf};

/// Platform data directory for Restock.
///
/// - Linux: `~/.local/share/restock/`
/// - macOS: `~/Library/Application Support/restock/`
/// - Windows: `%APPDATA%\restock\`
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("restock")
}

/// Default database path.
pub(crate) fn default_db_path() -> PathBuf {
    default_data_dir().join("forecasts.db")
}

/// Open the SQLite sink at `path`, or at the default location.
pub(crate) fn open_sqlite(path: Option<&Path>, table: &str) -> Result<SqliteSink, SinkError> {
    let path = path.map_or_else(default_db_path, Path::to_path_buf);
    SqliteSink::open(path, table)
}
