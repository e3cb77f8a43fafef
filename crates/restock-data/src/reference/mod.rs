//! Read-only reference tables joined onto every feature row.
//!
//! Both tables wrap a validated polars frame: key columns are coerced to a
//! canonical dtype and checked for nulls and uniqueness, so a left join
//! against them can never fan a series out into several rows.

pub mod calendar;
pub mod prices;

pub use calendar::{CalendarRow, CalendarTable};
pub use prices::{PriceRow, PriceTable};

use crate::error::{DataError, Result};
use polars::prelude::*;

/// Cast a required column in place, failing if it is missing or holds nulls.
pub(crate) fn coerce_key_column(
    frame: &mut DataFrame,
    table: &str,
    name: &str,
    dtype: &DataType,
) -> Result<()> {
    let column = frame
        .column(name)
        .map_err(|_| DataError::shape(format!("{table} table has no '{name}' column")))?;
    if column.null_count() > 0 {
        return Err(DataError::shape(format!(
            "{table} table has {} null value(s) in key column '{name}'",
            column.null_count()
        )));
    }
    let cast = column.cast(dtype)?;
    frame.with_column(cast)?;
    Ok(())
}

/// Fail if any combination of `keys` occurs more than once.
pub(crate) fn ensure_unique(frame: &DataFrame, table: &str, keys: &[&str]) -> Result<()> {
    let key_exprs: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    let duplicates = frame
        .clone()
        .lazy()
        .group_by(key_exprs)
        .agg([col(keys[0]).count().alias("__rows")])
        .filter(col("__rows").gt(lit(1)))
        .collect()?;

    if duplicates.height() > 0 {
        return Err(DataError::shape(format!(
            "{table} table repeats {} key(s) over ({})",
            duplicates.height(),
            keys.join(", ")
        )));
    }
    Ok(())
}
