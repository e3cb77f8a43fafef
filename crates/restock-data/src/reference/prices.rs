//! Weekly sell prices keyed by (store, item, week).

use super::{coerce_key_column, ensure_unique};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Key columns of the price table, in join order.
pub const PRICE_KEYS: [&str; 3] = ["store_id", "item_id", "wm_yr_wk"];

/// Price column.
pub const PRICE_COLUMN: &str = "sell_price";

/// One weekly price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    /// Store id.
    pub store_id: String,
    /// Item id.
    pub item_id: String,
    /// Walmart week key.
    pub wm_yr_wk: i64,
    /// Sell price for the week.
    pub sell_price: f64,
}

impl PriceRow {
    /// Create a price row.
    pub fn new(
        store_id: impl Into<String>,
        item_id: impl Into<String>,
        wm_yr_wk: i64,
        sell_price: f64,
    ) -> Self {
        Self {
            store_id: store_id.into(),
            item_id: item_id.into(),
            wm_yr_wk,
            sell_price,
        }
    }
}

/// Validated price table.
#[derive(Debug, Clone)]
pub struct PriceTable {
    frame: DataFrame,
}

impl PriceTable {
    /// Validate a price frame: key columns present, non-null and unique.
    pub fn from_frame(mut frame: DataFrame) -> Result<Self> {
        coerce_key_column(&mut frame, "price", "store_id", &DataType::String)?;
        coerce_key_column(&mut frame, "price", "item_id", &DataType::String)?;
        coerce_key_column(&mut frame, "price", "wm_yr_wk", &DataType::Int64)?;
        let price = match frame.column(PRICE_COLUMN) {
            Ok(column) => Some(column.cast(&DataType::Float64)?),
            Err(_) => None,
        };
        if let Some(price) = price {
            frame.with_column(price)?;
        }
        ensure_unique(&frame, "price", &PRICE_KEYS)?;
        Ok(Self { frame })
    }

    /// Build a price table from typed rows.
    pub fn from_rows(rows: &[PriceRow]) -> Result<Self> {
        let frame = DataFrame::new(vec![
            Column::new(
                "store_id".into(),
                rows.iter().map(|r| r.store_id.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "item_id".into(),
                rows.iter().map(|r| r.item_id.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "wm_yr_wk".into(),
                rows.iter().map(|r| r.wm_yr_wk).collect::<Vec<_>>(),
            ),
            Column::new(
                PRICE_COLUMN.into(),
                rows.iter().map(|r| r.sell_price).collect::<Vec<_>>(),
            ),
        ])?;
        Self::from_frame(frame)
    }

    /// The validated frame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Look up one price by linear scan.
    pub fn price(&self, store_id: &str, item_id: &str, wm_yr_wk: i64) -> Result<Option<f64>> {
        let stores = self.frame.column("store_id")?.str()?;
        let items = self.frame.column("item_id")?.str()?;
        let weeks = self.frame.column("wm_yr_wk")?.i64()?;
        let Ok(prices) = self.frame.column(PRICE_COLUMN) else {
            return Ok(None);
        };
        let prices = prices.f64()?;

        for row in 0..self.frame.height() {
            if stores.get(row) == Some(store_id)
                && items.get(row) == Some(item_id)
                && weeks.get(row) == Some(wm_yr_wk)
            {
                return Ok(prices.get(row));
            }
        }
        Ok(None)
    }

    /// Number of price rows.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}
