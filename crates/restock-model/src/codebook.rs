//! Frozen category codebook for text feature columns.
//!
//! Each text column maps to a sorted, deduplicated list of categories; the
//! code of a value is its index in that list. A codebook is derived once per
//! run from the reference frames and can be written to JSON so later runs
//! reuse it verbatim.

use crate::error::{ModelError, ModelResult};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Current codebook format version.
pub const CODEBOOK_VERSION: u32 = 1;

/// Per-column category lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codebook {
    version: u32,
    columns: BTreeMap<String, Vec<String>>,
}

impl Default for Codebook {
    fn default() -> Self {
        Self {
            version: CODEBOOK_VERSION,
            columns: BTreeMap::new(),
        }
    }
}

impl Codebook {
    /// Build a codebook from explicit category lists.
    ///
    /// Categories are sorted and deduplicated.
    pub fn from_categories<I, C, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (C, Vec<S>)>,
        C: Into<String>,
        S: Into<String>,
    {
        let columns = columns
            .into_iter()
            .map(|(name, values)| {
                let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
                (name.into(), set.into_iter().collect())
            })
            .collect();
        Self {
            version: CODEBOOK_VERSION,
            columns,
        }
    }

    /// Derive categories for every text column in `frames` that is also a
    /// model feature.
    ///
    /// Values of a column that appears in several frames are merged.
    pub fn derive(frames: &[&DataFrame], features: &[String]) -> ModelResult<Self> {
        let mut sets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for frame in frames {
            for column in frame.get_columns() {
                if column.dtype() != &DataType::String
                    || !features.iter().any(|f| f.as_str() == column.name().as_str())
                {
                    continue;
                }
                let set = sets.entry(column.name().to_string()).or_default();
                set.extend(column.str()?.into_iter().flatten().map(str::to_string));
            }
        }

        let codebook = Self {
            version: CODEBOOK_VERSION,
            columns: sets
                .into_iter()
                .map(|(name, set)| (name, set.into_iter().collect()))
                .collect(),
        };
        tracing::debug!(
            columns = codebook.columns.len(),
            categories = codebook.columns.values().map(Vec::len).sum::<usize>(),
            "derived codebook"
        );
        Ok(codebook)
    }

    /// Format version.
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Categories of a column, in code order.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.columns.get(column).map(Vec::as_slice)
    }

    /// Whether the codebook covers a column.
    pub fn contains_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Covered column names, sorted.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of covered columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the codebook covers no column.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Code of a value, `None` when the column or the value is unknown.
    pub fn code(&self, column: &str, value: &str) -> Option<usize> {
        self.columns
            .get(column)?
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Read a codebook from JSON, checking version and ordering.
    pub fn load(path: impl AsRef<Path>) -> ModelResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let codebook: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        codebook.validate()?;
        Ok(codebook)
    }

    /// Write the codebook as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> ModelResult<()> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    fn validate(&self) -> ModelResult<()> {
        if self.version != CODEBOOK_VERSION {
            return Err(ModelError::Codebook(format!(
                "version {} is not supported (expected {CODEBOOK_VERSION})",
                self.version
            )));
        }
        for (name, categories) in &self.columns {
            if categories.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(ModelError::Codebook(format!(
                    "categories of '{name}' are not sorted and unique"
                )));
            }
        }
        Ok(())
    }
}
