//! A single regression tree from a LightGBM text model.

use super::parse::{parse_array, parse_value};
use crate::error::{ModelError, ModelResult};
use ndarray::ArrayView1;

/// Values within this distance of zero count as zero for missing-value routing.
const ZERO_THRESHOLD: f64 = 1e-35;

const CATEGORICAL_MASK: u8 = 1;
const DEFAULT_LEFT_MASK: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingType {
    None,
    Zero,
    NaN,
}

impl MissingType {
    const fn from_decision(decision_type: u8) -> Self {
        match (decision_type >> 2) & 3 {
            1 => Self::Zero,
            2 => Self::NaN,
            _ => Self::None,
        }
    }
}

/// One tree: internal nodes are indexed from 0, leaves are encoded as
/// negative child ids (`!leaf`).
#[derive(Debug, Clone)]
pub(crate) struct Tree {
    split_feature: Vec<usize>,
    threshold: Vec<f64>,
    decision_type: Vec<u8>,
    left_child: Vec<i32>,
    right_child: Vec<i32>,
    leaf_value: Vec<f64>,
    cat_boundaries: Vec<usize>,
    cat_threshold: Vec<u32>,
}

impl Tree {
    /// Parse the key/value lines of one `Tree=` block.
    pub(crate) fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> ModelResult<Self> {
        let mut num_leaves: Option<usize> = None;
        let mut split_feature = Vec::new();
        let mut threshold = Vec::new();
        let mut decision_type = Vec::new();
        let mut left_child = Vec::new();
        let mut right_child = Vec::new();
        let mut leaf_value = Vec::new();
        let mut cat_boundaries = Vec::new();
        let mut cat_threshold = Vec::new();

        for line in lines {
            let line = line.trim();
            let Some((key, _)) = line.split_once('=') else {
                continue;
            };
            match key {
                "num_leaves" => num_leaves = Some(parse_value(line, "num_leaves=")?),
                "split_feature" => split_feature = parse_array(line, "split_feature=")?,
                "threshold" => threshold = parse_array(line, "threshold=")?,
                "decision_type" => decision_type = parse_array(line, "decision_type=")?,
                "left_child" => left_child = parse_array(line, "left_child=")?,
                "right_child" => right_child = parse_array(line, "right_child=")?,
                "leaf_value" => leaf_value = parse_array(line, "leaf_value=")?,
                "cat_boundaries" => cat_boundaries = parse_array(line, "cat_boundaries=")?,
                "cat_threshold" => cat_threshold = parse_array(line, "cat_threshold=")?,
                "is_linear" => {
                    if parse_value::<u8>(line, "is_linear=")? != 0 {
                        return Err(ModelError::Format(
                            "linear trees are not supported".to_string(),
                        ));
                    }
                }
                _ => {}
            }
        }

        let num_leaves = num_leaves
            .ok_or_else(|| ModelError::Format("tree block has no num_leaves".to_string()))?;
        if leaf_value.len() != num_leaves {
            return Err(ModelError::Format(format!(
                "tree declares {num_leaves} leaves but has {} leaf values",
                leaf_value.len()
            )));
        }

        let internal = num_leaves.saturating_sub(1);
        if decision_type.is_empty() {
            decision_type = vec![0; internal];
        }
        for (name, len) in [
            ("split_feature", split_feature.len()),
            ("threshold", threshold.len()),
            ("decision_type", decision_type.len()),
            ("left_child", left_child.len()),
            ("right_child", right_child.len()),
        ] {
            if len != internal {
                return Err(ModelError::Format(format!(
                    "tree with {num_leaves} leaves has {len} {name} entries, expected {internal}"
                )));
            }
        }

        let in_range = |child: &i32| {
            if *child >= 0 {
                (*child as usize) < internal
            } else {
                (!*child as usize) < num_leaves
            }
        };
        if !left_child.iter().chain(&right_child).all(in_range) {
            return Err(ModelError::Format(
                "tree child index out of range".to_string(),
            ));
        }

        // Internal children always follow their parent, so traversal terminates
        for (node, (left, right)) in left_child.iter().zip(&right_child).enumerate() {
            if [*left, *right]
                .iter()
                .any(|&child| child >= 0 && child as usize <= node)
            {
                return Err(ModelError::Format(format!(
                    "tree node {node} links back to an earlier node"
                )));
            }
        }

        Ok(Self {
            split_feature,
            threshold,
            decision_type,
            left_child,
            right_child,
            leaf_value,
            cat_boundaries,
            cat_threshold,
        })
    }

    /// Highest feature index any split reads.
    pub(crate) fn max_feature(&self) -> Option<usize> {
        self.split_feature.iter().copied().max()
    }

    /// Number of leaves.
    pub(crate) fn num_leaves(&self) -> usize {
        self.leaf_value.len()
    }

    /// Whether any split is categorical.
    pub(crate) fn has_categorical_split(&self) -> bool {
        self.decision_type.iter().any(|d| d & CATEGORICAL_MASK != 0)
    }

    /// Raw output of the tree for one row.
    pub(crate) fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        if self.split_feature.is_empty() {
            return self.leaf_value.first().copied().unwrap_or_default();
        }

        let mut node = 0usize;
        loop {
            let value = row[self.split_feature[node]];
            let next = if self.decision_type[node] & CATEGORICAL_MASK != 0 {
                self.categorical_decision(value, node)
            } else {
                self.numerical_decision(value, node)
            };
            if next < 0 {
                return self.leaf_value[!next as usize];
            }
            node = next as usize;
        }
    }

    fn numerical_decision(&self, value: f64, node: usize) -> i32 {
        let decision = self.decision_type[node];
        let missing = MissingType::from_decision(decision);
        let value = if value.is_nan() && missing != MissingType::NaN {
            0.0
        } else {
            value
        };

        let is_missing = match missing {
            MissingType::Zero => (-ZERO_THRESHOLD..=ZERO_THRESHOLD).contains(&value),
            MissingType::NaN => value.is_nan(),
            MissingType::None => false,
        };
        if is_missing {
            return if decision & DEFAULT_LEFT_MASK != 0 {
                self.left_child[node]
            } else {
                self.right_child[node]
            };
        }

        if value <= self.threshold[node] {
            self.left_child[node]
        } else {
            self.right_child[node]
        }
    }

    fn categorical_decision(&self, value: f64, node: usize) -> i32 {
        let category = if value.is_nan() {
            if MissingType::from_decision(self.decision_type[node]) == MissingType::NaN {
                return self.right_child[node];
            }
            0
        } else {
            // truncates toward zero, so only values at or below -1 fall right
            let category = value as i64;
            if category < 0 {
                return self.right_child[node];
            }
            category as usize
        };
        let slot = self.threshold[node] as usize;

        let (Some(&start), Some(&end)) = (
            self.cat_boundaries.get(slot),
            self.cat_boundaries.get(slot + 1),
        ) else {
            return self.right_child[node];
        };
        let word = category / 32;
        let hit = word < end.saturating_sub(start)
            && self
                .cat_threshold
                .get(start + word)
                .is_some_and(|bits| (bits >> (category % 32)) & 1 == 1);

        if hit {
            self.left_child[node]
        } else {
            self.right_child[node]
        }
    }
}
