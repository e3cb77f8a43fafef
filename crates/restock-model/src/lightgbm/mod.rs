//! LightGBM text-model booster.
//!
//! Reads the text format written by `Booster.save_model` and evaluates it in
//! Rust. Only the header keys and tree arrays needed for prediction are read;
//! everything after `end of trees` (importances, parameters) is ignored.
//! Rows are scored in parallel through ndarray's rayon-backed `Zip`.

mod parse;
mod tree;

use crate::error::{ModelError, ModelResult};
use crate::model::ForecastModel;
use ndarray::{Array1, ArrayView2, Zip};
use parse::{parse_array, parse_value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tree::Tree;

/// Training objective, which fixes the output transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Squared-error regression (any `regression*` variant)
    Regression,
    /// Huber loss
    Huber,
    /// Fair loss
    Fair,
    /// Quantile regression
    Quantile,
    /// Mean absolute percentage error
    Mape,
    /// Poisson regression, log link
    Poisson,
    /// Gamma regression, log link
    Gamma,
    /// Tweedie regression, log link
    Tweedie,
}

impl Objective {
    /// Parse the first token of an `objective=` header value.
    pub fn from_name(name: &str) -> ModelResult<Self> {
        let objective = match name {
            n if n.starts_with("regression") => Self::Regression,
            "huber" => Self::Huber,
            "fair" => Self::Fair,
            "quantile" => Self::Quantile,
            "mape" => Self::Mape,
            "poisson" => Self::Poisson,
            "gamma" => Self::Gamma,
            "tweedie" => Self::Tweedie,
            other => return Err(ModelError::UnsupportedObjective(other.to_string())),
        };
        Ok(objective)
    }

    /// Whether raw scores go through `exp`.
    pub const fn is_log_link(&self) -> bool {
        matches!(self, Self::Poisson | Self::Gamma | Self::Tweedie)
    }

    /// Map a raw ensemble score to the prediction scale.
    pub fn transform(&self, raw: f64) -> f64 {
        if self.is_log_link() { raw.exp() } else { raw }
    }

    /// Objective name as LightGBM writes it.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Regression => "regression",
            Self::Huber => "huber",
            Self::Fair => "fair",
            Self::Quantile => "quantile",
            Self::Mape => "mape",
            Self::Poisson => "poisson",
            Self::Gamma => "gamma",
            Self::Tweedie => "tweedie",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Header keys read before the first tree.
#[derive(Debug, Default)]
struct Header {
    max_feature_idx: Option<usize>,
    objective: Option<Objective>,
    feature_names: Option<Vec<String>>,
    num_tree_per_iteration: Option<usize>,
    average_output: bool,
}

impl Header {
    fn read(&mut self, line: &str) -> ModelResult<()> {
        if line == "average_output" {
            self.average_output = true;
            return Ok(());
        }
        let Some((key, value)) = line.split_once('=') else {
            return Ok(());
        };
        match key {
            "max_feature_idx" => self.max_feature_idx = Some(parse_value(line, "max_feature_idx=")?),
            "num_tree_per_iteration" => {
                self.num_tree_per_iteration = Some(parse_value(line, "num_tree_per_iteration=")?);
            }
            "objective" => {
                let name = value.split_whitespace().next().unwrap_or_default();
                self.objective = Some(Objective::from_name(name)?);
            }
            "feature_names" => self.feature_names = Some(parse_array(line, "feature_names=")?),
            _ => {}
        }
        Ok(())
    }
}

/// Facts about a loaded model, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Training objective
    pub objective: Objective,
    /// Number of trees
    pub trees: usize,
    /// Number of input features
    pub features: usize,
    /// Leaves summed over all trees
    pub leaves: usize,
    /// Trees with at least one categorical split
    pub categorical_trees: usize,
    /// Whether the output is the mean rather than the sum of trees
    pub average_output: bool,
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Objective:          {}", self.objective)?;
        writeln!(f, "Trees:              {}", self.trees)?;
        writeln!(f, "Features:           {}", self.features)?;
        writeln!(f, "Leaves:             {}", self.leaves)?;
        writeln!(f, "Categorical trees:  {}", self.categorical_trees)?;
        write!(f, "Average output:     {}", self.average_output)
    }
}

/// A LightGBM regression model evaluated in Rust.
#[derive(Debug, Clone)]
pub struct LightGbmModel {
    trees: Vec<Tree>,
    feature_names: Vec<String>,
    objective: Objective,
    average_output: bool,
}

impl LightGbmModel {
    /// Load a model from a text file.
    pub fn from_file(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let model = Self::from_model_text(&text)?;
        tracing::info!(
            trees = model.trees.len(),
            features = model.feature_names.len(),
            objective = %model.objective,
            "loaded LightGBM model from {}",
            path.display()
        );
        Ok(model)
    }

    /// Parse a model from its text representation.
    pub fn from_model_text(text: &str) -> ModelResult<Self> {
        let mut header = Header::default();
        let mut blocks: Vec<Vec<&str>> = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line == "end of trees" {
                break;
            }
            if line.starts_with("Tree=") {
                blocks.push(Vec::new());
            } else if let Some(block) = blocks.last_mut() {
                block.push(line);
            } else {
                header.read(line)?;
            }
        }

        let per_iteration = header.num_tree_per_iteration.unwrap_or(1);
        if per_iteration != 1 {
            return Err(ModelError::MultiOutput(per_iteration));
        }
        let objective = header
            .objective
            .ok_or_else(|| ModelError::Format("model header has no objective".to_string()))?;
        let feature_names = header
            .feature_names
            .ok_or_else(|| ModelError::Format("model header has no feature_names".to_string()))?;
        if let Some(max_idx) = header.max_feature_idx
            && max_idx + 1 != feature_names.len()
        {
            return Err(ModelError::Format(format!(
                "max_feature_idx={max_idx} but {} feature names",
                feature_names.len()
            )));
        }

        let trees = blocks
            .into_iter()
            .map(Tree::from_lines)
            .collect::<ModelResult<Vec<_>>>()?;
        if trees.is_empty() {
            return Err(ModelError::Format("model contains no trees".to_string()));
        }
        if let Some(max) = trees.iter().filter_map(Tree::max_feature).max()
            && max >= feature_names.len()
        {
            return Err(ModelError::Format(format!(
                "a split reads feature {max} but only {} are declared",
                feature_names.len()
            )));
        }

        Ok(Self {
            trees,
            feature_names,
            objective,
            average_output: header.average_output,
        })
    }

    /// Training objective.
    pub const fn objective(&self) -> Objective {
        self.objective
    }

    /// Number of trees.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Summary for reports.
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            objective: self.objective,
            trees: self.trees.len(),
            features: self.feature_names.len(),
            leaves: self.trees.iter().map(Tree::num_leaves).sum(),
            categorical_trees: self
                .trees
                .iter()
                .filter(|t| t.has_categorical_split())
                .count(),
            average_output: self.average_output,
        }
    }

    fn predict_row(&self, row: ndarray::ArrayView1<'_, f64>) -> f64 {
        let mut raw: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        if self.average_output {
            raw /= self.trees.len() as f64;
        }
        self.objective.transform(raw)
    }
}

impl ForecastModel for LightGbmModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, rows: ArrayView2<'_, f64>) -> ModelResult<Array1<f64>> {
        if rows.ncols() != self.feature_names.len() {
            return Err(ModelError::InputWidth {
                expected: self.feature_names.len(),
                actual: rows.ncols(),
            });
        }
        let mut out = Array1::zeros(rows.nrows());
        Zip::from(&mut out)
            .and(rows.rows())
            .par_for_each(|value, row| *value = self.predict_row(row));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    const MODEL: &str = "tree
version=v4
num_class=1
num_tree_per_iteration=1
label_index=0
max_feature_idx=1
objective=regression
feature_names=price sales_lag_28
feature_infos=[0:10] [0:100]
tree_sizes=300 200

Tree=0
num_leaves=2
num_cat=0
split_feature=1
split_gain=10
threshold=5
decision_type=2
left_child=-1
right_child=-2
leaf_value=1 3
leaf_weight=5 5
leaf_count=5 5
internal_value=0
internal_weight=0
internal_count=10
is_linear=0
shrinkage=1


Tree=1
num_leaves=1
num_cat=0
split_feature=
split_gain=
threshold=
decision_type=
left_child=
right_child=
leaf_value=0.5
leaf_weight=
leaf_count=
internal_value=
internal_weight=
internal_count=
is_linear=0
shrinkage=0.1


end of trees

feature_importances:
sales_lag_28=1

parameters:
[boosting: gbdt]
end of parameters
";

    #[test]
    fn test_parse_header_and_trees() {
        let model = LightGbmModel::from_model_text(MODEL).unwrap();
        assert_eq!(model.feature_names(), ["price", "sales_lag_28"]);
        assert_eq!(model.num_trees(), 2);
        assert_eq!(model.objective(), Objective::Regression);

        let summary = model.summary();
        assert_eq!(summary.leaves, 3);
        assert_eq!(summary.categorical_trees, 0);
        assert!(summary.to_string().contains("regression"));
    }

    #[test]
    fn test_predict_sums_leaves_without_rescaling() {
        let model = LightGbmModel::from_model_text(MODEL).unwrap();
        let rows = array![[0.0, 1.0], [0.0, 9.0]];
        let out = model.predict(rows.view()).unwrap();
        assert_relative_eq!(out[0], 1.5);
        assert_relative_eq!(out[1], 3.5);
    }

    #[test]
    fn test_log_link_and_average_output() {
        let text = MODEL
            .replace("objective=regression", "objective=tweedie tweedie_variance_power:1.1")
            .replace("tree_sizes=300 200", "tree_sizes=300 200\naverage_output");
        let model = LightGbmModel::from_model_text(&text).unwrap();
        let out = model.predict(array![[0.0, 1.0]].view()).unwrap();
        assert_relative_eq!(out[0], (1.5f64 / 2.0).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_wrong_width_is_rejected() {
        let model = LightGbmModel::from_model_text(MODEL).unwrap();
        let err = model.predict(array![[1.0, 2.0, 3.0]].view()).unwrap_err();
        assert!(matches!(err, ModelError::InputWidth { expected: 2, actual: 3 }));
    }

    #[rstest]
    #[case("num_tree_per_iteration=1", "num_tree_per_iteration=3")]
    #[case("objective=regression", "objective=multiclass num_class:3")]
    #[case("max_feature_idx=1", "max_feature_idx=4")]
    #[case("feature_names=price sales_lag_28", "feature_names=price")]
    fn test_invalid_headers(#[case] from: &str, #[case] to: &str) {
        assert!(LightGbmModel::from_model_text(&MODEL.replace(from, to)).is_err());
    }

    #[rstest]
    #[case("regression_l1", Objective::Regression)]
    #[case("huber", Objective::Huber)]
    #[case("poisson", Objective::Poisson)]
    #[case("gamma", Objective::Gamma)]
    fn test_objective_names(#[case] name: &str, #[case] expected: Objective) {
        assert_eq!(Objective::from_name(name).unwrap(), expected);
    }

    #[test]
    fn test_model_without_trees_is_rejected() {
        let header = MODEL.split("Tree=0").next().unwrap();
        let err = LightGbmModel::from_model_text(header).unwrap_err();
        assert!(matches!(err, ModelError::Format(msg) if msg.contains("no trees")));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.txt");
        std::fs::write(&path, MODEL).unwrap();
        let model = LightGbmModel::from_file(&path).unwrap();
        assert_eq!(model.num_trees(), 2);

        let missing = LightGbmModel::from_file(dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(missing, ModelError::Io(_)));
    }
}
