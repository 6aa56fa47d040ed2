//! Trained predictors and the artifacts they are loaded from.
//!
//! A [`Predictor`] always answers `predict`; probability output and the list of
//! expected input columns are optional capabilities. The concrete ensemble is
//! chosen when an artifact is loaded (see [`artifact::load_predictor`]).

pub mod artifact;
mod boosted;
mod forest;
mod pipeline;
pub mod preprocess;
mod tree;

pub use artifact::{load_predictor, ArtifactError, EnsembleSpec, ModelArtifact, FORMAT_VERSION};
pub use boosted::{BoostObjective, GradientBoosted};
pub use forest::RandomForest;
pub use preprocess::{ColumnTransform, Encoding, Preprocessor};
pub use tree::{DecisionTree, TreeNode};

use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// A predicted class. Integer codes are the norm; text is kept as-is when a
/// label cannot be read as an integer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassCode {
    Int(i64),
    Text(String),
}

impl ClassCode {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(code) => Some(*code),
            Self::Text(_) => None,
        }
    }

    /// Integer coercion; leaves the original representation on failure.
    pub fn coerced(self) -> Self {
        match self {
            Self::Text(text) => match text.trim().parse::<i64>() {
                Ok(code) => Self::Int(code),
                Err(_) => Self::Text(text),
            },
            int => int,
        }
    }
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(code) => write!(f, "{code}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Per-record predictor output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub class: ClassCode,
    /// Probability of the positive (second) class, in `[0, 1]`.
    pub probability: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model does not provide class probabilities")]
    ProbabilityUnsupported,
    #[error("expected {expected} features, found {found}")]
    FeatureCount { expected: usize, found: usize },
    #[error("row {row}: feature '{column}' is missing")]
    MissingFeature { row: usize, column: String },
    #[error("row {row}: feature '{column}' is not numeric")]
    NonNumericFeature { row: usize, column: String },
    #[error("model returned {found} predictions for {expected} rows")]
    PredictionCount { expected: usize, found: usize },
}

pub trait Predictor: Send + Sync {
    fn predict(&self, table: &Table) -> Result<Vec<ClassCode>, ModelError>;

    /// One probability row per record, ordered like [`Predictor::classes`].
    fn predict_proba(&self, _table: &Table) -> Result<Vec<Vec<f64>>, ModelError> {
        Err(ModelError::ProbabilityUnsupported)
    }

    /// Input columns the model was trained on, when recorded.
    fn expected_columns(&self) -> Option<&[String]> {
        None
    }

    fn classes(&self) -> &[ClassCode];
}

/// Runs `predict`, then fetches positive-class probabilities best-effort.
///
/// A probability failure is logged and degrades to `None` for every record.
/// A `predict` failure, or one class per row not being returned, is an error.
pub fn predict_records(
    predictor: &dyn Predictor,
    table: &Table,
) -> Result<Vec<PredictionResult>, ModelError> {
    let classes = predictor.predict(table)?;
    if classes.len() != table.len() {
        return Err(ModelError::PredictionCount {
            expected: table.len(),
            found: classes.len(),
        });
    }
    let probabilities = positive_probabilities(predictor, table);

    Ok(classes
        .into_iter()
        .enumerate()
        .map(|(index, class)| PredictionResult {
            class: class.coerced(),
            probability: probabilities
                .as_ref()
                .and_then(|values| values.get(index).copied()),
        })
        .collect())
}

fn positive_probabilities(predictor: &dyn Predictor, table: &Table) -> Option<Vec<f64>> {
    let rows = match predictor.predict_proba(table) {
        Ok(rows) => rows,
        Err(err) => {
            warn!(error = %err, "probabilities unavailable, falling back to class labels");
            return None;
        }
    };

    if rows.len() != table.len() {
        warn!(
            expected = table.len(),
            found = rows.len(),
            "probability row count mismatch"
        );
        return None;
    }

    let positive: Option<Vec<f64>> = rows
        .iter()
        .map(|row| row.get(1).copied().filter(|p| (0.0..=1.0).contains(p)))
        .collect();
    if positive.is_none() {
        warn!("probability rows lack a valid positive-class column");
    }
    positive
}
