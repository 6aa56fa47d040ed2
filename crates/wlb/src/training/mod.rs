//! Fitting a random forest artifact from labeled survey data.
//!
//! [`train`] runs the whole pipeline: target preparation, a stratified split,
//! preprocessing fitted on the training rows only, forest fitting, and a
//! held-out evaluation that is stored in the artifact.

mod data;
mod fit;
mod metrics;
mod wellbeing;

pub use data::{prepare_data, train_test_split, Split};
pub use fit::{fit_forest, ForestParams};
pub use metrics::{evaluate, roc_auc, Averaging, EvaluationReport};
pub use wellbeing::{with_wellbeing_target, SURVEY_SCORE_COLUMN, WELLBEING_TARGET};

use crate::model::{
    predict_records, ClassCode, EnsembleSpec, ModelArtifact, ModelError, Predictor, Preprocessor,
    FORMAT_VERSION,
};
use crate::scoring::align_table;
use crate::table::Table;
use chrono::Utc;
use std::collections::BTreeSet;
use tracing::info;

pub const DEFAULT_TARGET: &str = "Attrition";

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("target column '{0}' not found")]
    MissingTarget(String),
    #[error("row {row}: target label is blank")]
    MissingLabel { row: usize },
    #[error("row {row}: survey score is not numeric")]
    InvalidScore { row: usize },
    #[error("test size must be strictly between 0 and 1, got {0}")]
    InvalidTestSize(f64),
    #[error("training data holds a single class; at least two are required")]
    SingleClass,
    #[error("training data has no rows")]
    EmptyTrainingSet,
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Which column the classifier learns.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingTarget {
    Column(String),
    /// Three-way class derived from `WORK_LIFE_BALANCE_SCORE`.
    Wellbeing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    pub target: TrainingTarget,
    pub test_size: f64,
    pub seed: u64,
    /// Columns removed before fitting when present.
    pub drop_columns: Vec<String>,
    pub forest: ForestParams,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            target: TrainingTarget::Column(DEFAULT_TARGET.to_string()),
            test_size: 0.2,
            seed: 42,
            drop_columns: vec!["Timestamp".to_string()],
            forest: ForestParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub train_rows: usize,
    pub test_rows: usize,
}

pub fn train(table: &Table, options: &TrainingOptions) -> Result<TrainingOutcome, TrainingError> {
    let (mut labeled, target) = match &options.target {
        TrainingTarget::Column(column) => (table.clone(), column.clone()),
        TrainingTarget::Wellbeing => (
            with_wellbeing_target(table)?,
            WELLBEING_TARGET.to_string(),
        ),
    };
    for column in options.drop_columns.iter().filter(|column| **column != target) {
        labeled.drop_column(column);
    }

    let (features, labels) = prepare_data(&labeled, &target)?;
    if features.is_empty() {
        return Err(TrainingError::EmptyTrainingSet);
    }
    let classes: Vec<ClassCode> = labels.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
    if classes.len() < 2 {
        return Err(TrainingError::SingleClass);
    }

    let split = train_test_split(&labels, options.test_size, options.seed)?;
    let train_features = features.select(&split.train);
    info!(
        label_column = %target,
        train_rows = split.train.len(),
        test_rows = split.test.len(),
        classes = classes.len(),
        "fitting random forest"
    );

    let preprocessor = Preprocessor::fit(&train_features);
    let rows: Vec<Vec<f64>> = train_features
        .records()
        .iter()
        .map(|record| preprocessor.transform(record))
        .collect();
    let targets: Vec<usize> = split
        .train
        .iter()
        .map(|&index| class_index(&classes, &labels[index]))
        .collect();
    let forest = fit_forest(&rows, &targets, classes.len(), &options.forest);

    let mut artifact = ModelArtifact {
        format_version: FORMAT_VERSION,
        created_at: Utc::now(),
        target: Some(target),
        feature_columns: Some(features.columns().to_vec()),
        preprocessor: Some(preprocessor),
        classes,
        model: EnsembleSpec::RandomForest(forest),
        evaluation: None,
    };

    if !split.test.is_empty() {
        let predictor = artifact.clone().into_predictor();
        let actual: Vec<ClassCode> = split.test.iter().map(|&index| labels[index].clone()).collect();
        let report = evaluate_predictor(predictor.as_ref(), &features.select(&split.test), &actual)?;
        info!(%report, "held-out evaluation");
        artifact.evaluation = Some(report);
    }

    Ok(TrainingOutcome {
        artifact,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
    })
}

fn class_index(classes: &[ClassCode], label: &ClassCode) -> usize {
    // `classes` is built from the labels, so the search always hits.
    classes.binary_search(label).unwrap_or_else(|insert_at| insert_at)
}

/// Scores `predictor` on feature rows with known labels.
pub fn evaluate_predictor(
    predictor: &dyn Predictor,
    features: &Table,
    actual: &[ClassCode],
) -> Result<EvaluationReport, TrainingError> {
    let results = predict_records(predictor, features)?;
    let predicted: Vec<ClassCode> = results.iter().map(|result| result.class.clone()).collect();
    let positive_scores: Option<Vec<f64>> = if predictor.classes().len() == 2 {
        results.iter().map(|result| result.probability).collect()
    } else {
        None
    };

    Ok(evaluate(
        predictor.classes(),
        actual,
        &predicted,
        positive_scores.as_deref(),
    ))
}

/// Evaluates a loaded predictor on a labeled table, aligning it to the
/// predictor's schema first.
pub fn evaluate_labeled(
    predictor: &dyn Predictor,
    table: &Table,
    target: &str,
) -> Result<EvaluationReport, TrainingError> {
    let (features, actual) = prepare_data(table, target)?;
    let aligned = align_table(&features, predictor.expected_columns());
    evaluate_predictor(predictor, &aligned, &actual)
}
