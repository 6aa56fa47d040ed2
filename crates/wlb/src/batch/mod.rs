//! CSV batch scoring: predict every record of an input file and append the
//! WLB score columns.

use crate::model::{load_predictor, predict_records, ArtifactError, ModelError, Predictor};
use crate::scoring::{
    align_table, attrition_label, compose, round_to, RiskTier, ScoreMode, ScoreWeights, WlbMethod,
};
use crate::table::{Table, TableError, Value};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_OUTPUT: &str = "predictions_wlb.csv";
pub const DEFAULT_DROP_TARGET: &str = "Attrition";

/// Columns appended to every scored record, in output order.
pub const OUTPUT_COLUMNS: [&str; 6] = [
    "prediction",
    "probability",
    "wlb_score",
    "wlb_method",
    "predicted_label",
    "wlb_risk",
];

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub model: PathBuf,
    pub input: PathBuf,
    pub out: PathBuf,
    /// Column removed before alignment when present; `None` keeps every column.
    pub drop_target: Option<String>,
    pub mode: ScoreMode,
    pub weights: ScoreWeights,
}

impl BatchOptions {
    pub fn new(model: impl Into<PathBuf>, input: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            out: PathBuf::from(DEFAULT_OUTPUT),
            drop_target: Some(DEFAULT_DROP_TARGET.to_string()),
            mode: ScoreMode::default(),
            weights: ScoreWeights::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("model not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("prediction failed: {0}")]
    Model(#[from] ModelError),
}

/// Counts reported once the output file is written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    pub method: WlbMethod,
    pub out: PathBuf,
    pub tiers: Vec<(RiskTier, usize)>,
}

/// Scores `options.input` with the artifact at `options.model` and writes
/// `options.out`. Missing files fail before anything is read.
pub fn run(options: &BatchOptions) -> Result<BatchSummary, BatchError> {
    if !options.model.exists() {
        return Err(BatchError::ModelNotFound(options.model.clone()));
    }
    if !options.input.exists() {
        return Err(BatchError::InputNotFound(options.input.clone()));
    }

    info!(path = %options.model.display(), "loading model");
    let predictor = load_predictor(&options.model)?;

    info!(path = %options.input.display(), "reading input");
    let table = Table::from_path(&options.input)?;

    let scored = score_table(predictor.as_ref(), &table, options)?;

    info!(path = %options.out.display(), rows = scored.table.len(), "writing predictions");
    write_output(&scored.table, &options.out)?;

    Ok(BatchSummary {
        rows: scored.table.len(),
        method: scored.method,
        out: options.out.clone(),
        tiers: tally(&scored.tiers),
    })
}

/// Output table plus the batch-level method and per-record tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTable {
    pub table: Table,
    pub method: WlbMethod,
    pub tiers: Vec<RiskTier>,
}

/// Scores an in-memory table. The drop target is removed from the output too.
pub fn score_table(
    predictor: &dyn Predictor,
    table: &Table,
    options: &BatchOptions,
) -> Result<ScoredTable, BatchError> {
    let mut features = table.clone();
    if let Some(target) = options.drop_target.as_deref().filter(|t| !t.is_empty()) {
        if features.drop_column(target) {
            info!(column = target, "dropped target column");
        }
    }

    let expected = predictor.expected_columns();
    match expected {
        Some(columns) => info!(columns = columns.len(), "aligning input to model schema"),
        None => info!("model exposes no schema; passing input through"),
    }
    let aligned = align_table(&features, expected);

    info!(rows = aligned.len(), "predicting");
    let predictions = predict_records(predictor, &aligned)?;

    let composition = compose(&predictions, Some(&features), &options.weights, options.mode);
    let tiers: Vec<RiskTier> = composition
        .scores
        .iter()
        .map(|score| RiskTier::from_score(*score))
        .collect();

    let mut output = features;
    output.set_column(
        "prediction",
        predictions
            .iter()
            .map(|prediction| Value::Text(prediction.class.to_string())),
    );
    let probabilities: Option<Vec<f64>> = predictions.iter().map(|p| p.probability).collect();
    if let Some(probabilities) = probabilities {
        output.set_column(
            "probability",
            probabilities
                .into_iter()
                .map(|p| Value::Number(round_to(p, 6))),
        );
    }
    output.set_column("wlb_score", composition.scores.iter().copied());
    output.set_column(
        "wlb_method",
        std::iter::repeat(composition.method.label()).take(predictions.len()),
    );
    output.set_column(
        "predicted_label",
        predictions
            .iter()
            .map(|prediction| attrition_label(&prediction.class)),
    );
    output.set_column("wlb_risk", tiers.iter().map(|tier| tier.label()));

    Ok(ScoredTable {
        table: output,
        method: composition.method,
        tiers,
    })
}

fn write_output(table: &Table, out: &Path) -> Result<(), BatchError> {
    if let Some(parent) = out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(TableError::from)?;
    }
    table.to_path(out)?;
    Ok(())
}

fn tally(tiers: &[RiskTier]) -> Vec<(RiskTier, usize)> {
    RiskTier::ALL
        .iter()
        .map(|tier| (*tier, tiers.iter().filter(|t| *t == tier).count()))
        .filter(|(_, count)| *count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClassCode;

    struct Fixed {
        columns: Vec<String>,
        probabilities: Option<Vec<f64>>,
        classes: Vec<ClassCode>,
    }

    impl Predictor for Fixed {
        fn predict(&self, table: &Table) -> Result<Vec<ClassCode>, ModelError> {
            assert_eq!(table.columns(), self.columns.as_slice());
            Ok(match &self.probabilities {
                Some(probabilities) => probabilities
                    .iter()
                    .map(|p| ClassCode::Int(i64::from(*p >= 0.5)))
                    .collect(),
                None => vec![ClassCode::Int(0); table.len()],
            })
        }

        fn predict_proba(&self, _table: &Table) -> Result<Vec<Vec<f64>>, ModelError> {
            self.probabilities
                .as_ref()
                .map(|probabilities| probabilities.iter().map(|p| vec![1.0 - p, *p]).collect())
                .ok_or(ModelError::ProbabilityUnsupported)
        }

        fn expected_columns(&self) -> Option<&[String]> {
            Some(&self.columns)
        }

        fn classes(&self) -> &[ClassCode] {
            &self.classes
        }
    }

    fn input() -> Table {
        Table::from_records(vec![
            [("id", 1.0), ("stress_score", 2.0), ("Attrition", 0.0)]
                .into_iter()
                .collect(),
            [("id", 2.0), ("stress_score", 8.0), ("Attrition", 1.0)]
                .into_iter()
                .collect(),
        ])
    }

    fn predictor(probabilities: Option<Vec<f64>>) -> Fixed {
        Fixed {
            columns: vec!["stress_score".to_string(), "age".to_string()],
            probabilities,
            classes: vec![ClassCode::Int(0), ClassCode::Int(1)],
        }
    }

    #[test]
    fn probability_run_appends_every_output_column() {
        let options = BatchOptions::new("model.json", "input.csv");
        let scored = score_table(&predictor(Some(vec![0.2, 0.9])), &input(), &options)
            .expect("score");

        let mut expected: Vec<&str> = vec!["id", "stress_score"];
        expected.extend(OUTPUT_COLUMNS);
        assert_eq!(scored.table.columns(), expected.as_slice());
        assert_eq!(scored.method, WlbMethod::Probability);
        assert_eq!(
            scored.table.numeric_column("wlb_score"),
            Some(vec![Some(80.0), Some(10.0)])
        );
        assert_eq!(scored.tiers, vec![RiskTier::Healthy, RiskTier::HighRisk]);

        let labels = scored.table.column_values("predicted_label");
        assert_eq!(labels, vec![Value::from("Stayed"), Value::from("Left")]);
    }

    #[test]
    fn missing_probabilities_fall_back_to_coarse_scores() {
        let mut options = BatchOptions::new("model.json", "input.csv");
        options.drop_target = None;
        let scored = score_table(&predictor(None), &input(), &options).expect("score");

        assert!(!scored.table.has_column("probability"));
        assert!(scored.table.has_column("Attrition"));
        assert_eq!(scored.method, WlbMethod::CoarsePrediction);
        assert_eq!(
            scored.table.numeric_column("wlb_score"),
            Some(vec![Some(75.0), Some(75.0)])
        );
    }

    #[test]
    fn run_reports_missing_files_before_reading() {
        let options = BatchOptions::new("./no-such-model.json", "./no-such-input.csv");
        assert!(matches!(run(&options), Err(BatchError::ModelNotFound(_))));
    }

    #[test]
    fn tally_skips_empty_tiers() {
        let counts = tally(&[RiskTier::Healthy, RiskTier::Unknown, RiskTier::Healthy]);
        assert_eq!(counts, vec![(RiskTier::Healthy, 2), (RiskTier::Unknown, 1)]);
    }
}
