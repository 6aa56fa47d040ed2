use clap::Args;
use std::path::PathBuf;
use wlb::batch::{self, BatchOptions, BatchSummary, DEFAULT_DROP_TARGET, DEFAULT_OUTPUT};
use wlb::error::AppError;
use wlb::model::{load_predictor, ModelArtifact};
use wlb::scoring::{ScoreMode, ScoreWeights};
use wlb::table::Table;
use wlb::training::{
    self, EvaluationReport, ForestParams, TrainingOptions, TrainingOutcome, TrainingTarget,
    DEFAULT_TARGET,
};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Model artifact (JSON)
    #[arg(long)]
    pub(crate) model: PathBuf,
    /// Input CSV of survey records
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Output CSV path
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    pub(crate) out: PathBuf,
    /// Column dropped before prediction when present; pass "" to keep all columns
    #[arg(long = "drop-target", default_value = DEFAULT_DROP_TARGET)]
    pub(crate) drop_target: String,
    /// Blend model output with stress, productivity, and meeting signals
    #[arg(long)]
    pub(crate) composite: bool,
    #[arg(long = "w_model", default_value_t = 0.5)]
    pub(crate) w_model: f64,
    #[arg(long = "w_features", default_value_t = 0.5)]
    pub(crate) w_features: f64,
    /// Fraction of w_features given to stress
    #[arg(long = "w_stress", default_value_t = 0.25)]
    pub(crate) w_stress: f64,
    /// Fraction of w_features given to productivity
    #[arg(long = "w_prod", default_value_t = 0.5)]
    pub(crate) w_prod: f64,
    /// Fraction of w_features given to meetings per hour
    #[arg(long = "w_meet", default_value_t = 0.25)]
    pub(crate) w_meet: f64,
}

impl ScoreArgs {
    fn into_options(self) -> BatchOptions {
        BatchOptions {
            model: self.model,
            input: self.input,
            out: self.out,
            drop_target: Some(self.drop_target).filter(|target| !target.is_empty()),
            mode: if self.composite {
                ScoreMode::Composite
            } else {
                ScoreMode::Probability
            },
            weights: ScoreWeights {
                w_model: self.w_model,
                w_features: self.w_features,
                w_stress: self.w_stress,
                w_prod: self.w_prod,
                w_meet: self.w_meet,
            },
        }
    }
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let summary = batch::run(&args.into_options())?;
    println!("{}", render_batch_summary(&summary));
    Ok(())
}

fn render_batch_summary(summary: &BatchSummary) -> String {
    let mut lines = vec![format!(
        "Scored {} rows ({}) -> {}",
        summary.rows,
        summary.method.label(),
        summary.out.display()
    )];
    for (tier, count) in &summary.tiers {
        lines.push(format!("  {tier:<12} {count}"));
    }
    lines.join("\n")
}

#[derive(Args, Debug)]
pub(crate) struct TrainArgs {
    /// Labeled training CSV
    #[arg(long)]
    pub(crate) data: PathBuf,
    /// Label column to learn
    #[arg(long, default_value = DEFAULT_TARGET, conflicts_with = "wellbeing")]
    pub(crate) target: String,
    /// Learn the Bad/Average/Good class derived from WORK_LIFE_BALANCE_SCORE
    #[arg(long)]
    pub(crate) wellbeing: bool,
    /// Where to write the model artifact
    #[arg(long, default_value = "backend/model.json")]
    pub(crate) out: PathBuf,
    #[arg(long, default_value_t = 200)]
    pub(crate) trees: usize,
    /// Maximum tree depth; 0 grows trees until leaves are pure
    #[arg(long = "max-depth", default_value_t = 25)]
    pub(crate) max_depth: usize,
    #[arg(long = "test-size", default_value_t = 0.2)]
    pub(crate) test_size: f64,
    #[arg(long, default_value_t = 42)]
    pub(crate) seed: u64,
}

impl TrainArgs {
    fn options(&self) -> TrainingOptions {
        TrainingOptions {
            target: if self.wellbeing {
                TrainingTarget::Wellbeing
            } else {
                TrainingTarget::Column(self.target.clone())
            },
            test_size: self.test_size,
            seed: self.seed,
            forest: ForestParams {
                n_trees: self.trees,
                max_depth: (self.max_depth > 0).then_some(self.max_depth),
                seed: self.seed,
                ..ForestParams::default()
            },
            ..TrainingOptions::default()
        }
    }
}

pub(crate) fn run_train(args: TrainArgs) -> Result<(), AppError> {
    let table = Table::from_path(&args.data)?;
    let outcome = training::train(&table, &args.options())?;
    outcome.artifact.to_path(&args.out)?;
    println!("{}", render_training(&outcome, &args.out));
    Ok(())
}

fn render_training(outcome: &TrainingOutcome, out: &std::path::Path) -> String {
    let artifact: &ModelArtifact = &outcome.artifact;
    let mut lines = vec![
        format!(
            "Trained {} on target '{}' at {}",
            artifact.model.kind(),
            artifact.target.as_deref().unwrap_or("-"),
            artifact.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        format!(
            "  rows: {} train / {} test, classes: {}",
            outcome.train_rows,
            outcome.test_rows,
            artifact
                .classes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    ];
    if let Some(report) = &artifact.evaluation {
        lines.push(format!("  held-out: {report}"));
    }
    lines.push(format!("  artifact: {}", out.display()));
    lines.join("\n")
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    #[arg(long)]
    pub(crate) model: PathBuf,
    /// Labeled CSV to score
    #[arg(long)]
    pub(crate) data: PathBuf,
    #[arg(long, default_value = DEFAULT_TARGET)]
    pub(crate) target: String,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let predictor = load_predictor(&args.model)?;
    let table = Table::from_path(&args.data)?;
    let report = training::evaluate_labeled(predictor.as_ref(), &table, &args.target)?;
    println!("{}", render_evaluation(&report));
    Ok(())
}

fn render_evaluation(report: &EvaluationReport) -> String {
    format!("Evaluation ({:?} averaging)\n  {report}", report.averaging)
}
