use super::meetings::meetings_per_hour;
use super::normalize::min_max;
use super::{round_to, ScoreMode, ScoreWeights, WlbMethod, PRODUCTIVITY_COLUMN, STRESS_COLUMN};
use crate::model::PredictionResult;
use crate::table::Table;
use serde::Serialize;

const COARSE_FAVORABLE: f64 = 0.75;
const COARSE_UNFAVORABLE: f64 = 0.25;

/// Per-record terms of a composite score, each nominally in `[0, 1]` before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentBreakdown {
    pub model: f64,
    pub stress: f64,
    pub productivity: f64,
    pub meetings: f64,
}

impl ComponentBreakdown {
    fn weighted(&self, weights: &ScoreWeights) -> f64 {
        weights.w_model * self.model
            + weights.stress() * self.stress
            + weights.productivity() * self.productivity
            + weights.meetings() * self.meetings
    }
}

/// Scores for a batch plus the method tag shared by the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Composition {
    pub scores: Vec<Option<f64>>,
    pub method: WlbMethod,
    /// Present in composite mode only.
    pub components: Option<Vec<ComponentBreakdown>>,
}

/// Computes the 0-100 WLB score for every prediction.
///
/// If any record lacks a probability the whole batch falls back to the coarse
/// class-based estimate; the method tag is batch-level, not per record.
/// Scores are not clamped.
pub fn compose(
    predictions: &[PredictionResult],
    features: Option<&Table>,
    weights: &ScoreWeights,
    mode: ScoreMode,
) -> Composition {
    let probabilities: Option<Vec<f64>> = predictions.iter().map(|p| p.probability).collect();

    match mode {
        ScoreMode::Probability => probability_scores(predictions, probabilities),
        ScoreMode::Composite => composite_scores(predictions, probabilities, features, weights),
    }
}

fn probability_scores(
    predictions: &[PredictionResult],
    probabilities: Option<Vec<f64>>,
) -> Composition {
    match probabilities {
        Some(probabilities) => Composition {
            scores: probabilities
                .into_iter()
                .map(|p| Some(round_to((1.0 - p) * 100.0, 3)))
                .collect(),
            method: WlbMethod::Probability,
            components: None,
        },
        None => Composition {
            scores: predictions
                .iter()
                .map(|prediction| match prediction.class.as_int() {
                    Some(0) => Some(75.0),
                    Some(1) => Some(25.0),
                    _ => None,
                })
                .collect(),
            method: WlbMethod::CoarsePrediction,
            components: None,
        },
    }
}

fn composite_scores(
    predictions: &[PredictionResult],
    probabilities: Option<Vec<f64>>,
    features: Option<&Table>,
    weights: &ScoreWeights,
) -> Composition {
    let model: Vec<f64> = match probabilities {
        Some(probabilities) => probabilities.into_iter().map(|p| 1.0 - p).collect(),
        None => predictions
            .iter()
            .map(|prediction| {
                if prediction.class.as_int() == Some(0) {
                    COARSE_FAVORABLE
                } else {
                    COARSE_UNFAVORABLE
                }
            })
            .collect(),
    };

    let count = predictions.len();
    let (stress, productivity, meetings) = match features {
        Some(table) => (
            signal_component(table.numeric_column(STRESS_COLUMN), count, |n| 1.0 - n),
            signal_component(table.numeric_column(PRODUCTIVITY_COLUMN), count, |n| n),
            signal_component(Some(meetings_per_hour(table)), count, |n| 1.0 - n),
        ),
        None => (vec![0.0; count], vec![0.0; count], vec![0.0; count]),
    };

    let components: Vec<ComponentBreakdown> = (0..count)
        .map(|index| ComponentBreakdown {
            model: model[index],
            stress: stress[index],
            productivity: productivity[index],
            meetings: meetings[index],
        })
        .collect();

    Composition {
        scores: components
            .iter()
            .map(|breakdown| Some(round_to(breakdown.weighted(weights) * 100.0, 3)))
            .collect(),
        method: WlbMethod::Composite,
        components: Some(components),
    }
}

/// Normalizes one raw signal and orients it so that higher is healthier.
///
/// An absent column, or a record whose own value is missing, contributes zero.
fn signal_component(
    raw: Option<Vec<Option<f64>>>,
    count: usize,
    orient: impl Fn(f64) -> f64,
) -> Vec<f64> {
    let Some(raw) = raw else {
        return vec![0.0; count];
    };
    let normalized = min_max(&raw);

    let mut out: Vec<f64> = raw
        .iter()
        .zip(normalized)
        .map(|(raw, normalized)| match (raw, normalized) {
            (Some(_), Some(value)) => orient(value),
            _ => 0.0,
        })
        .collect();
    out.resize(count, 0.0);
    out
}
