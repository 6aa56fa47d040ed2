//! Work-life-balance scoring core: schema alignment, signal normalization,
//! score composition, and risk bucketing.

pub mod align;
mod bucket;
mod compose;
pub mod labels;
pub mod meetings;
pub mod normalize;

pub use align::{align, align_table};
pub use bucket::RiskTier;
pub use compose::{compose, ComponentBreakdown, Composition};
pub use labels::{attrition_label, WellbeingClass};

use serde::{Deserialize, Serialize};

/// Column names read by the composite score.
pub const STRESS_COLUMN: &str = "stress_score";
pub const PRODUCTIVITY_COLUMN: &str = "productivity_score";

/// Blend weights for composite scoring.
///
/// `w_stress`, `w_prod`, and `w_meet` are fractions of `w_features`, not
/// absolute weights. Nothing checks that the weights sum to one, so a
/// misconfigured set yields scores outside 0..=100; callers own that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub w_model: f64,
    pub w_features: f64,
    pub w_stress: f64,
    pub w_prod: f64,
    pub w_meet: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            w_model: 0.5,
            w_features: 0.5,
            w_stress: 0.25,
            w_prod: 0.5,
            w_meet: 0.25,
        }
    }
}

impl ScoreWeights {
    pub fn stress(&self) -> f64 {
        self.w_features * self.w_stress
    }

    pub fn productivity(&self) -> f64 {
        self.w_features * self.w_prod
    }

    pub fn meetings(&self) -> f64 {
        self.w_features * self.w_meet
    }
}

/// Which formula produces `wlb_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    #[default]
    Probability,
    Composite,
}

/// Method tag written alongside each score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WlbMethod {
    Probability,
    Composite,
    CoarsePrediction,
}

impl WlbMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Probability => "probability",
            Self::Composite => "composite",
            Self::CoarsePrediction => "coarse_prediction",
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}
