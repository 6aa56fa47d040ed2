use crate::model::ClassCode;
use serde::{Deserialize, Serialize};

/// Human-readable attrition label. Codes outside the 0/1 pair are stringified.
pub fn attrition_label(code: &ClassCode) -> String {
    match code.as_int() {
        Some(0) => "Stayed".to_string(),
        Some(1) => "Left".to_string(),
        _ => code.to_string(),
    }
}

/// Three-way classification produced by the wellbeing survey model.
///
/// Distinct from the binary attrition labels; the two come from different
/// trained models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WellbeingClass {
    Bad,
    Average,
    Good,
}

impl WellbeingClass {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Bad),
            1 => Some(Self::Average),
            2 => Some(Self::Good),
            _ => None,
        }
    }

    /// Buckets a raw `WORK_LIFE_BALANCE_SCORE` into a training class.
    pub fn from_survey_score(score: f64) -> Self {
        if score < 600.0 {
            Self::Bad
        } else if score < 700.0 {
            Self::Average
        } else {
            Self::Good
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            Self::Bad => 0,
            Self::Average => 1,
            Self::Good => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Bad => "Bad",
            Self::Average => "Average",
            Self::Good => "Good",
        }
    }
}
