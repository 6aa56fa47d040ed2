use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal risk tier derived from a WLB score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "High Risk")]
    HighRisk,
    #[serde(rename = "Medium Risk")]
    MediumRisk,
    #[serde(rename = "Low Risk")]
    LowRisk,
    Healthy,
    Unknown,
}

impl RiskTier {
    /// Every tier, worst first.
    pub const ALL: [Self; 5] = [
        Self::HighRisk,
        Self::MediumRisk,
        Self::LowRisk,
        Self::Healthy,
        Self::Unknown,
    ];

    /// Thresholds are lower-inclusive: exactly 30 is Medium, exactly 70 is Healthy.
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            None => Self::Unknown,
            Some(score) if score.is_nan() => Self::Unknown,
            Some(score) if score < 30.0 => Self::HighRisk,
            Some(score) if score < 50.0 => Self::MediumRisk,
            Some(score) if score < 70.0 => Self::LowRisk,
            Some(_) => Self::Healthy,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HighRisk => "High Risk",
            Self::MediumRisk => "Medium Risk",
            Self::LowRisk => "Low Risk",
            Self::Healthy => "Healthy",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_move_up_at_the_threshold() {
        let cases = [
            (29.999, RiskTier::HighRisk),
            (30.0, RiskTier::MediumRisk),
            (49.999, RiskTier::MediumRisk),
            (50.0, RiskTier::LowRisk),
            (69.999, RiskTier::LowRisk),
            (70.0, RiskTier::Healthy),
        ];
        for (score, expected) in cases {
            assert_eq!(RiskTier::from_score(Some(score)), expected, "score {score}");
        }
    }

    #[test]
    fn out_of_range_scores_still_bucket() {
        assert_eq!(RiskTier::from_score(Some(-12.0)), RiskTier::HighRisk);
        assert_eq!(RiskTier::from_score(Some(140.0)), RiskTier::Healthy);
    }

    #[test]
    fn missing_or_nan_is_unknown() {
        assert_eq!(RiskTier::from_score(None), RiskTier::Unknown);
        assert_eq!(RiskTier::from_score(Some(f64::NAN)), RiskTier::Unknown);
        assert_eq!(RiskTier::Unknown.label(), "Unknown");
    }
}
