//! Held-out evaluation of a fitted classifier.

use crate::model::ClassCode;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Averaging {
    /// Scores for the positive (second) class only.
    Binary,
    /// Unweighted mean of per-class scores.
    Macro,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub samples: usize,
    pub averaging: Averaging,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Only reported for binary problems with probabilities and both classes present.
    #[serde(default)]
    pub roc_auc: Option<f64>,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "samples={} accuracy={:.4} precision={:.4} recall={:.4} f1={:.4}",
            self.samples, self.accuracy, self.precision, self.recall, self.f1
        )?;
        if let Some(auc) = self.roc_auc {
            write!(f, " roc_auc={auc:.4}")?;
        }
        Ok(())
    }
}

/// Scores `predicted` against `actual`.
///
/// `classes` is the model's sorted class list; with exactly two classes the
/// second one is treated as positive. `positive_scores`, when given, feeds
/// ROC-AUC.
pub fn evaluate(
    classes: &[ClassCode],
    actual: &[ClassCode],
    predicted: &[ClassCode],
    positive_scores: Option<&[f64]>,
) -> EvaluationReport {
    let samples = actual.len().min(predicted.len());
    let correct = actual
        .iter()
        .zip(predicted)
        .filter(|(truth, guess)| truth == guess)
        .count();
    let accuracy = ratio(correct, samples);

    if classes.len() == 2 {
        let positive = &classes[1];
        let counts = Counts::for_class(positive, actual, predicted);
        let roc_auc = positive_scores.and_then(|scores| {
            let labels: Vec<bool> = actual.iter().map(|label| label == positive).collect();
            roc_auc(scores, &labels)
        });
        return EvaluationReport {
            samples,
            averaging: Averaging::Binary,
            accuracy,
            precision: counts.precision(),
            recall: counts.recall(),
            f1: counts.f1(),
            roc_auc,
        };
    }

    let per_class: Vec<Counts> = classes
        .iter()
        .map(|class| Counts::for_class(class, actual, predicted))
        .collect();
    let mean = |score: fn(&Counts) -> f64| {
        if per_class.is_empty() {
            0.0
        } else {
            per_class.iter().map(score).sum::<f64>() / per_class.len() as f64
        }
    };

    EvaluationReport {
        samples,
        averaging: Averaging::Macro,
        accuracy,
        precision: mean(Counts::precision),
        recall: mean(Counts::recall),
        f1: mean(Counts::f1),
        roc_auc: None,
    }
}

#[derive(Debug, Default)]
struct Counts {
    true_positive: usize,
    false_positive: usize,
    false_negative: usize,
}

impl Counts {
    fn for_class(class: &ClassCode, actual: &[ClassCode], predicted: &[ClassCode]) -> Self {
        let mut counts = Self::default();
        for (truth, guess) in actual.iter().zip(predicted) {
            match (truth == class, guess == class) {
                (true, true) => counts.true_positive += 1,
                (false, true) => counts.false_positive += 1,
                (true, false) => counts.false_negative += 1,
                (false, false) => {}
            }
        }
        counts
    }

    fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    fn f1(&self) -> f64 {
        let (precision, recall) = (self.precision(), self.recall());
        if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Area under the ROC curve as the Mann-Whitney statistic; ties count half.
///
/// Undefined (`None`) unless both labels occur.
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> Option<f64> {
    let positives: Vec<f64> = scores
        .iter()
        .zip(labels)
        .filter_map(|(score, label)| label.then_some(*score))
        .collect();
    let negatives: Vec<f64> = scores
        .iter()
        .zip(labels)
        .filter_map(|(score, label)| (!label).then_some(*score))
        .collect();
    if positives.is_empty() || negatives.is_empty() {
        return None;
    }

    let mut wins = 0.0;
    for positive in &positives {
        for negative in &negatives {
            if positive > negative {
                wins += 1.0;
            } else if positive == negative {
                wins += 0.5;
            }
        }
    }
    Some(wins / (positives.len() * negatives.len()) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(values: &[i64]) -> Vec<ClassCode> {
        values.iter().copied().map(ClassCode::Int).collect()
    }

    #[test]
    fn binary_scores_use_the_second_class() {
        let classes = codes(&[0, 1]);
        let actual = codes(&[1, 1, 0, 0]);
        let predicted = codes(&[1, 0, 1, 0]);
        let report = evaluate(&classes, &actual, &predicted, Some(&[0.9, 0.4, 0.6, 0.1]));

        assert_eq!(report.averaging, Averaging::Binary);
        assert_eq!(report.samples, 4);
        assert_eq!(report.accuracy, 0.5);
        assert_eq!(report.precision, 0.5);
        assert_eq!(report.recall, 0.5);
        assert_eq!(report.f1, 0.5);
        assert_eq!(report.roc_auc, Some(0.75));
    }

    #[test]
    fn three_classes_are_macro_averaged() {
        let classes = codes(&[0, 1, 2]);
        let actual = codes(&[0, 1, 2]);
        let predicted = codes(&[0, 1, 1]);
        let report = evaluate(&classes, &actual, &predicted, None);

        assert_eq!(report.averaging, Averaging::Macro);
        assert!((report.precision - 0.5).abs() < 1e-12);
        assert!((report.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.roc_auc, None);
    }

    #[test]
    fn auc_counts_ties_half_and_needs_both_labels() {
        assert_eq!(roc_auc(&[0.5, 0.5], &[true, false]), Some(0.5));
        assert_eq!(roc_auc(&[0.2, 0.9], &[true, true]), None);
    }

    #[test]
    fn report_display_lists_scores() {
        let report = evaluate(&codes(&[0, 1]), &codes(&[0, 1]), &codes(&[0, 1]), None);
        assert_eq!(
            report.to_string(),
            "samples=2 accuracy=1.0000 precision=1.0000 recall=1.0000 f1=1.0000"
        );
    }
}
