use super::pipeline::Ensemble;
use super::tree::DecisionTree;
use super::ModelError;
use serde::{Deserialize, Serialize};

/// Output transform applied to the boosted margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostObjective {
    /// Sigmoid of the margin is the positive-class probability.
    BinaryLogistic,
    /// Sign of the margin decides the class; no probabilities.
    BinaryHinge,
}

/// Binary gradient-boosted regression trees. Leaves hold one additive value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosted {
    pub n_features: usize,
    pub objective: BoostObjective,
    #[serde(default)]
    pub base_margin: f64,
    pub trees: Vec<DecisionTree>,
}

impl GradientBoosted {
    pub(crate) fn validate(&self, n_classes: usize) -> Result<(), String> {
        if n_classes != 2 {
            return Err(format!(
                "gradient boosted model is binary but lists {n_classes} classes"
            ));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, 1)
                .map_err(|reason| format!("tree {index}: {reason}"))?;
        }
        Ok(())
    }

    fn margin(&self, row: &[f64]) -> f64 {
        self.base_margin
            + self
                .trees
                .iter()
                .map(|tree| tree.leaf(row)[0])
                .sum::<f64>()
    }
}

impl Ensemble for GradientBoosted {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn probabilities(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        match self.objective {
            BoostObjective::BinaryLogistic => {
                let positive = sigmoid(self.margin(row));
                Ok(vec![1.0 - positive, positive])
            }
            BoostObjective::BinaryHinge => Err(ModelError::ProbabilityUnsupported),
        }
    }

    fn predict_index(&self, row: &[f64]) -> Result<usize, ModelError> {
        let margin = self.margin(row);
        let positive = match self.objective {
            BoostObjective::BinaryLogistic => sigmoid(margin) > 0.5,
            BoostObjective::BinaryHinge => margin > 0.0,
        };
        Ok(usize::from(positive))
    }
}

fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}
