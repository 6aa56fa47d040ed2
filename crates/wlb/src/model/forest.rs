use super::pipeline::Ensemble;
use super::tree::DecisionTree;
use super::ModelError;
use serde::{Deserialize, Serialize};

/// Bagged classification trees. Each leaf stores per-class sample weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub(crate) fn validate(&self, n_classes: usize) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("random forest has no trees".to_string());
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, n_classes)
                .map_err(|reason| format!("tree {index}: {reason}"))?;
        }
        Ok(())
    }
}

impl Ensemble for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn probabilities(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        let Some(first) = self.trees.first() else {
            return Ok(Vec::new());
        };
        let width = first.leaf(row).len();
        let mut totals = vec![0.0; width];

        for tree in &self.trees {
            let leaf = tree.leaf(row);
            let mass: f64 = leaf.iter().sum();
            for (total, weight) in totals.iter_mut().zip(leaf) {
                *total += if mass > 0.0 {
                    weight / mass
                } else {
                    1.0 / width as f64
                };
            }
        }

        let trees = self.trees.len() as f64;
        Ok(totals.into_iter().map(|total| total / trees).collect())
    }

    fn predict_index(&self, row: &[f64]) -> Result<usize, ModelError> {
        let probabilities = self.probabilities(row)?;
        Ok(argmax(&probabilities))
    }
}

/// Index of the largest value; ties resolve to the lowest index.
pub(crate) fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_value), (index, value)| {
            if *value > best_value {
                (index, *value)
            } else {
                (best, best_value)
            }
        })
        .0
}
