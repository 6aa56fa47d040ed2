//! Random forest fitting: bootstrap samples, gini CART trees, and a random
//! `sqrt(n_features)` subset of candidate features at every split.

use crate::model::{DecisionTree, RandomForest, TreeNode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Reweights classes inversely to their frequency.
    pub balanced: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: Some(25),
            min_samples_split: 2,
            balanced: true,
            seed: 42,
        }
    }
}

/// Fits a forest on encoded rows with class indices `0..n_classes`.
pub fn fit_forest(
    rows: &[Vec<f64>],
    targets: &[usize],
    n_classes: usize,
    params: &ForestParams,
) -> RandomForest {
    let n_features = rows.first().map(Vec::len).unwrap_or(0);
    let class_weights = class_weights(targets, n_classes, params.balanced);
    let mut rng = StdRng::seed_from_u64(params.seed);

    let trees = (0..params.n_trees.max(1))
        .map(|_| {
            let sample: Vec<usize> = (0..rows.len()).map(|_| rng.gen_range(0..rows.len())).collect();
            let mut builder = TreeBuilder {
                rows,
                targets,
                n_classes,
                class_weights: &class_weights,
                params,
                max_features: max_features(n_features),
                rng: &mut rng,
                nodes: Vec::new(),
            };
            builder.grow(sample, 0);
            DecisionTree {
                nodes: builder.nodes,
            }
        })
        .collect();

    RandomForest { n_features, trees }
}

fn max_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).clamp(1, n_features.max(1))
}

fn class_weights(targets: &[usize], n_classes: usize, balanced: bool) -> Vec<f64> {
    if !balanced {
        return vec![1.0; n_classes];
    }
    let mut counts = vec![0usize; n_classes];
    for &target in targets {
        counts[target] += 1;
    }
    counts
        .into_iter()
        .map(|count| {
            if count == 0 {
                0.0
            } else {
                targets.len() as f64 / (n_classes as f64 * count as f64)
            }
        })
        .collect()
}

struct TreeBuilder<'a, R> {
    rows: &'a [Vec<f64>],
    targets: &'a [usize],
    n_classes: usize,
    class_weights: &'a [f64],
    params: &'a ForestParams,
    max_features: usize,
    rng: &'a mut R,
    nodes: Vec<TreeNode>,
}

struct SplitChoice {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl<R: Rng> TreeBuilder<'_, R> {
    /// Appends the subtree for `sample` in pre-order and returns its root index.
    fn grow(&mut self, sample: Vec<usize>, depth: usize) -> usize {
        let index = self.nodes.len();
        let distribution = self.distribution(&sample);

        let depth_exhausted = self.params.max_depth.is_some_and(|max| depth >= max);
        let pure = distribution.iter().filter(|weight| **weight > 0.0).count() <= 1;
        if depth_exhausted || pure || sample.len() < self.params.min_samples_split.max(2) {
            self.nodes.push(TreeNode::Leaf {
                value: distribution,
            });
            return index;
        }

        let Some(choice) = self.best_split(&sample, gini(&distribution)) else {
            self.nodes.push(TreeNode::Leaf {
                value: distribution,
            });
            return index;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&row| self.rows[row][choice.feature] <= choice.threshold);

        self.nodes.push(TreeNode::Leaf { value: Vec::new() });
        let left_index = self.grow(left, depth + 1);
        let right_index = self.grow(right, depth + 1);
        self.nodes[index] = TreeNode::Split {
            feature: choice.feature,
            threshold: choice.threshold,
            left: left_index,
            right: right_index,
        };
        index
    }

    fn distribution(&self, sample: &[usize]) -> Vec<f64> {
        let mut weights = vec![0.0; self.n_classes];
        for &row in sample {
            let class = self.targets[row];
            weights[class] += self.class_weights[class];
        }
        weights
    }

    /// Visits features in random order. At least `max_features` are tried, and
    /// the search continues past that until some split lowers the impurity.
    fn best_split(&mut self, sample: &[usize], parent_impurity: f64) -> Option<SplitChoice> {
        let n_features = self.rows.first().map(Vec::len).unwrap_or(0);
        if n_features == 0 {
            return None;
        }
        let order = rand::seq::index::sample(&mut *self.rng, n_features, n_features);
        let improves = |choice: &SplitChoice| parent_impurity - choice.impurity > 1e-12;

        let mut best: Option<SplitChoice> = None;
        for (visited, feature) in order.iter().enumerate() {
            if visited >= self.max_features && best.as_ref().is_some_and(improves) {
                break;
            }
            let Some(choice) = self.best_threshold(sample, feature) else {
                continue;
            };
            if best
                .as_ref()
                .map_or(true, |current| choice.impurity < current.impurity)
            {
                best = Some(choice);
            }
        }

        best.filter(improves)
    }

    /// Sweeps sorted values of one feature for the lowest weighted child gini.
    fn best_threshold(&self, sample: &[usize], feature: usize) -> Option<SplitChoice> {
        let mut ordered: Vec<(f64, usize)> = sample
            .iter()
            .map(|&row| (self.rows[row][feature], self.targets[row]))
            .collect();
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut right = vec![0.0; self.n_classes];
        for &(_, class) in &ordered {
            right[class] += self.class_weights[class];
        }
        let total: f64 = right.iter().sum();
        let mut left = vec![0.0; self.n_classes];

        let mut best: Option<SplitChoice> = None;
        for window in 0..ordered.len().saturating_sub(1) {
            let (value, class) = ordered[window];
            let weight = self.class_weights[class];
            left[class] += weight;
            right[class] -= weight;

            let next = ordered[window + 1].0;
            if next <= value {
                continue;
            }

            let left_mass: f64 = left.iter().sum();
            let right_mass = total - left_mass;
            if left_mass <= 0.0 || right_mass <= 0.0 {
                continue;
            }
            let impurity = (left_mass * gini(&left) + right_mass * gini(&right)) / total;
            if best.as_ref().map_or(true, |current| impurity < current.impurity) {
                best = Some(SplitChoice {
                    feature,
                    threshold: value + (next - value) / 2.0,
                    impurity,
                });
            }
        }
        best
    }
}

fn gini(weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - weights
        .iter()
        .map(|weight| (weight / total).powi(2))
        .sum::<f64>()
}
