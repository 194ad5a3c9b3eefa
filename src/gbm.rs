use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;
use crate::evaluation::stable_mean;
use crate::matrix::FeatureMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl BoostingParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParams("n_estimators must be > 0".into()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ModelError::InvalidParams(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.max_depth == 0 {
            return Err(ModelError::InvalidParams("max_depth must be > 0".into()));
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidParams("min_samples_split must be >= 2".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParams("min_samples_leaf must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        // Reduction in squared error achieved by this split.
        improvement: f64,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    improvement: f64,
}

struct TreeBuilder<'a> {
    x: &'a FeatureMatrix,
    residuals: &'a [f64],
    params: &'a BoostingParams,
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn fit(
        x: &FeatureMatrix,
        residuals: &[f64],
        params: &BoostingParams,
    ) -> RegressionTree {
        let mut builder = TreeBuilder {
            x,
            residuals,
            params,
            nodes: Vec::new(),
        };
        let all: Vec<usize> = (0..x.rows()).collect();
        builder.grow(all, 0);
        RegressionTree {
            nodes: builder.nodes,
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    fn validate(&self, tree: usize, n_features: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::EmptyTree(tree));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ModelError::InvalidNode {
                            tree,
                            node: idx,
                            reason: "non-finite leaf",
                        });
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    improvement,
                } => {
                    // Children always come after their parent, so traversal terminates.
                    if *feature >= n_features
                        || !threshold.is_finite()
                        || !improvement.is_finite()
                        || *left <= idx
                        || *right <= idx
                        || *left >= self.nodes.len()
                        || *right >= self.nodes.len()
                    {
                        return Err(ModelError::InvalidNode {
                            tree,
                            node: idx,
                            reason: "invalid split",
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl TreeBuilder<'_> {
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let slot = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: self.mean(&samples),
        });

        if depth >= self.params.max_depth
            || samples.len() < self.params.min_samples_split
            || samples.len() < 2 * self.params.min_samples_leaf
            || self.is_pure(&samples)
        {
            return slot;
        }

        let Some(split) = self.best_split(&samples) else {
            return slot;
        };

        let x = self.x;
        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| x.get(i, split.feature) <= split.threshold);

        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.nodes[slot] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            improvement: split.improvement,
        };
        slot
    }

    fn mean(&self, samples: &[usize]) -> f64 {
        stable_mean(samples.iter().map(|&i| self.residuals[i])).unwrap_or(0.0)
    }

    fn is_pure(&self, samples: &[usize]) -> bool {
        let first = self.residuals[samples[0]];
        samples.iter().all(|&i| self.residuals[i] == first)
    }

    fn best_split(&self, samples: &[usize]) -> Option<SplitCandidate> {
        let per_feature: Vec<Option<SplitCandidate>> = (0..self.x.cols())
            .into_par_iter()
            .map(|feature| self.best_split_for_feature(samples, feature))
            .collect();

        // Ties resolve to the lowest feature index.
        let mut best: Option<SplitCandidate> = None;
        for candidate in per_feature.into_iter().flatten() {
            if best.is_none_or(|b| candidate.improvement > b.improvement) {
                best = Some(candidate);
            }
        }
        best
    }

    fn best_split_for_feature(&self, samples: &[usize], feature: usize) -> Option<SplitCandidate> {
        let mut order = samples.to_vec();
        order.sort_by(|&a, &b| self.x.get(a, feature).total_cmp(&self.x.get(b, feature)));

        let n = order.len();
        let total: f64 = order.iter().map(|&i| self.residuals[i]).sum();
        let parent_score = total * total / n as f64;
        let min_leaf = self.params.min_samples_leaf;

        let mut best: Option<SplitCandidate> = None;
        let mut left_sum = 0.0_f64;
        for pos in 0..n - 1 {
            left_sum += self.residuals[order[pos]];
            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }
            let here = self.x.get(order[pos], feature);
            let next = self.x.get(order[pos + 1], feature);
            if here == next {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
            let improvement = score - parent_score;
            if improvement <= 0.0 {
                continue;
            }
            if best.is_none_or(|b| improvement > b.improvement) {
                let mut threshold = here + (next - here) / 2.0;
                if threshold >= next {
                    threshold = here;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    improvement,
                });
            }
        }
        best
    }
}

/// Additive ensemble of shallow regression trees fit to squared-error residuals.
///
/// Prediction is `init + learning_rate * sum(tree(x))` and is left unclamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingModel {
    params: BoostingParams,
    n_features: usize,
    init: f64,
    trees: Vec<RegressionTree>,
    train_loss: Vec<f64>,
}

impl GradientBoostingModel {
    pub fn fit(
        x: &FeatureMatrix,
        y: &[f64],
        params: BoostingParams,
    ) -> Result<GradientBoostingModel, ModelError> {
        params.validate()?;
        if x.rows() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.rows() != y.len() {
            return Err(ModelError::LengthMismatch {
                rows: x.rows(),
                targets: y.len(),
            });
        }
        if !x.is_finite() {
            return Err(ModelError::NonFinite("features"));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("targets"));
        }

        let init = stable_mean(y.iter().copied()).unwrap_or(0.0);
        let mut current = vec![init; y.len()];
        let mut residuals = vec![0.0; y.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut train_loss = Vec::with_capacity(params.n_estimators);

        for stage in 0..params.n_estimators {
            for ((r, target), pred) in residuals.iter_mut().zip(y).zip(&current) {
                *r = target - pred;
            }
            let tree = RegressionTree::fit(x, &residuals, &params);
            for (row_idx, pred) in current.iter_mut().enumerate() {
                *pred += params.learning_rate * tree.predict_row(x.row(row_idx));
            }
            let mse = mean_squared_error(y, &current);
            if stage % 20 == 0 {
                debug!(stage, mse, nodes = tree.nodes.len(), "boosting stage");
            }
            train_loss.push(mse);
            trees.push(tree);
        }

        let model = GradientBoostingModel {
            params,
            n_features: x.cols(),
            init,
            trees,
            train_loss,
        };
        // Targets whose squares overflow leave infinities in the loss or the splits.
        model.validate()?;
        Ok(model)
    }

    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        if x.cols() != self.n_features {
            return Err(ModelError::ShapeMismatch {
                expected: self.n_features,
                actual: x.cols(),
            });
        }
        Ok(x.iter_rows().map(|row| self.predict_unchecked(row)).collect())
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        if row.len() != self.n_features {
            return Err(ModelError::ShapeMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }
        Ok(self.predict_unchecked(row))
    }

    fn predict_unchecked(&self, row: &[f64]) -> f64 {
        let mut out = self.init;
        for tree in &self.trees {
            out += self.params.learning_rate * tree.predict_row(row);
        }
        out
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn init(&self) -> f64 {
        self.init
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Training MSE after each stage.
    pub fn train_loss(&self) -> &[f64] {
        &self.train_loss
    }

    /// Total squared-error reduction per feature, normalised to sum to 1.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0_f64; self.n_features];
        for tree in &self.trees {
            for node in &tree.nodes {
                if let Node::Split {
                    feature,
                    improvement,
                    ..
                } = node
                    && let Some(slot) = totals.get_mut(*feature)
                {
                    *slot += improvement;
                }
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for v in &mut totals {
                *v /= sum;
            }
        }
        totals
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        self.params.validate()?;
        if !self.init.is_finite() {
            return Err(ModelError::NonFinite("initial prediction"));
        }
        if self.train_loss.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("training loss"));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx, self.n_features)?;
        }
        Ok(())
    }
}

pub fn mean_squared_error(y: &[f64], pred: &[f64]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    y.iter()
        .zip(pred)
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        / y.len() as f64
}
