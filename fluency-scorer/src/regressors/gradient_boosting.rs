//! Gradient-boosted regression trees with squared-error loss
//!
//! Each stage fits a depth-limited CART tree to the current residuals and
//! adds `learning_rate * tree(x)` to the running prediction, starting from
//! the mean label. Splits maximise the Friedman MSE improvement
//! `n_l * n_r / (n_l + n_r) * (mean_l - mean_r)^2`.

use super::{check_features, check_training_data, Regressor};
use crate::error::{Result, ScorerError};
use fluency_common::config::BoostingConfig;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Adjacent feature values closer than this are not split between
const FEATURE_THRESHOLD: f64 = 1e-7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// One fitted tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                Some(Node::Leaf { value }) => return *value,
                None => return 0.0,
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    fn max_feature_index(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Split { feature, .. } => Some(*feature),
                Node::Leaf { .. } => None,
            })
            .max()
    }
}

/// Fitted ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    pub n_features: usize,
    pub learning_rate: f64,
    pub init: f64,
    pub trees: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    pub fn fit(features: &Array2<f64>, labels: &[f64], params: &BoostingConfig) -> Result<Self> {
        check_training_data(features, labels)?;
        validate_params(params)?;

        let n_samples = labels.len();
        let init = labels.iter().sum::<f64>() / n_samples as f64;
        let mut predictions = vec![init; n_samples];
        let mut residuals = vec![0.0; n_samples];
        let mut trees = Vec::with_capacity(params.n_estimators);

        let builder = TreeBuilder {
            features,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            min_samples_leaf: params.min_samples_leaf.max(1),
        };

        for _ in 0..params.n_estimators {
            for ((r, &y), &p) in residuals.iter_mut().zip(labels).zip(&predictions) {
                *r = y - p;
            }
            let tree = builder.build(&residuals);
            for (i, p) in predictions.iter_mut().enumerate() {
                *p += params.learning_rate * tree.predict_row(features.row(i));
            }
            trees.push(tree);
        }

        let model = Self {
            n_features: features.ncols(),
            learning_rate: params.learning_rate,
            init,
            trees,
        };
        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(ScorerError::Fit(
                "gradient boosting produced non-finite predictions".to_string(),
            ));
        }
        Ok(model)
    }

    /// Structural checks for a deserialised model
    pub fn validate(&self) -> Result<()> {
        for tree in &self.trees {
            let n = tree.nodes.len();
            if n == 0 {
                return Err(ScorerError::Artifact("empty tree".to_string()));
            }
            // Nodes are stored in pre-order, so children always follow their
            // parent; this also rules out cycles
            for (idx, node) in tree.nodes.iter().enumerate() {
                if let Node::Split { left, right, .. } = node {
                    if *left >= n || *right >= n {
                        return Err(ScorerError::Artifact("tree child index out of range".into()));
                    }
                    if *left <= idx || *right <= idx {
                        return Err(ScorerError::Artifact(format!(
                            "tree node {} points back to node {}",
                            idx,
                            (*left).min(*right)
                        )));
                    }
                }
            }
            if let Some(f) = tree.max_feature_index() {
                if f >= self.n_features {
                    return Err(ScorerError::Artifact(format!(
                        "tree splits on feature {} of {}",
                        f, self.n_features
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Regressor for GradientBoostingRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>> {
        check_features(features, self.n_features, "gradient boosting predict")?;
        Ok(features
            .rows()
            .into_iter()
            .map(|row| {
                self.trees.iter().fold(self.init, |acc, tree| {
                    acc + self.learning_rate * tree.predict_row(row)
                })
            })
            .collect())
    }
}

fn validate_params(params: &BoostingConfig) -> Result<()> {
    if params.n_estimators == 0 {
        return Err(ScorerError::Fit("n_estimators must be at least 1".to_string()));
    }
    if !(params.learning_rate > 0.0) || !params.learning_rate.is_finite() {
        return Err(ScorerError::Fit(format!(
            "learning_rate must be positive, got {}",
            params.learning_rate
        )));
    }
    if params.max_depth == 0 {
        return Err(ScorerError::Fit("max_depth must be at least 1".to_string()));
    }
    Ok(())
}

struct TreeBuilder<'a> {
    features: &'a Array2<f64>,
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl TreeBuilder<'_> {
    fn build(&self, targets: &[f64]) -> RegressionTree {
        let mut nodes = Vec::new();
        let all: Vec<usize> = (0..targets.len()).collect();
        self.grow(&mut nodes, targets, all, 0);
        RegressionTree { nodes }
    }

    /// Append the subtree for `samples` and return its node index
    fn grow(&self, nodes: &mut Vec<Node>, targets: &[f64], samples: Vec<usize>, depth: usize) -> usize {
        let idx = nodes.len();
        let n = samples.len() as f64;
        let mean = samples.iter().map(|&i| targets[i]).sum::<f64>() / n;
        nodes.push(Node::Leaf { value: mean });

        let impurity = samples.iter().map(|&i| (targets[i] - mean).powi(2)).sum::<f64>() / n;
        if depth >= self.max_depth
            || samples.len() < self.min_samples_split
            || samples.len() < 2 * self.min_samples_leaf
            || impurity <= f64::EPSILON
        {
            return idx;
        }

        if let Some(split) = self.best_split(targets, &samples) {
            let left = self.grow(nodes, targets, split.left, depth + 1);
            let right = self.grow(nodes, targets, split.right, depth + 1);
            nodes[idx] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
        }
        idx
    }

    fn best_split(&self, targets: &[f64], samples: &[usize]) -> Option<BestSplit> {
        let n = samples.len();
        let total: f64 = samples.iter().map(|&i| targets[i]).sum();
        let mut best: Option<BestSplit> = None;
        let mut order = samples.to_vec();

        for feature in 0..self.features.ncols() {
            let column = self.features.column(feature);
            order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

            let mut left_sum = 0.0;
            for pos in 0..n - 1 {
                left_sum += targets[order[pos]];
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }
                let (lo, hi) = (column[order[pos]], column[order[pos + 1]]);
                if hi <= lo + FEATURE_THRESHOLD {
                    continue;
                }

                let right_sum = total - left_sum;
                let diff = left_sum / n_left as f64 - right_sum / n_right as f64;
                let gain = (n_left * n_right) as f64 / n as f64 * diff * diff;

                if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        gain,
                        left: order[..n_left].to_vec(),
                        right: order[n_left..].to_vec(),
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(n_estimators: usize, max_depth: usize) -> BoostingConfig {
        BoostingConfig {
            n_estimators,
            max_depth,
            ..BoostingConfig::default()
        }
    }

    #[test]
    fn test_single_stump_splits_at_midpoint() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0.0, 0.0, 10.0, 10.0];
        let model = GradientBoostingRegressor::fit(&x, &y, &params(1, 1)).unwrap();

        assert_eq!(model.init, 5.0);
        match &model.trees[0].nodes[0] {
            Node::Split { feature, threshold, .. } => {
                assert_eq!(*feature, 0);
                assert_eq!(*threshold, 2.5);
            }
            other => panic!("expected split, got {:?}", other),
        }
        // 5 + 0.1 * (-5) and 5 + 0.1 * 5
        let pred = model.predict(&array![[0.0], [9.0]]).unwrap();
        assert!((pred[0] - 4.5).abs() < 1e-12);
        assert!((pred[1] - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_boosting_converges_on_step_function() {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 } else { 0.0 });
        let y: Vec<f64> = (0..40).map(|i| if i < 20 { 1.0 } else { 4.0 }).collect();
        let model = GradientBoostingRegressor::fit(&x, &y, &BoostingConfig::default()).unwrap();
        let pred = model.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(&y) {
            // Residual shrinks by 0.9 per stage: 1.5 * 0.9^100
            assert!((p - t).abs() < 1e-3);
        }
    }

    #[test]
    fn test_depth_limit_respected() {
        let x = Array2::from_shape_fn((64, 3), |(i, j)| ((i * (j + 3)) % 17) as f64);
        let y: Vec<f64> = (0..64).map(|i| (i % 7) as f64).collect();
        let model = GradientBoostingRegressor::fit(&x, &y, &params(10, 3)).unwrap();
        assert!(model.trees.iter().all(|t| t.depth() <= 3));
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_constant_features_give_mean_prediction() {
        let x = Array2::from_elem((5, 3), 1.0);
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        let model = GradientBoostingRegressor::fit(&x, &y, &params(5, 3)).unwrap();
        let pred = model.predict(&x).unwrap();
        assert!(pred.iter().all(|&p| (p - 3.0).abs() < 1e-12));
    }

    #[test]
    fn test_min_samples_leaf_blocks_small_children() {
        let x = array![[1.0], [2.0], [3.0]];
        let cfg = BoostingConfig {
            n_estimators: 1,
            max_depth: 3,
            min_samples_leaf: 2,
            ..BoostingConfig::default()
        };
        let model = GradientBoostingRegressor::fit(&x, &[0.0, 0.0, 9.0], &cfg).unwrap();
        assert!(matches!(model.trees[0].nodes[0], Node::Leaf { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_child_index() {
        let model = GradientBoostingRegressor {
            n_features: 1,
            learning_rate: 0.1,
            init: 0.0,
            trees: vec![RegressionTree {
                nodes: vec![Node::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 1,
                    right: 7,
                }],
            }],
        };
        assert!(model.validate().is_err());
    }
}
