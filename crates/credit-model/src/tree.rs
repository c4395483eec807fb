//! CART regression tree with squared-error splits.
//!
//! Nodes are stored in a flat arena and built with an explicit work stack, so
//! unlimited depth never recurses. A row goes left when
//! `row[feature] <= threshold`.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use credit_core::constants::{DEFAULT_MIN_SAMPLES_LEAF, DEFAULT_MIN_SAMPLES_SPLIT};
use credit_core::error::ModelError;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` examines all of them.
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: DEFAULT_MIN_SAMPLES_SPLIT,
            min_samples_leaf: DEFAULT_MIN_SAMPLES_LEAF,
            max_features: None,
        }
    }
}

impl TreeParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidConfig(format!(
                "min_samples_split must be >= 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf < 1 {
            return Err(ModelError::InvalidConfig(
                "min_samples_leaf must be >= 1".to_string(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(ModelError::InvalidConfig(
                "max_features must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

/// Best split found for one node.
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

struct WorkItem {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

impl RegressionTree {
    /// Grow a tree on the rows listed in `samples` (duplicates allowed, as
    /// produced by bootstrap sampling).
    ///
    /// `features` must already be rectangular and aligned with `target`.
    pub fn fit(
        features: &[Vec<f64>],
        target: &[f64],
        samples: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self, ModelError> {
        params.validate()?;
        if samples.is_empty() || features.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let n_features = features[0].len();
        let mut feature_order: Vec<usize> = (0..n_features).collect();

        let mut nodes = vec![Node::Leaf {
            value: mean_of(target, samples),
        }];
        let mut stack = vec![WorkItem {
            node: 0,
            samples: samples.to_vec(),
            depth: 0,
        }];

        while let Some(item) = stack.pop() {
            if !should_split(target, &item, params) {
                continue;
            }

            feature_order.shuffle(rng);
            let limit = params.max_features.unwrap_or(n_features).min(n_features);
            let candidates = &feature_order[..limit];

            let Some(best) = best_split(features, target, &item.samples, candidates, params)
            else {
                continue;
            };

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf {
                value: mean_of(target, &best.left),
            });
            nodes.push(Node::Leaf {
                value: mean_of(target, &best.right),
            });
            nodes[item.node] = Node::Split {
                feature: best.feature,
                threshold: best.threshold,
                left,
                right,
            };

            stack.push(WorkItem {
                node: right,
                samples: best.right,
                depth: item.depth + 1,
            });
            stack.push(WorkItem {
                node: left,
                samples: best.left,
                depth: item.depth + 1,
            });
        }

        Ok(Self { nodes, n_features })
    }

    /// Predict a single row.
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
                } => {
                    let v = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if v <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            max_depth = max_depth.max(d);
            if let Node::Split { left, right, .. } = &self.nodes[idx] {
                stack.push((*left, d + 1));
                stack.push((*right, d + 1));
            }
        }
        max_depth
    }
}

fn mean_of(target: &[f64], samples: &[usize]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&i| target[i]).sum::<f64>() / samples.len() as f64
}

fn should_split(target: &[f64], item: &WorkItem, params: &TreeParams) -> bool {
    let n = item.samples.len();
    if n < params.min_samples_split || n < 2 * params.min_samples_leaf {
        return false;
    }
    if params.max_depth.is_some_and(|max| item.depth >= max) {
        return false;
    }
    // Stop on pure nodes.
    let first = target[item.samples[0]];
    item.samples.iter().any(|&i| target[i] != first)
}

fn best_split(
    features: &[Vec<f64>],
    target: &[f64],
    samples: &[usize],
    candidates: &[usize],
    params: &TreeParams,
) -> Option<SplitCandidate> {
    let n = samples.len();
    let total: f64 = samples.iter().map(|&i| target[i]).sum();
    let min_leaf = params.min_samples_leaf;

    // (feature, threshold, proxy) where proxy = sum_l²/n_l + sum_r²/n_r;
    // maximizing it minimizes the children's squared error.
    let mut best: Option<(usize, f64, f64)> = None;
    let mut order: Vec<usize> = samples.to_vec();

    for &feature in candidates {
        order.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));
        if features[order[0]][feature] == features[order[n - 1]][feature] {
            continue;
        }

        let mut left_sum = 0.0;
        for pos in 1..n {
            left_sum += target[order[pos - 1]];

            let prev = features[order[pos - 1]][feature];
            let next = features[order[pos]][feature];
            if prev == next || pos < min_leaf || n - pos < min_leaf {
                continue;
            }

            let right_sum = total - left_sum;
            let proxy =
                left_sum * left_sum / pos as f64 + right_sum * right_sum / (n - pos) as f64;

            if best.is_none_or(|(_, _, p)| proxy > p) {
                let mut threshold = prev + (next - prev) / 2.0;
                if threshold >= next || !threshold.is_finite() {
                    threshold = prev;
                }
                best = Some((feature, threshold, proxy));
            }
        }
    }

    let (feature, threshold, _) = best?;
    let (left, right): (Vec<usize>, Vec<usize>) = samples
        .iter()
        .copied()
        .partition(|&i| features[i][feature] <= threshold);
    Some(SplitCandidate {
        feature,
        threshold,
        left,
        right,
    })
}
