//! Bagged regression trees.
//!
//! Each tree is a CART regressor grown on a bootstrap resample of the
//! training rows, splitting on whichever feature/threshold gives the largest
//! reduction in squared error. The forest prediction is the mean over trees.
//! All randomness comes from a seeded ChaCha stream, so a given dataset and
//! parameter set always produce the same forest.

use crate::error::{Result, StrategyError};
use linfa::traits::{Fit, PredictInplace};
use linfa::DatasetBase;
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Data, Ix2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestParams {
    n_trees: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

impl RandomForestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Fit<Array2<f64>, Array1<f64>, StrategyError> for RandomForestParams {
    type Object = RandomForest;

    fn fit(&self, dataset: &DatasetBase<Array2<f64>, Array1<f64>>) -> Result<RandomForest> {
        let x = dataset.records().view();
        let y = dataset.targets().view();

        if self.n_trees == 0 {
            return Err(linfa::Error::Parameters("n_trees must be at least 1".into()).into());
        }
        if x.nrows() != y.len() {
            return Err(linfa::Error::Parameters(format!(
                "{} feature rows but {} targets",
                x.nrows(),
                y.len()
            ))
            .into());
        }
        let n = x.nrows();
        if n == 0 {
            return Err(StrategyError::InsufficientData { found: 0, required: 1 });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let trees = (0..self.n_trees)
            .map(|_| {
                let mut sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::grow(x, y, &mut sample, self)
            })
            .collect();

        Ok(RandomForest { trees, n_features: x.ncols() })
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<Node>,
    root: usize,
}

struct SplitChoice {
    feature: usize,
    threshold: f64,
    // rows going left once sorted by `feature`
    position: usize,
}

struct TreeBuilder<'a> {
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'a, f64>,
    params: &'a RandomForestParams,
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn grow<'a>(
        x: ArrayView2<'a, f64>,
        y: ArrayView1<'a, f64>,
        sample: &mut [usize],
        params: &'a RandomForestParams,
    ) -> Self {
        let mut builder = TreeBuilder { x, y, params, nodes: Vec::new() };
        let root = builder.grow(sample, 0);
        Self { nodes: builder.nodes, root }
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = self.root;
        loop {
            match self.nodes[node] {
                Node::Leaf(value) => return value,
                Node::Split { feature, threshold, left, right } => {
                    node = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        fn walk(nodes: &[Node], node: usize) -> usize {
            match nodes[node] {
                Node::Leaf(_) => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, self.root)
    }
}

impl TreeBuilder<'_> {
    fn grow(&mut self, idx: &mut [usize], depth: usize) -> usize {
        let n = idx.len();
        let mean = idx.iter().map(|&i| self.y[i]).sum::<f64>() / n as f64;

        let depth_reached = self.params.max_depth.map_or(false, |d| depth >= d);
        if n < self.params.min_samples_split.max(2) || depth_reached || self.is_pure(idx) {
            return self.push(Node::Leaf(mean));
        }

        let Some(split) = self.best_split(idx) else {
            return self.push(Node::Leaf(mean));
        };

        self.sort_by_feature(idx, split.feature);
        let (left_idx, right_idx) = idx.split_at_mut(split.position);
        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.push(Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        })
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn is_pure(&self, idx: &[usize]) -> bool {
        let first = self.y[idx[0]];
        idx.iter().all(|&i| (self.y[i] - first).abs() < 1e-12)
    }

    fn sort_by_feature(&self, idx: &mut [usize], feature: usize) {
        let x = self.x;
        idx.sort_by(|&a, &b| {
            x[[a, feature]]
                .partial_cmp(&x[[b, feature]])
                .unwrap_or(Ordering::Equal)
        });
    }

    // Maximising sum_l^2/n_l + sum_r^2/n_r is the same as minimising the
    // children's total squared error.
    fn best_split(&self, idx: &mut [usize]) -> Option<SplitChoice> {
        let n = idx.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let total: f64 = idx.iter().map(|&i| self.y[i]).sum();

        let mut best: Option<(f64, SplitChoice)> = None;
        for feature in 0..self.x.ncols() {
            self.sort_by_feature(idx, feature);

            let mut left_sum = 0.0;
            for k in 1..n {
                left_sum += self.y[idx[k - 1]];
                if k < min_leaf || n - k < min_leaf {
                    continue;
                }
                let lo = self.x[[idx[k - 1], feature]];
                let hi = self.x[[idx[k], feature]];
                if lo >= hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let score = left_sum * left_sum / k as f64 + right_sum * right_sum / (n - k) as f64;
                if best.as_ref().map_or(true, |(s, _)| score > *s) {
                    let choice = SplitChoice {
                        feature,
                        threshold: (lo + hi) / 2.0,
                        position: k,
                    };
                    best = Some((score, choice));
                }
            }
        }
        best.map(|(_, choice)| choice)
    }
}

/// Fitted ensemble. Read-only after fitting, so it can be shared across
/// threads for concurrent inference.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(RegressionTree::depth).max().unwrap_or(0)
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }
}

impl<D: Data<Elem = f64>> PredictInplace<ArrayBase<D, Ix2>, Array1<f64>> for RandomForest {
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<f64>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        for (row, target) in x.rows().into_iter().zip(y.iter_mut()) {
            *target = self.predict_row(row);
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<f64> {
        Array1::zeros(x.nrows())
    }
}
