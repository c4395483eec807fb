//! Bagged ensemble of regression trees.
//!
//! Every tree is grown on a bootstrap sample drawn with replacement. The
//! per-tree RNGs are seeded from a single forest RNG, so a given seed always
//! yields the same forest.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::debug;

use credit_core::constants::{DEFAULT_N_ESTIMATORS, DEFAULT_SEED};
use credit_core::error::ModelError;
use credit_core::traits::{check_rectangular, check_training_set, Regressor};

use crate::tree::{RegressionTree, TreeParams};

/// Forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub seed: u64,
    /// Draw a bootstrap sample per tree; otherwise every tree sees all rows.
    pub bootstrap: bool,
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            seed: DEFAULT_SEED,
            bootstrap: true,
            tree: TreeParams::default(),
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidConfig(
                "n_estimators must be >= 1".to_string(),
            ));
        }
        self.tree.validate()
    }
}

/// Random forest regressor (mean of tree predictions).
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    params: ForestParams,
    trees: Vec<RegressionTree>,
    n_features: Option<usize>,
}

impl RandomForestRegressor {
    pub fn new(params: ForestParams) -> Result<Self, ModelError> {
        params.validate()?;
        Ok(Self {
            params,
            trees: Vec::new(),
            n_features: None,
        })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn is_fitted(&self) -> bool {
        self.n_features.is_some()
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, features: &[Vec<f64>], target: &[f64]) -> Result<(), ModelError> {
        let n_features = check_training_set(features, target)?;
        let n = features.len();
        let mut forest_rng = StdRng::seed_from_u64(self.params.seed);

        let mut trees = Vec::with_capacity(self.params.n_estimators);
        for _ in 0..self.params.n_estimators {
            let mut tree_rng = StdRng::seed_from_u64(forest_rng.next_u64());
            let samples: Vec<usize> = if self.params.bootstrap {
                (0..n).map(|_| tree_rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            trees.push(RegressionTree::fit(
                features,
                target,
                &samples,
                &self.params.tree,
                &mut tree_rng,
            )?);
        }

        debug!(
            trees = trees.len(),
            rows = n,
            features = n_features,
            "forest: fitted"
        );
        self.trees = trees;
        self.n_features = Some(n_features);
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let n_features = self.n_features.ok_or(ModelError::NotFitted)?;
        check_rectangular(features, n_features)?;
        let n_trees = self.trees.len() as f64;

        Ok(features
            .iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }
}
