//! Bagged regression-tree forest
//!
//! Each tree is fit on a bootstrap resample drawn from its own seeded
//! generator, so the forest is identical no matter how rayon schedules the
//! trees.

use super::features::N_FEATURES;
use super::tree::{BinMapper, BinnedMatrix, RegressionTree, TreeParams};
use crate::config::ForestParams;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Seed for tree `index` of a forest seeded with `seed`
fn tree_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(index as u64 + 1)
}

/// Averaging ensemble of bootstrap-trained trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    importances: [f64; N_FEATURES],
}

impl RandomForest {
    /// Fit a forest
    ///
    /// # Arguments
    ///
    /// * `data` - Binned training rows
    /// * `mapper` - Cut points used for `data`
    /// * `targets` - Target per training row
    /// * `params` - Tree count and growth limits
    /// * `seed` - Forest seed; tree `i` draws from a generator derived from it
    pub fn fit(data: &BinnedMatrix, mapper: &BinMapper, targets: &[f64], params: &ForestParams, seed: u64) -> Self {
        let n_rows = data.n_rows() as u32;
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
        };

        let trees: Vec<RegressionTree> = (0..params.n_trees)
            .into_par_iter()
            .map(|index| {
                let mut rng = StdRng::seed_from_u64(tree_seed(seed, index));
                let samples: Vec<u32> = if n_rows == 0 {
                    Vec::new()
                } else {
                    (0..n_rows).map(|_| rng.random_range(0..n_rows)).collect()
                };
                RegressionTree::fit(data, mapper, targets, &samples, tree_params)
            })
            .collect();

        let mut importances = [0.0; N_FEATURES];
        for tree in &trees {
            for (acc, v) in importances.iter_mut().zip(tree.importances()) {
                *acc += v;
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }

        Self { trees, importances }
    }

    /// Mean of tree predictions
    pub fn predict(&self, row: &[f64; N_FEATURES]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    /// Mean normalised importance per feature (sums to 1 unless no split was made)
    pub fn importances(&self) -> &[f64; N_FEATURES] {
        &self.importances
    }

    /// Number of trees
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// `true` for an empty forest
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}
