//! Gradient-boosted regression trees (squared loss)
//!
//! # References
//! - Friedman, J.H. (2001). "Greedy function approximation: A gradient
//!   boosting machine". Annals of Statistics, 29(5), 1189-1232.

use super::features::N_FEATURES;
use super::tree::{BinMapper, BinnedMatrix, RegressionTree, TreeParams};
use crate::config::BoostingParams;
use serde::{Deserialize, Serialize};

/// Additive ensemble of shrunken residual trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    init: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoosting {
    /// Fit by repeatedly regressing on the current residuals
    ///
    /// `rows` and `data` describe the same samples: `data` drives the split
    /// search, `rows` the running prediction.
    pub fn fit(
        rows: &[[f64; N_FEATURES]],
        data: &BinnedMatrix,
        mapper: &BinMapper,
        targets: &[f64],
        params: &BoostingParams,
    ) -> Self {
        let n = targets.len();
        let init = if n == 0 {
            0.0
        } else {
            targets.iter().sum::<f64>() / n as f64
        };
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
        };
        let samples: Vec<u32> = (0..n as u32).collect();

        let mut current = vec![init; n];
        let mut residuals = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.n_rounds);

        for _ in 0..params.n_rounds {
            for ((r, y), f) in residuals.iter_mut().zip(targets).zip(&current) {
                *r = y - f;
            }
            let tree = RegressionTree::fit(data, mapper, &residuals, &samples, tree_params);
            for (f, row) in current.iter_mut().zip(rows) {
                *f += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        Self {
            init,
            learning_rate: params.learning_rate,
            trees,
        }
    }

    /// Predict for one raw feature row
    pub fn predict(&self, row: &[f64; N_FEATURES]) -> f64 {
        self.init + self.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    /// Number of boosting rounds fitted
    pub fn rounds(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boosting_reduces_training_error() {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..300 {
            let mut row = [0.0; N_FEATURES];
            row[0] = f64::from(i) / 3.0;
            row[1] = f64::from(i % 13);
            targets.push((row[0] / 10.0).sin() * 40.0 + 50.0 + row[1]);
            rows.push(row);
        }
        let mapper = BinMapper::fit(&rows, 32);
        let data = mapper.transform(&rows);

        let mse = |model: &GradientBoosting| {
            rows.iter()
                .zip(&targets)
                .map(|(r, y)| (model.predict(r) - y).powi(2))
                .sum::<f64>()
                / targets.len() as f64
        };

        let params = |n_rounds| BoostingParams {
            n_rounds,
            max_depth: 3,
            learning_rate: 0.2,
            min_samples_split: 5,
        };
        let short = GradientBoosting::fit(&rows, &data, &mapper, &targets, &params(2));
        let long = GradientBoosting::fit(&rows, &data, &mapper, &targets, &params(40));
        assert_eq!(long.rounds(), 40);
        assert!(mse(&long) < mse(&short));
        assert!(mse(&long) < 50.0, "mse {}", mse(&long));
    }
}
