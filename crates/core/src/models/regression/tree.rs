//! Histogram-binned regression trees
//!
//! Feature values are bucketed once into at most `n_bins` quantile bins.
//! Split search then scans per-bin sums instead of sorting samples at every
//! node, so growing a tree costs O(samples × features) per level.
//!
//! Trees are stored as a flat node vector; splits keep the raw threshold so
//! prediction works directly on unbinned feature rows.
//!
//! # References
//! - Breiman, L., Friedman, J., Olshen, R. & Stone, C. (1984).
//!   Classification and Regression Trees. Wadsworth.
//! - Ke, G. et al. (2017). "LightGBM: A Highly Efficient Gradient Boosting
//!   Decision Tree". NeurIPS 30.

use super::features::N_FEATURES;
use serde::{Deserialize, Serialize};

/// Quantile cut points per feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinMapper {
    /// Ascending, de-duplicated cut points; bin `b` holds `cuts[b-1] < x ≤ cuts[b]`
    cuts: Vec<Vec<f64>>,
}

impl BinMapper {
    /// Derive cut points from training rows
    pub fn fit(rows: &[[f64; N_FEATURES]], n_bins: usize) -> Self {
        let n_bins = n_bins.clamp(2, 256);
        let cuts = (0..N_FEATURES)
            .map(|f| {
                let mut column: Vec<f64> = rows.iter().map(|r| r[f]).filter(|v| v.is_finite()).collect();
                column.sort_by(f64::total_cmp);
                let mut cuts: Vec<f64> = Vec::with_capacity(n_bins - 1);
                if column.is_empty() {
                    return cuts;
                }
                for q in 1..n_bins {
                    let idx = (q * column.len() / n_bins).min(column.len() - 1);
                    let cut = column[idx];
                    if cuts.last().is_none_or(|last| cut > *last) {
                        cuts.push(cut);
                    }
                }
                // A cut at the column maximum would put every sample left
                if cuts.last().is_some_and(|last| *last >= column[column.len() - 1]) {
                    cuts.pop();
                }
                cuts
            })
            .collect();
        Self { cuts }
    }

    /// Bin index of a value for one feature
    pub fn bin(&self, feature: usize, value: f64) -> u8 {
        self.cuts[feature].partition_point(|c| *c < value) as u8
    }

    /// Number of bins in use for a feature
    pub fn n_bins(&self, feature: usize) -> usize {
        self.cuts[feature].len() + 1
    }

    /// Raw threshold for "bin ≤ `bin`"
    pub fn threshold(&self, feature: usize, bin: usize) -> f64 {
        self.cuts[feature][bin]
    }

    /// Bin every row; column-major
    pub fn transform(&self, rows: &[[f64; N_FEATURES]]) -> BinnedMatrix {
        let columns = (0..N_FEATURES)
            .map(|f| rows.iter().map(|r| self.bin(f, r[f])).collect())
            .collect();
        BinnedMatrix { columns }
    }
}

/// Binned training rows, stored per feature
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    columns: Vec<Vec<u8>>,
}

impl BinnedMatrix {
    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }
}

/// Tree growth limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Maximum depth (root is depth 0)
    pub max_depth: usize,
    /// Minimum samples to attempt a split
    pub min_samples_split: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    /// Total squared-error reduction per feature, normalised to sum to 1
    importances: [f64; N_FEATURES],
}

struct Best {
    feature: usize,
    bin: usize,
    gain: f64,
}

struct Builder<'a> {
    data: &'a BinnedMatrix,
    mapper: &'a BinMapper,
    targets: &'a [f64],
    params: TreeParams,
    nodes: Vec<Node>,
    importances: [f64; N_FEATURES],
}

impl Builder<'_> {
    fn grow(&mut self, samples: &[u32], depth: usize) -> usize {
        let n = samples.len() as f64;
        let sum: f64 = samples.iter().map(|&i| self.targets[i as usize]).sum();
        let mean = if samples.is_empty() { 0.0 } else { sum / n };

        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf(mean));

        if depth >= self.params.max_depth || samples.len() < self.params.min_samples_split.max(2) {
            return node_id;
        }
        let Some(best) = self.best_split(samples, sum) else {
            return node_id;
        };

        let column = &self.data.columns[best.feature];
        let (left, right): (Vec<u32>, Vec<u32>) = samples
            .iter()
            .partition(|&&i| usize::from(column[i as usize]) <= best.bin);

        self.importances[best.feature] += best.gain;
        let left_id = self.grow(&left, depth + 1);
        let right_id = self.grow(&right, depth + 1);
        self.nodes[node_id] = Node::Split {
            feature: best.feature,
            threshold: self.mapper.threshold(best.feature, best.bin),
            left: left_id,
            right: right_id,
        };
        node_id
    }

    /// Best split by squared-error reduction over all features and bins
    fn best_split(&self, samples: &[u32], sum: f64) -> Option<Best> {
        let n = samples.len() as f64;
        let parent = sum * sum / n;
        let mut best: Option<Best> = None;

        for feature in 0..N_FEATURES {
            let n_bins = self.mapper.n_bins(feature);
            if n_bins < 2 {
                continue;
            }
            let column = &self.data.columns[feature];
            let mut bin_sum = vec![0.0; n_bins];
            let mut bin_count = vec![0usize; n_bins];
            for &i in samples {
                let b = usize::from(column[i as usize]);
                bin_sum[b] += self.targets[i as usize];
                bin_count[b] += 1;
            }

            let mut left_sum = 0.0;
            let mut left_count = 0usize;
            for bin in 0..n_bins - 1 {
                left_sum += bin_sum[bin];
                left_count += bin_count[bin];
                let right_count = samples.len() - left_count;
                if left_count == 0 || right_count == 0 {
                    continue;
                }
                let right_sum = sum - left_sum;
                let gain =
                    left_sum * left_sum / left_count as f64 + right_sum * right_sum / right_count as f64 - parent;
                if gain > 1e-12 && best.as_ref().is_none_or(|b| gain > b.gain) {
                    best = Some(Best { feature, bin, gain });
                }
            }
        }
        best
    }
}

impl RegressionTree {
    /// Grow a tree on the given sample indices (duplicates allowed, for bootstrap)
    ///
    /// # Arguments
    ///
    /// * `data` - Binned feature matrix
    /// * `mapper` - Cut points the matrix was binned with
    /// * `targets` - Target per row of `data`
    /// * `samples` - Row indices to fit on
    /// * `params` - Growth limits
    pub fn fit(
        data: &BinnedMatrix,
        mapper: &BinMapper,
        targets: &[f64],
        samples: &[u32],
        params: TreeParams,
    ) -> Self {
        let mut builder = Builder {
            data,
            mapper,
            targets,
            params,
            nodes: Vec::new(),
            importances: [0.0; N_FEATURES],
        };
        builder.grow(samples, 0);

        let mut importances = builder.importances;
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }
        Self {
            nodes: builder.nodes,
            importances,
        }
    }

    /// Predict for one raw feature row
    pub fn predict(&self, row: &[f64; N_FEATURES]) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Leaf(value)) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    /// Normalised feature importances
    pub fn importances(&self) -> &[f64; N_FEATURES] {
        &self.importances
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
