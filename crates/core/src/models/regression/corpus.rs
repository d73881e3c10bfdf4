//! Synthetic multi-year training corpus
//!
//! Samples span latitudes ±60°, all months and the years 2015-2030 with a
//! 0.05 °C/yr warming trend from 2020. Generation is fully determined by
//! the seed.

use super::features::{EngineeredFeatures, FeatureInput, N_FEATURES};
use super::labels::risk_labels;
use crate::core_types::{RiskCategory, RiskPrediction};
use crate::error::{ModelFailure, ModelResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal, Normal, StandardNormal};
use std::f64::consts::PI;

/// Warming trend applied from [`TREND_START_YEAR`] (°C/yr)
pub const WARMING_PER_YEAR: f64 = 0.05;

/// Year the warming trend is anchored at
pub const TREND_START_YEAR: i32 = 2020;

/// Spread of daily maxima around the seasonal base temperature (°C)
const TEMP_STD: f64 = 5.0;

fn distribution_error(e: impl std::fmt::Display) -> ModelFailure {
    ModelFailure::Computation(format!("invalid sampling distribution: {e}"))
}

/// Feature matrix plus per-category targets
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// One feature row per sample
    pub features: Vec<[f64; N_FEATURES]>,
    /// One label set per sample
    pub labels: Vec<RiskPrediction>,
}

impl Corpus {
    /// Generate `n_samples` synthetic samples
    ///
    /// # Arguments
    ///
    /// * `n_samples` - Corpus size
    /// * `seed` - Generator seed
    /// * `reference_year` - Year used for the temporal features
    ///
    /// # Errors
    ///
    /// [`ModelFailure::Computation`] if a sampling distribution rejects its
    /// parameters
    pub fn synthetic(n_samples: usize, seed: u64, reference_year: i32) -> ModelResult<Self> {
        let rainfall = LogNormal::new(3.0, 1.0).map_err(distribution_error)?;
        let wind = Normal::<f64>::new(5.0, 3.0).map_err(distribution_error)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut corpus = Corpus {
            features: Vec::with_capacity(n_samples),
            labels: Vec::with_capacity(n_samples),
        };

        for _ in 0..n_samples {
            let latitude = rng.random_range(-60.0..60.0);
            let longitude = rng.random_range(-180.0..180.0);
            let month: u32 = rng.random_range(1..=12);
            let year: i32 = rng.random_range(2015..=2030);

            let trend = f64::from(year - TREND_START_YEAR) * WARMING_PER_YEAR;
            let season = (f64::from(month) - 6.0) * PI / 6.0;
            let base_temp = 25.0 - 0.3 * f64::abs(latitude) + 10.0 * season.sin() + trend;
            let anomaly: f64 = StandardNormal.sample(&mut rng);
            let temp_max = base_temp + TEMP_STD * anomaly;
            let temp_min = temp_max - rng.random_range(5.0..15.0);

            let precipitation =
                (rainfall.sample(&mut rng) * (1.0 + 0.5 * (f64::from(month) * PI / 6.0).sin())).max(0.0);
            let wind_speed = wind.sample(&mut rng).max(0.0);
            let humidity = rng.random_range(30.0..95.0);

            let features = EngineeredFeatures::from_input(&FeatureInput {
                temp_max,
                temp_min,
                precipitation,
                wind_speed,
                humidity,
                latitude,
                longitude,
                month,
                year,
                reference_year,
            });
            corpus.labels.push(risk_labels(&features));
            corpus.features.push(features.values);
        }
        Ok(corpus)
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// `true` when there are no samples
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Target column for one category
    pub fn targets(&self, category: RiskCategory) -> Vec<f64> {
        self.labels.iter().map(|l| l.get(category)).collect()
    }

    /// Shuffled train/test split
    ///
    /// # Returns
    ///
    /// `(train, test)`; the test set holds `round(len × test_fraction)`
    /// samples, at least one when the corpus has two or more.
    pub fn split(&self, test_fraction: f64, seed: u64) -> (Corpus, Corpus) {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));

        let mut n_test = (self.len() as f64 * test_fraction).round() as usize;
        if self.len() >= 2 {
            n_test = n_test.clamp(1, self.len() - 1);
        } else {
            n_test = 0;
        }

        let pick = |idx: &[usize]| Corpus {
            features: idx.iter().map(|&i| self.features[i]).collect(),
            labels: idx.iter().map(|&i| self.labels[i]).collect(),
        };
        (pick(&indices[n_test..]), pick(&indices[..n_test]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_is_reproducible() {
        let a = Corpus::synthetic(200, 42, 2025).expect("valid distributions");
        let b = Corpus::synthetic(200, 42, 2025).expect("valid distributions");
        assert_eq!(a.features, b.features);
        assert_eq!(a.labels, b.labels);

        let c = Corpus::synthetic(200, 43, 2025).expect("valid distributions");
        assert_ne!(a.features, c.features);
    }

    #[test]
    fn test_corpus_ranges() {
        let corpus = Corpus::synthetic(500, 42, 2025).expect("valid distributions");
        assert_eq!(corpus.len(), 500);
        for row in &corpus.features {
            assert!(row.iter().all(|v| v.is_finite()));
            // temp_min below temp_max by 5-15 °C
            let range = row[9];
            assert!((5.0..15.0).contains(&range), "range {range}");
            assert!(row[7].abs() <= 60.0);
            assert!(row[3] >= 0.0);
        }
        assert!(corpus.labels.iter().all(RiskPrediction::is_within_bounds));
    }

    #[test]
    fn test_split_sizes() {
        let corpus = Corpus::synthetic(100, 42, 2025).expect("valid distributions");
        let (train, test) = corpus.split(0.2, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
    }

    #[test]
    fn test_precipitation_is_heavy_tailed() {
        let corpus = Corpus::synthetic(2_000, 7, 2025).expect("valid distributions");
        let mut rain: Vec<f64> = corpus.features.iter().map(|row| row[2]).collect();
        rain.sort_by(f64::total_cmp);
        let median = rain[rain.len() / 2];
        let mean = rain.iter().sum::<f64>() / rain.len() as f64;

        assert!(rain.iter().all(|r| *r >= 0.0));
        // Log-normal rainfall: the mean sits well above the median
        assert!(mean > 1.2 * median, "mean {mean} median {median}");
    }
}
