//! Feature-engineered regression model
//!
//! Seventeen engineered features feed one of two variants, picked once at
//! construction:
//!
//! - **Tree ensemble**: per category, a bagged forest and a gradient-boosted
//!   ensemble trained on a synthetic multi-year corpus, blended
//!   `forest_share : 1 - forest_share`.
//! - **Closed form**: hand-set formulas, no training.
//!
//! Training is an explicit step ([`RegressionModel::train`]); the trained
//! parameters are immutable afterwards and shared across requests.
//!
//! # References
//! - Breiman, L. (2001). "Random Forests". Machine Learning, 45(1), 5-32.
//! - Friedman, J.H. (2001). "Greedy function approximation: A gradient
//!   boosting machine". Annals of Statistics, 29(5), 1189-1232.

pub mod boosting;
pub mod closed_form;
pub mod corpus;
pub mod features;
pub mod forest;
pub mod labels;
pub mod tree;

use self::boosting::GradientBoosting;
use self::closed_form::{closed_form_confidence, closed_form_risks};
use self::corpus::Corpus;
use self::features::{EngineeredFeatures, FeatureInput, FEATURE_NAMES, N_FEATURES};
use self::forest::RandomForest;
use self::tree::BinMapper;
use super::{ModelAdapter, ModelDetail, ModelKind, ModelOutput, PredictionRequest};
use crate::config::{RegressionBackend, RegressionConfig};
use crate::core_types::{RiskCategory, RiskPrediction, TargetDate};
use crate::error::{ModelFailure, ModelResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

/// Features listed per category in the detail record
const TOP_FEATURES: usize = 3;

/// Seasonal certainty term for months with a strong seasonal signal
const SEASONAL_PEAK: f64 = 0.9;

/// Seasonal certainty term otherwise
const SEASONAL_OFF_PEAK: f64 = 0.7;

/// Squared error and explained variance on the hold-out set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldoutMetrics {
    /// Mean squared error
    pub mse: f64,
    /// Coefficient of determination
    pub r2: f64,
}

impl HoldoutMetrics {
    fn evaluate(predicted: &[f64], actual: &[f64]) -> Self {
        let n = actual.len().max(1) as f64;
        let mean = actual.iter().sum::<f64>() / n;
        let ss_res: f64 = predicted.iter().zip(actual).map(|(p, y)| (p - y).powi(2)).sum();
        let ss_tot: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
        Self {
            mse: ss_res / n,
            r2: if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 },
        }
    }
}

/// One feature and its share of a forest's split gain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Feature name
    pub name: String,
    /// Normalised importance (0-1)
    pub importance: f64,
}

/// Regression diagnostics for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionDetail {
    /// Variant that produced the prediction
    pub backend: RegressionBackend,
    /// Engineered feature values by name
    pub features: BTreeMap<String, f64>,
    /// Most important forest features per category (tree ensemble only)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub top_features: BTreeMap<RiskCategory, Vec<FeatureImportance>>,
    /// Hold-out metrics per category (tree ensemble only)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub holdout: BTreeMap<RiskCategory, HoldoutMetrics>,
}

/// Forest + boosting pair for one category
#[derive(Debug, Clone)]
struct CategoryModel {
    forest: RandomForest,
    boosting: GradientBoosting,
    holdout: HoldoutMetrics,
}

impl CategoryModel {
    fn predict(&self, row: &[f64; N_FEATURES], forest_share: f64) -> f64 {
        forest_share * self.forest.predict(row) + (1.0 - forest_share) * self.boosting.predict(row)
    }

    /// Mean of the largest forest importances
    fn top_importance(&self) -> f64 {
        let mut sorted = *self.forest.importances();
        sorted.sort_by(|a, b| b.total_cmp(a));
        sorted[..TOP_FEATURES].iter().sum::<f64>() / TOP_FEATURES as f64
    }

    fn top_features(&self) -> Vec<FeatureImportance> {
        let mut ranked: Vec<(usize, f64)> = self.forest.importances().iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(TOP_FEATURES)
            .map(|(i, importance)| FeatureImportance {
                name: FEATURE_NAMES[i].to_string(),
                importance,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
struct TrainedEnsemble {
    forest_share: f64,
    /// Indexed by [`RiskCategory::index`]
    categories: Vec<CategoryModel>,
}

#[derive(Debug, Clone)]
enum Variant {
    TreeEnsemble(Box<TrainedEnsemble>),
    ClosedForm,
}

/// Engineered-feature regression model
#[derive(Debug, Clone)]
pub struct RegressionModel {
    variant: Variant,
}

impl RegressionModel {
    /// Train the tree ensemble on a fresh synthetic corpus
    ///
    /// Categories train in parallel; within a category the forest trees do
    /// too. Every generator is seeded from `config.seed`, so the result does
    /// not depend on scheduling.
    ///
    /// # Arguments
    ///
    /// * `config` - Corpus and hyper-parameters
    /// * `reference_year` - Year the temporal features are relative to
    ///
    /// # Errors
    ///
    /// [`ModelFailure::Computation`] if the corpus is too small to split, or
    /// a trained category scores non-finite on the hold-out set
    pub fn train(config: &RegressionConfig, reference_year: i32) -> ModelResult<Self> {
        let started = Instant::now();
        let corpus = Corpus::synthetic(config.corpus_size, config.seed, reference_year)?;
        if corpus.len() < 2 {
            return Err(ModelFailure::Computation(format!(
                "corpus of {} samples is too small to split",
                corpus.len()
            )));
        }
        let (train, test) = corpus.split(config.test_fraction, config.seed);
        let mapper = BinMapper::fit(&train.features, config.n_bins);
        let data = mapper.transform(&train.features);

        let categories: Vec<CategoryModel> = RiskCategory::ALL
            .into_par_iter()
            .map(|category| {
                let targets = train.targets(category);
                let forest_seed = config.seed.wrapping_add(category.index() as u64 + 1);
                let forest = RandomForest::fit(&data, &mapper, &targets, &config.forest, forest_seed);
                let boosting = GradientBoosting::fit(&train.features, &data, &mapper, &targets, &config.boosting);

                let predicted: Vec<f64> = test
                    .features
                    .iter()
                    .map(|row| {
                        (config.forest_share * forest.predict(row)
                            + (1.0 - config.forest_share) * boosting.predict(row))
                        .clamp(0.0, 100.0)
                    })
                    .collect();
                let holdout = HoldoutMetrics::evaluate(&predicted, &test.targets(category));
                CategoryModel {
                    forest,
                    boosting,
                    holdout,
                }
            })
            .collect();

        for (category, model) in RiskCategory::ALL.iter().zip(&categories) {
            if !model.holdout.mse.is_finite() {
                return Err(ModelFailure::non_finite(format!("{category} hold-out error")));
            }
            info!(
                "Regression {}: hold-out MSE {:.2}, R² {:.3} ({} trees, {} rounds)",
                category,
                model.holdout.mse,
                model.holdout.r2,
                model.forest.len(),
                model.boosting.rounds()
            );
        }
        info!(
            "Trained regression ensemble on {} samples ({} held out) in {:.2}s",
            train.len(),
            test.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(Self {
            variant: Variant::TreeEnsemble(Box::new(TrainedEnsemble {
                forest_share: config.forest_share,
                categories,
            })),
        })
    }

    /// Closed-form variant; needs no training
    pub fn closed_form() -> Self {
        Self {
            variant: Variant::ClosedForm,
        }
    }

    /// Which variant this model runs
    pub fn backend(&self) -> RegressionBackend {
        match self.variant {
            Variant::TreeEnsemble(_) => RegressionBackend::TreeEnsemble,
            Variant::ClosedForm => RegressionBackend::ClosedForm,
        }
    }

    fn seasonal_certainty(date: TargetDate) -> f64 {
        if date.is_june_to_august() || date.is_december_to_february() {
            SEASONAL_PEAK
        } else {
            SEASONAL_OFF_PEAK
        }
    }
}

impl ModelAdapter for RegressionModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Regression
    }

    fn predict(&self, request: &PredictionRequest) -> ModelResult<ModelOutput> {
        let obs = request.resolved();
        let features = EngineeredFeatures::from_input(&FeatureInput::from_observation(
            &obs,
            request.date,
            request.target_year,
            request.reference_year,
        ));
        let named: BTreeMap<String, f64> = features.named().map(|(k, v)| (k.to_string(), v)).collect();

        match &self.variant {
            Variant::TreeEnsemble(ensemble) => {
                let mut raw = RiskPrediction::default();
                let mut top_features = BTreeMap::new();
                let mut holdout = BTreeMap::new();
                let mut importance_sum = 0.0;
                for category in RiskCategory::ALL {
                    let model = ensemble
                        .categories
                        .get(category.index())
                        .ok_or(ModelFailure::Untrained(category))?;
                    raw.set(category, model.predict(&features.values, ensemble.forest_share));
                    importance_sum += model.top_importance();
                    top_features.insert(category, model.top_features());
                    holdout.insert(category, model.holdout);
                }
                let importance = importance_sum / RiskCategory::ALL.len() as f64;
                let confidence = (0.4 * obs.completeness
                    + 0.4 * importance
                    + 0.2 * Self::seasonal_certainty(request.date))
                    * 100.0;
                debug!(importance, confidence, "Tree-ensemble regression evaluated");

                let detail = RegressionDetail {
                    backend: RegressionBackend::TreeEnsemble,
                    features: named,
                    top_features,
                    holdout,
                };
                ModelOutput::checked(
                    ModelKind::Regression,
                    raw,
                    confidence,
                    Some("tree_ensemble"),
                    Some(ModelDetail::Regression(detail)),
                )
            }
            Variant::ClosedForm => {
                let detail = RegressionDetail {
                    backend: RegressionBackend::ClosedForm,
                    features: named,
                    top_features: BTreeMap::new(),
                    holdout: BTreeMap::new(),
                };
                ModelOutput::checked(
                    ModelKind::Regression,
                    closed_form_risks(&obs, request.date),
                    closed_form_confidence(&obs),
                    Some("closed_form"),
                    Some(ModelDetail::Regression(detail)),
                )
            }
        }
    }

    fn fallback(&self, _request: &PredictionRequest) -> ModelOutput {
        ModelOutput::fallback(
            RiskPrediction::new(25.0, 15.0, 30.0, 20.0, 35.0),
            50.0,
            "regression fallback",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Observation;
    use std::sync::OnceLock;

    fn tiny_config() -> RegressionConfig {
        let mut config = RegressionConfig::compact();
        config.corpus_size = 800;
        config.forest.n_trees = 8;
        config.boosting.n_rounds = 15;
        config
    }

    fn trained() -> &'static RegressionModel {
        static MODEL: OnceLock<RegressionModel> = OnceLock::new();
        MODEL.get_or_init(|| RegressionModel::train(&tiny_config(), 2025).unwrap())
    }

    fn request(obs: Observation, month: u32) -> PredictionRequest {
        PredictionRequest::new(obs, TargetDate { month, day: 15 }, None, 2025, None)
    }

    fn desert() -> Observation {
        Observation::at(25.2, 55.27)
            .with_temperatures(42.0, 28.0)
            .with_humidity(35.0)
            .with_precipitation(0.1)
            .with_wind_speed(8.0)
            .with_pressure(1015.0)
    }

    fn polar() -> Observation {
        Observation::at(-77.8, 166.7)
            .with_temperatures(-25.0, -35.0)
            .with_humidity(60.0)
            .with_precipitation(0.5)
            .with_wind_speed(30.0)
            .with_pressure(980.0)
    }

    #[test]
    fn test_tree_ensemble_is_bounded_and_ranked() {
        let model = trained();
        assert_eq!(model.backend(), RegressionBackend::TreeEnsemble);

        let hot = model.predict(&request(desert(), 7)).unwrap();
        let cold = model.predict(&request(polar(), 7)).unwrap();
        assert!(hot.predictions.is_within_bounds());
        assert!(cold.predictions.is_within_bounds());
        assert!(hot.predictions.extreme_heat > hot.predictions.extreme_cold);
        assert!(cold.predictions.extreme_cold > cold.predictions.extreme_heat);
        assert!((0.0..=100.0).contains(&hot.confidence));
        assert_eq!(hot.method.as_deref(), Some("tree_ensemble"));
    }

    #[test]
    fn test_detail_record() {
        let out = trained().predict(&request(desert(), 7)).unwrap();
        let Some(ModelDetail::Regression(detail)) = out.detail else {
            panic!("missing regression detail");
        };
        assert_eq!(detail.features.len(), N_FEATURES);
        assert_eq!(detail.features["temp_range"], 14.0);
        assert_eq!(detail.top_features.len(), 5);
        assert!(detail.top_features.values().all(|f| f.len() == TOP_FEATURES));
        assert_eq!(detail.holdout.len(), 5);
        assert!(detail.holdout.values().all(|m| m.mse.is_finite()));
    }

    #[test]
    fn test_training_is_reproducible() {
        let a = RegressionModel::train(&tiny_config(), 2025).unwrap();
        let req = request(desert(), 7);
        assert_eq!(a.predict(&req).unwrap(), trained().predict(&req).unwrap());
    }

    #[test]
    fn test_seasonal_confidence_term() {
        let model = trained();
        let july = model.predict(&request(desert(), 7)).unwrap();
        let april = model.predict(&request(desert(), 4)).unwrap();
        assert!((july.confidence - april.confidence - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_tiny_corpus_is_rejected() {
        let mut config = tiny_config();
        config.corpus_size = 1;
        assert!(matches!(
            RegressionModel::train(&config, 2025),
            Err(ModelFailure::Computation(_))
        ));
    }

    #[test]
    fn test_closed_form_variant() {
        let model = RegressionModel::closed_form();
        let out = model.predict(&request(desert(), 7)).unwrap();
        assert_eq!(out.method.as_deref(), Some("closed_form"));
        assert!(out.predictions.extreme_heat > 20.0);
        assert_eq!(out.predictions.extreme_cold, 0.0);
    }

    #[test]
    fn test_non_finite_input_triggers_fallback() {
        let model = RegressionModel::closed_form();
        // ln(1 + P) is NaN below -1
        let obs = desert().with_precipitation(-5.0);
        let run = model.run(&request(obs, 7));
        assert!(!run.succeeded());
        assert_eq!(run.output.predictions, RiskPrediction::new(25.0, 15.0, 30.0, 20.0, 35.0));
        assert_eq!(run.output.confidence, 50.0);
    }

    #[test]
    fn test_holdout_metrics() {
        let m = HoldoutMetrics::evaluate(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.r2, 1.0);
        let m = HoldoutMetrics::evaluate(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        assert!((m.r2).abs() < 1e-12);
    }
}
