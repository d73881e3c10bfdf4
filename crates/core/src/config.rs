//! Ensemble configuration
//!
//! [`EnsembleConfig`] is built once, validated, and passed by reference to
//! [`crate::EnsembleCoordinator::new`]. Every field has a default so a
//! partial JSON document deserialises into a complete configuration.
//!
//! # Presets
//!
//! - [`EnsembleConfig::default`]: full-size regression training
//! - [`EnsembleConfig::compact`]: small corpus and forests, for tests and demos
//! - [`EnsembleConfig::without`]: drop one model from any configuration

use crate::error::ConfigError;
use crate::models::horizon::Horizon;
use crate::models::ModelKind;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-model base weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelWeights {
    /// Statistical model
    pub statistical: f64,
    /// Physics model
    pub physics: f64,
    /// Regression model
    pub regression: f64,
    /// Horizon model
    pub horizon: f64,
}

impl Default for ModelWeights {
    fn default() -> Self {
        Self {
            statistical: 0.15,
            physics: 0.25,
            regression: 0.25,
            horizon: 0.35,
        }
    }
}

impl ModelWeights {
    /// Documented redistribution when the regression model is absent
    pub const REGRESSION_ABSENT: ModelWeights = ModelWeights {
        statistical: 0.25,
        physics: 0.30,
        regression: 0.0,
        horizon: 0.45,
    };

    /// Weight for one model
    pub fn get(&self, kind: ModelKind) -> f64 {
        match kind {
            ModelKind::Statistical => self.statistical,
            ModelKind::Physics => self.physics,
            ModelKind::Regression => self.regression,
            ModelKind::Horizon => self.horizon,
        }
    }
}

/// Blend of the five composite confidence components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceBlend {
    /// Mean model confidence
    pub data_quality: f64,
    /// Cross-model agreement
    pub statistical: f64,
    /// Share of confident models
    pub model_reliability: f64,
    /// Cross-horizon consistency
    pub temporal_consistency: f64,
    /// Innovation boost
    pub innovation: f64,
}

impl Default for ConfidenceBlend {
    fn default() -> Self {
        Self {
            data_quality: 0.30,
            statistical: 0.25,
            model_reliability: 0.20,
            temporal_consistency: 0.15,
            innovation: 0.10,
        }
    }
}

/// Confidence cutoffs for the uncertainty label (strictly greater than)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UncertaintyCutoffs {
    /// Above this the label is LOW
    pub low_above: f64,
    /// Above this the label is MODERATE
    pub moderate_above: f64,
}

impl Default for UncertaintyCutoffs {
    fn default() -> Self {
        Self {
            low_above: 80.0,
            moderate_above: 60.0,
        }
    }
}

/// Regression variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionBackend {
    /// Forest + boosted trees trained on the synthetic corpus
    #[default]
    TreeEnsemble,
    /// Closed-form formulas, no training
    ClosedForm,
}

/// Bagged forest hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees
    pub n_trees: usize,
    /// Maximum depth
    pub max_depth: usize,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 12,
            min_samples_split: 5,
        }
    }
}

/// Gradient-boosting hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    /// Number of boosting rounds
    pub n_rounds: usize,
    /// Depth of each round's tree
    pub max_depth: usize,
    /// Shrinkage per round
    pub learning_rate: f64,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            max_depth: 5,
            learning_rate: 0.1,
            min_samples_split: 5,
        }
    }
}

/// Regression model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Which variant to build
    pub backend: RegressionBackend,
    /// Corpus generator seed
    pub seed: u64,
    /// Number of synthetic samples
    pub corpus_size: usize,
    /// Hold-out share for evaluation
    pub test_fraction: f64,
    /// Histogram bins per feature for split search
    pub n_bins: usize,
    /// Forest settings
    pub forest: ForestParams,
    /// Boosting settings
    pub boosting: BoostingParams,
    /// Share of the forest in the blended prediction; boosting gets the rest
    pub forest_share: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            backend: RegressionBackend::TreeEnsemble,
            seed: 42,
            corpus_size: 6000,
            test_fraction: 0.2,
            n_bins: 32,
            forest: ForestParams::default(),
            boosting: BoostingParams::default(),
            forest_share: 0.6,
        }
    }
}

impl RegressionConfig {
    /// Small corpus and ensembles; trains in a fraction of the time
    #[must_use]
    pub fn compact() -> Self {
        Self {
            corpus_size: 1500,
            forest: ForestParams {
                n_trees: 16,
                max_depth: 8,
                min_samples_split: 5,
            },
            boosting: BoostingParams {
                n_rounds: 30,
                max_depth: 4,
                learning_rate: 0.2,
                min_samples_split: 5,
            },
            ..Self::default()
        }
    }
}

/// Horizon model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    /// Horizons the meta-ensemble combines
    pub horizons: BTreeSet<Horizon>,
    /// Seed for layer weights and the seasonal jitter
    pub seed: u64,
    /// Width of each dilated layer
    pub hidden_width: usize,
    /// Scale of the bounded residual on the short-term prior logits
    pub residual_scale: f64,
    /// Dominant Fourier components kept in the seasonal reconstruction
    pub seasonal_components: usize,
    /// Days after the target date the seasonal risks look at
    pub seasonal_window_days: usize,
    /// Standard deviation of the fixed seasonal jitter (°C)
    pub seasonal_jitter: f64,
    /// Lorenz integration steps
    pub lorenz_steps: usize,
    /// Lorenz step size
    pub lorenz_dt: f64,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            horizons: Horizon::ALL.into_iter().collect(),
            seed: 7,
            hidden_width: 16,
            residual_scale: 0.5,
            seasonal_components: 5,
            seasonal_window_days: 90,
            seasonal_jitter: 0.8,
            lorenz_steps: 730,
            lorenz_dt: 0.01,
        }
    }
}

/// Complete ensemble configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Models to build and run
    pub models: BTreeSet<ModelKind>,
    /// Base weights with every model present
    pub base_weights: ModelWeights,
    /// Base weights used when exactly the regression model is absent
    pub regression_absent_weights: ModelWeights,
    /// Adaptive-weight multiplier for the horizon model
    pub horizon_innovation_bonus: f64,
    /// Adaptive-weight multiplier for outputs carrying a detail record
    pub detail_bonus: f64,
    /// Composite confidence blend
    pub confidence_blend: ConfidenceBlend,
    /// Models above this confidence count as reliable
    pub reliable_confidence: f64,
    /// Temporal consistency used when no horizon output is available
    pub default_temporal_consistency: f64,
    /// Cap on the innovation boost
    pub innovation_boost_cap: f64,
    /// Uncertainty label cutoffs
    pub uncertainty: UncertaintyCutoffs,
    /// Current year; target years before it are historical
    pub reference_year: i32,
    /// Regression model settings
    pub regression: RegressionConfig,
    /// Horizon model settings
    pub horizon: HorizonConfig,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            models: ModelKind::ALL.into_iter().collect(),
            base_weights: ModelWeights::default(),
            regression_absent_weights: ModelWeights::REGRESSION_ABSENT,
            horizon_innovation_bonus: 1.2,
            detail_bonus: 1.1,
            confidence_blend: ConfidenceBlend::default(),
            reliable_confidence: 60.0,
            default_temporal_consistency: 85.0,
            innovation_boost_cap: 15.0,
            uncertainty: UncertaintyCutoffs::default(),
            reference_year: chrono::Utc::now().year(),
            regression: RegressionConfig::default(),
            horizon: HorizonConfig::default(),
        }
    }
}

impl EnsembleConfig {
    /// Default configuration with a compact regression corpus
    #[must_use]
    pub fn compact() -> Self {
        Self {
            regression: RegressionConfig::compact(),
            ..Self::default()
        }
    }

    /// Same configuration with one model disabled
    #[must_use]
    pub fn without(mut self, kind: ModelKind) -> Self {
        self.models.remove(&kind);
        self
    }

    /// Override the reference year
    #[must_use]
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    /// `true` when `kind` is enabled
    pub fn is_enabled(&self, kind: ModelKind) -> bool {
        self.models.contains(&kind)
    }

    /// Base weight per enabled model, summing to 1
    ///
    /// All four enabled: `base_weights`. Exactly regression missing:
    /// `regression_absent_weights`. Any other subset: `base_weights`
    /// renormalised over the enabled models.
    pub fn effective_base_weights(&self) -> BTreeMap<ModelKind, f64> {
        let regression_only_absent = !self.is_enabled(ModelKind::Regression)
            && ModelKind::ALL
                .iter()
                .filter(|k| **k != ModelKind::Regression)
                .all(|k| self.is_enabled(*k));
        let table = if regression_only_absent {
            &self.regression_absent_weights
        } else {
            &self.base_weights
        };

        let total: f64 = self.models.iter().map(|k| table.get(*k)).sum();
        self.models
            .iter()
            .map(|k| {
                let w = if total > 0.0 {
                    table.get(*k) / total
                } else {
                    1.0 / self.models.len() as f64
                };
                (*k, w)
            })
            .collect()
    }

    /// Check weights, sizes and fractions
    ///
    /// # Errors
    ///
    /// [`ConfigError`] describing the first invalid setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::EmptyModelSet);
        }

        for kind in ModelKind::ALL {
            check_weight(&format!("base_weights.{kind}"), self.base_weights.get(kind))?;
            check_weight(
                &format!("regression_absent_weights.{kind}"),
                self.regression_absent_weights.get(kind),
            )?;
        }
        check_weight("horizon_innovation_bonus", self.horizon_innovation_bonus)?;
        check_weight("detail_bonus", self.detail_bonus)?;
        let blend = &self.confidence_blend;
        for (name, value) in [
            ("confidence_blend.data_quality", blend.data_quality),
            ("confidence_blend.statistical", blend.statistical),
            ("confidence_blend.model_reliability", blend.model_reliability),
            ("confidence_blend.temporal_consistency", blend.temporal_consistency),
            ("confidence_blend.innovation", blend.innovation),
            ("innovation_boost_cap", self.innovation_boost_cap),
        ] {
            check_weight(name, value)?;
        }
        if !(0.0..=1.0).contains(&self.regression.forest_share) {
            return Err(ConfigError::InvalidWeight {
                name: "regression.forest_share".to_string(),
                value: self.regression.forest_share,
            });
        }

        let r = &self.regression;
        let h = &self.horizon;
        for (name, value) in [
            ("regression.corpus_size", r.corpus_size),
            ("regression.n_bins", r.n_bins),
            ("regression.forest.n_trees", r.forest.n_trees),
            ("regression.forest.max_depth", r.forest.max_depth),
            ("regression.boosting.n_rounds", r.boosting.n_rounds),
            ("regression.boosting.max_depth", r.boosting.max_depth),
            ("horizon.horizons", h.horizons.len()),
            ("horizon.hidden_width", h.hidden_width),
            ("horizon.seasonal_components", h.seasonal_components),
            ("horizon.seasonal_window_days", h.seasonal_window_days),
            ("horizon.lorenz_steps", h.lorenz_steps),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroParameter(name));
            }
        }

        for (name, value) in [
            ("regression.test_fraction", r.test_fraction),
            ("regression.boosting.learning_rate", r.boosting.learning_rate),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::InvalidFraction { name, value });
            }
        }
        if !(h.lorenz_dt > 0.0 && h.lorenz_dt.is_finite()) {
            return Err(ConfigError::InvalidFraction {
                name: "horizon.lorenz_dt",
                value: h.lorenz_dt,
            });
        }
        Ok(())
    }
}

fn check_weight(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight {
            name: name.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_valid() {
        assert!(EnsembleConfig::default().validate().is_ok());
        assert!(EnsembleConfig::compact().validate().is_ok());
    }

    #[test]
    fn test_full_set_uses_base_weights() {
        let w = EnsembleConfig::default().effective_base_weights();
        assert_relative_eq!(w[&ModelKind::Horizon], 0.35, epsilon = 1e-12);
        assert_relative_eq!(w[&ModelKind::Statistical], 0.15, epsilon = 1e-12);
        assert_relative_eq!(w.values().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_regression_absent_table() {
        let w = EnsembleConfig::default()
            .without(ModelKind::Regression)
            .effective_base_weights();
        assert_eq!(w.len(), 3);
        assert_relative_eq!(w[&ModelKind::Physics], 0.30, epsilon = 1e-12);
        assert_relative_eq!(w[&ModelKind::Statistical], 0.25, epsilon = 1e-12);
        assert_relative_eq!(w[&ModelKind::Horizon], 0.45, epsilon = 1e-12);
    }

    #[test]
    fn test_other_subsets_renormalise() {
        let w = EnsembleConfig::default()
            .without(ModelKind::Horizon)
            .effective_base_weights();
        assert_relative_eq!(w[&ModelKind::Physics], 0.25 / 0.65, epsilon = 1e-12);
        assert_relative_eq!(w.values().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = EnsembleConfig::default();
        for kind in ModelKind::ALL {
            config = config.without(kind);
        }
        assert_eq!(config.validate(), Err(ConfigError::EmptyModelSet));

        let mut config = EnsembleConfig::default();
        config.base_weights.physics = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWeight { .. })));

        let mut config = EnsembleConfig::default();
        config.regression.forest.n_trees = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroParameter("regression.forest.n_trees"))
        );

        let mut config = EnsembleConfig::default();
        config.regression.test_fraction = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFraction { .. })));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{"models": ["physics", "statistical"], "reference_year": 2024,
                       "regression": {"backend": "closed_form"}}"#;
        let config: EnsembleConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.reference_year, 2024);
        assert_eq!(config.regression.backend, RegressionBackend::ClosedForm);
        assert_eq!(config.regression.corpus_size, 6000);
        assert_relative_eq!(config.detail_bonus, 1.1);
    }
}
