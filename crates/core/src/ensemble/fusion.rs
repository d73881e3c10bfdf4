//! Adaptive weighting and the per-category blend
//!
//! For each category a model's adaptive weight is
//!
//! ```text
//! w = base × confidence / 100 × innovation bonus × detail bonus
//! ```
//!
//! where the innovation bonus applies to the horizon model only and the
//! detail bonus to outputs that carry a detail record (every output except
//! a fallback). Weights are renormalised over the models whose value for
//! that category is finite; if they sum to zero an unweighted mean is used.

use crate::config::EnsembleConfig;
use crate::core_types::units::clamp_percent;
use crate::core_types::{RiskCategory, RiskPrediction};
use crate::error::EnsembleFailure;
use crate::models::{ModelKind, ModelOutput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Normalised weight per category per model
pub type AdaptiveWeights = BTreeMap<RiskCategory, BTreeMap<ModelKind, f64>>;

/// Blended predictions and the weights that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fusion {
    /// Fused probability per category (0-100)
    pub predictions: RiskPrediction,
    /// Normalised weights; each category's weights sum to 1
    pub weights: AdaptiveWeights,
}

/// Un-normalised adaptive weight of one model
///
/// Non-finite or negative products count as zero.
pub fn adaptive_weight(config: &EnsembleConfig, kind: ModelKind, output: &ModelOutput, base: f64) -> f64 {
    let mut weight = base * output.confidence / 100.0;
    if kind == ModelKind::Horizon {
        weight *= config.horizon_innovation_bonus;
    }
    if output.detail.is_some() {
        weight *= config.detail_bonus;
    }
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Blend model outputs category by category
///
/// # Arguments
///
/// * `outputs` - One output per model that ran, fallbacks included
/// * `base_weights` - Base weight per model; missing models weigh zero
/// * `config` - Bonus multipliers
///
/// # Errors
///
/// - [`EnsembleFailure::NoSuccessfulModel`] when `outputs` is empty
/// - [`EnsembleFailure::NonFiniteFusion`] when no model has a finite value
///   for a category, or the blend itself is not finite
pub fn fuse(
    outputs: &BTreeMap<ModelKind, ModelOutput>,
    base_weights: &BTreeMap<ModelKind, f64>,
    config: &EnsembleConfig,
) -> Result<Fusion, EnsembleFailure> {
    if outputs.is_empty() {
        return Err(EnsembleFailure::NoSuccessfulModel);
    }

    let raw: BTreeMap<ModelKind, f64> = outputs
        .iter()
        .map(|(kind, output)| {
            let base = base_weights.get(kind).copied().unwrap_or(0.0);
            (*kind, adaptive_weight(config, *kind, output, base))
        })
        .collect();

    let mut predictions = RiskPrediction::default();
    let mut weights = AdaptiveWeights::new();
    for category in RiskCategory::ALL {
        let contributors: Vec<(ModelKind, f64)> = outputs
            .iter()
            .map(|(kind, output)| (*kind, output.predictions.get(category)))
            .filter(|(_, value)| value.is_finite())
            .collect();
        if contributors.is_empty() {
            return Err(EnsembleFailure::NonFiniteFusion(category));
        }

        let total: f64 = contributors.iter().map(|(kind, _)| raw[kind]).sum();
        let n = contributors.len() as f64;
        let normalised: BTreeMap<ModelKind, f64> = contributors
            .iter()
            .map(|(kind, _)| {
                let w = if total > 0.0 { raw[kind] / total } else { 1.0 / n };
                (*kind, w)
            })
            .collect();

        let value: f64 = contributors.iter().map(|(kind, v)| normalised[kind] * v).sum();
        if !value.is_finite() {
            return Err(EnsembleFailure::NonFiniteFusion(category));
        }
        debug!(category = %category, value, weights = ?normalised, "Fused category");
        predictions.set(category, clamp_percent(value));
        weights.insert(category, normalised);
    }

    Ok(Fusion { predictions, weights })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn output(kind: ModelKind, value: f64, confidence: f64) -> ModelOutput {
        ModelOutput::checked(kind, RiskPrediction::uniform(value), confidence, None, None).unwrap()
    }

    fn config() -> EnsembleConfig {
        EnsembleConfig::default().with_reference_year(2025)
    }

    #[test]
    fn test_confidence_scales_weight() {
        let outputs = BTreeMap::from([
            (ModelKind::Statistical, output(ModelKind::Statistical, 30.0, 40.0)),
            (ModelKind::Physics, output(ModelKind::Physics, 60.0, 80.0)),
        ]);
        let base = BTreeMap::from([(ModelKind::Statistical, 0.5), (ModelKind::Physics, 0.5)]);
        let fusion = fuse(&outputs, &base, &config()).unwrap();

        assert_relative_eq!(fusion.predictions.extreme_heat, 50.0, epsilon = 1e-9);
        let w = &fusion.weights[&RiskCategory::ExtremeHeat];
        assert_relative_eq!(w[&ModelKind::Physics], 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(w[&ModelKind::Statistical], 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_horizon_bonus() {
        let outputs = BTreeMap::from([
            (ModelKind::Physics, output(ModelKind::Physics, 0.0, 50.0)),
            (ModelKind::Horizon, output(ModelKind::Horizon, 100.0, 50.0)),
        ]);
        let base = BTreeMap::from([(ModelKind::Physics, 0.5), (ModelKind::Horizon, 0.5)]);
        let fusion = fuse(&outputs, &base, &config()).unwrap();
        // 0.25 vs 0.25 × 1.2
        assert_relative_eq!(fusion.predictions.strong_winds, 100.0 * 0.3 / 0.55, epsilon = 1e-9);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let outputs: BTreeMap<_, _> = ModelKind::ALL
            .iter()
            .enumerate()
            .map(|(i, kind)| (*kind, output(*kind, 10.0 * i as f64, 30.0 + 15.0 * i as f64)))
            .collect();
        let fusion = fuse(&outputs, &config().effective_base_weights(), &config()).unwrap();
        for category in RiskCategory::ALL {
            let sum: f64 = fusion.weights[&category].values().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_weights_use_plain_mean() {
        let outputs = BTreeMap::from([
            (ModelKind::Statistical, output(ModelKind::Statistical, 20.0, 0.0)),
            (ModelKind::Regression, output(ModelKind::Regression, 80.0, 0.0)),
        ]);
        let fusion = fuse(&outputs, &config().effective_base_weights(), &config()).unwrap();
        assert_relative_eq!(fusion.predictions.heavy_precipitation, 50.0);
        assert_relative_eq!(fusion.weights[&RiskCategory::HeavyPrecipitation][&ModelKind::Regression], 0.5);
    }

    #[test]
    fn test_non_finite_values_are_skipped() {
        let mut broken = output(ModelKind::Physics, 0.0, 90.0);
        broken.predictions.extreme_cold = f64::NAN;
        let outputs = BTreeMap::from([
            (ModelKind::Physics, broken),
            (ModelKind::Statistical, output(ModelKind::Statistical, 70.0, 60.0)),
        ]);
        let fusion = fuse(&outputs, &config().effective_base_weights(), &config()).unwrap();
        assert_relative_eq!(fusion.predictions.extreme_cold, 70.0);
        assert!(!fusion.weights[&RiskCategory::ExtremeCold].contains_key(&ModelKind::Physics));
        assert!(fusion.weights[&RiskCategory::ExtremeHeat].contains_key(&ModelKind::Physics));
    }

    #[test]
    fn test_failures() {
        let empty = BTreeMap::new();
        assert_eq!(
            fuse(&empty, &BTreeMap::new(), &config()),
            Err(EnsembleFailure::NoSuccessfulModel)
        );

        let mut broken = output(ModelKind::Physics, 0.0, 90.0);
        broken.predictions.strong_winds = f64::INFINITY;
        let outputs = BTreeMap::from([(ModelKind::Physics, broken)]);
        assert_eq!(
            fuse(&outputs, &config().effective_base_weights(), &config()),
            Err(EnsembleFailure::NonFiniteFusion(RiskCategory::StrongWinds))
        );
    }
}
