//! Composite confidence
//!
//! Five components, each on a 0-100 scale, are blended into the overall
//! confidence:
//!
//! | Component | Source |
//! |-----------|--------|
//! | data quality | mean model confidence |
//! | statistical | mean over categories of `max(0, 100 - variance)` across models |
//! | model reliability | share of models above the reliable confidence |
//! | temporal consistency | horizon meta-ensemble, or a default |
//! | innovation boost | horizon innovation score / 10, capped |

use super::horizon_detail;
use crate::config::EnsembleConfig;
use crate::core_types::{RiskCategory, UncertaintyLevel};
use crate::error::EnsembleFailure;
use crate::models::{ModelKind, ModelOutput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Statistical confidence when fewer than two models contributed
pub const SINGLE_MODEL_AGREEMENT: f64 = 80.0;

/// Composite confidence scores for one result
///
/// Field names are a fixed wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    /// Mean model confidence
    pub data_quality_score: f64,
    /// Cross-model agreement
    pub statistical_confidence: f64,
    /// Percentage of confident models
    pub model_reliability: f64,
    /// Cross-horizon consistency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_consistency: Option<f64>,
    /// Ten times the innovation boost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innovation_confidence: Option<f64>,
    /// Blended confidence (0-100)
    pub overall_confidence: f64,
    /// Label for `overall_confidence`
    pub uncertainty_level: UncertaintyLevel,
}

impl ConfidenceMetrics {
    /// Fixed metrics of the global fallback
    pub fn fallback() -> Self {
        Self {
            data_quality_score: 60.0,
            statistical_confidence: 50.0,
            model_reliability: 40.0,
            temporal_consistency: None,
            innovation_confidence: None,
            overall_confidence: 50.0,
            uncertainty_level: UncertaintyLevel::High,
        }
    }
}

fn population_variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Mean over categories of `max(0, 100 - variance)` of the model predictions
///
/// The spread is in squared percentage points, so a 10-point gap between
/// two models already costs 25.
pub fn statistical_confidence(outputs: &BTreeMap<ModelKind, ModelOutput>) -> f64 {
    if outputs.len() < 2 {
        return SINGLE_MODEL_AGREEMENT;
    }
    let per_category: Vec<f64> = RiskCategory::ALL
        .iter()
        .filter_map(|c| {
            let values: Vec<f64> = outputs
                .values()
                .map(|o| o.predictions.get(*c))
                .filter(|v| v.is_finite())
                .collect();
            (!values.is_empty()).then(|| (100.0 - population_variance(&values)).max(0.0))
        })
        .collect();
    if per_category.is_empty() {
        return 0.0;
    }
    per_category.iter().sum::<f64>() / per_category.len() as f64
}

/// Score the model outputs
///
/// # Arguments
///
/// * `outputs` - Every output that entered fusion, fallbacks included
/// * `config` - Blend weights, reliability threshold and cutoffs
///
/// # Errors
///
/// [`EnsembleFailure::NoSuccessfulModel`] for an empty map, or
/// [`EnsembleFailure::NonFiniteConfidence`] naming the first component
/// that is not finite
pub fn confidence_metrics(
    outputs: &BTreeMap<ModelKind, ModelOutput>,
    config: &EnsembleConfig,
) -> Result<ConfidenceMetrics, EnsembleFailure> {
    if outputs.is_empty() {
        return Err(EnsembleFailure::NoSuccessfulModel);
    }
    let n = outputs.len() as f64;

    let data_quality_score = outputs.values().map(|o| o.confidence).sum::<f64>() / n;
    let statistical_confidence = statistical_confidence(outputs);
    let reliable = outputs
        .values()
        .filter(|o| o.confidence > config.reliable_confidence)
        .count();
    let model_reliability = reliable as f64 / n * 100.0;

    let horizon = horizon_detail(outputs);
    let temporal_consistency = horizon.map_or(config.default_temporal_consistency, |d| d.temporal_consistency);
    let boost = horizon.map_or(0.0, |d| (d.innovation_score / 10.0).min(config.innovation_boost_cap));

    let blend = &config.confidence_blend;
    let overall_confidence = (blend.data_quality * data_quality_score
        + blend.statistical * statistical_confidence
        + blend.model_reliability * model_reliability
        + blend.temporal_consistency * temporal_consistency
        + blend.innovation * boost)
        .clamp(0.0, 100.0);

    for (name, value) in [
        ("data_quality_score", data_quality_score),
        ("statistical_confidence", statistical_confidence),
        ("temporal_consistency", temporal_consistency),
        ("innovation_confidence", boost),
        ("overall_confidence", overall_confidence),
    ] {
        if !value.is_finite() {
            return Err(EnsembleFailure::NonFiniteConfidence(name));
        }
    }

    Ok(ConfidenceMetrics {
        data_quality_score,
        statistical_confidence,
        model_reliability,
        temporal_consistency: Some(temporal_consistency),
        innovation_confidence: Some(10.0 * boost),
        overall_confidence,
        uncertainty_level: UncertaintyLevel::from_confidence(
            overall_confidence,
            config.uncertainty.low_above,
            config.uncertainty.moderate_above,
        ),
    })
}
