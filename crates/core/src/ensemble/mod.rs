//! Ensemble fusion
//!
//! The [`EnsembleCoordinator`] runs every enabled model concurrently,
//! blends their per-category outputs with adaptive weights and scores the
//! blend. Each step lives in its own module:
//!
//! - [`fusion`]: adaptive weights and the weighted blend
//! - [`confidence`]: composite confidence metrics
//! - [`analysis`]: temporal analysis and innovation metrics
//! - [`summary`]: deterministic narrative text
//! - [`coordinator`]: orchestration and the global fallback
//!
//! No error escapes [`EnsembleCoordinator::predict`]; when fusion cannot
//! complete the fixed [`EnsembleResult::fallback`] is returned.

pub mod analysis;
pub mod confidence;
pub mod coordinator;
pub mod fusion;
pub mod summary;

pub use analysis::{InnovationMetrics, TemporalAnalysis};
pub use confidence::ConfidenceMetrics;
pub use coordinator::EnsembleCoordinator;
pub use fusion::{AdaptiveWeights, Fusion};

use crate::core_types::{RiskPrediction, TargetDate, UncertaintyLevel};
use crate::models::horizon::HorizonDetail;
use crate::models::{ModelDetail, ModelKind, ModelOutput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Method tag of a normal ensemble result
pub const ENSEMBLE_METHOD: &str = "Multi-Horizon Adaptive Ensemble";

/// Method tag of the global fallback
pub const FALLBACK_METHOD: &str = "Fallback Mode";

/// Summary text of the global fallback
pub const FALLBACK_SUMMARY: &str = "Using fallback predictions due to ensemble system error.";

/// Fixed predictions of the global fallback
pub const FALLBACK_PREDICTIONS: RiskPrediction = RiskPrediction {
    extreme_heat: 30.0,
    extreme_cold: 20.0,
    heavy_precipitation: 35.0,
    strong_winds: 25.0,
    heat_discomfort: 40.0,
};

/// Detail record of the horizon output, if it ran without falling back
pub(crate) fn horizon_detail(outputs: &BTreeMap<ModelKind, ModelOutput>) -> Option<&HorizonDetail> {
    match outputs.get(&ModelKind::Horizon)?.detail.as_ref()? {
        ModelDetail::Horizon(detail) => Some(&**detail),
        _ => None,
    }
}

/// Fused result for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    /// Fused probability per category (0-100)
    pub predictions: RiskPrediction,
    /// Composite confidence scores
    pub confidence_metrics: ConfidenceMetrics,
    /// Each model's output, ordered by model
    pub model_breakdown: BTreeMap<ModelKind, ModelOutput>,
    /// Normalised weight per category per model
    pub adaptive_weights: AdaptiveWeights,
    /// Per-horizon reliability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_analysis: Option<TemporalAnalysis>,
    /// Methods and algorithms that contributed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innovation_metrics: Option<InnovationMetrics>,
    /// How the result was produced
    pub ensemble_method: String,
    /// Date the estimate is for, after any substitution
    pub date: TargetDate,
    /// Year the estimate is for
    pub target_year: i32,
    /// Narrative summary
    pub summary: String,
}

impl EnsembleResult {
    /// Fixed result returned when fusion cannot complete
    pub fn fallback(date: TargetDate, target_year: i32) -> Self {
        Self {
            predictions: FALLBACK_PREDICTIONS,
            confidence_metrics: ConfidenceMetrics::fallback(),
            model_breakdown: BTreeMap::new(),
            adaptive_weights: AdaptiveWeights::new(),
            temporal_analysis: None,
            innovation_metrics: None,
            ensemble_method: FALLBACK_METHOD.to_string(),
            date,
            target_year,
            summary: FALLBACK_SUMMARY.to_string(),
        }
    }

    /// `true` for the global fallback
    pub fn is_fallback(&self) -> bool {
        self.ensemble_method == FALLBACK_METHOD
    }

    /// Uncertainty label of the overall confidence
    pub fn uncertainty(&self) -> UncertaintyLevel {
        self.confidence_metrics.uncertainty_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_result() {
        let result = EnsembleResult::fallback(TargetDate::MID_JULY, 2025);
        assert!(result.is_fallback());
        assert_eq!(result.predictions, RiskPrediction::new(30.0, 20.0, 35.0, 25.0, 40.0));
        assert_eq!(result.uncertainty(), UncertaintyLevel::High);
        assert!(result.model_breakdown.is_empty());
        assert!(result.adaptive_weights.is_empty());
        assert_eq!(result.summary, FALLBACK_SUMMARY);
    }

    #[test]
    fn test_fallback_wire_shape() {
        let json = serde_json::to_value(EnsembleResult::fallback(TargetDate::MID_JULY, 2025)).unwrap();
        assert_eq!(json["ensemble_method"], "Fallback Mode");
        assert_eq!(json["date"], "07-15");
        assert_eq!(json["predictions"]["heat_discomfort"], 40.0);
        assert_eq!(json["confidence_metrics"]["uncertainty_level"], "HIGH");
        assert!(json["confidence_metrics"].get("temporal_consistency").is_none());
        assert!(json.get("temporal_analysis").is_none());
    }
}
