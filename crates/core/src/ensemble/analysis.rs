//! Temporal analysis and innovation metrics
//!
//! Both sections are informational. They are derived from the model
//! breakdown after fusion and never feed back into the fused predictions.

use super::horizon_detail;
use crate::models::horizon::Horizon;
use crate::models::{ModelKind, ModelOutput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Defaults used when the horizon model did not contribute a detail record
pub mod defaults {
    /// Short-term reliability
    pub const SHORT_TERM_RELIABILITY: f64 = 85.0;
    /// Seasonal reliability
    pub const SEASONAL_RELIABILITY: f64 = 75.0;
    /// Climate reliability
    pub const CLIMATE_RELIABILITY: f64 = 60.0;
    /// Cross-horizon consistency
    pub const CROSS_HORIZON_CONSISTENCY: f64 = 80.0;
}

/// Order in which models are listed in the innovation metrics
const LISTING_ORDER: [ModelKind; 4] = [
    ModelKind::Horizon,
    ModelKind::Physics,
    ModelKind::Regression,
    ModelKind::Statistical,
];

/// Points per methodology in the composite innovation score
const POINTS_PER_METHODOLOGY: f64 = 20.0;
/// Points per algorithm, and their cap
const POINTS_PER_ALGORITHM: (f64, f64) = (3.0, 30.0);
/// Points per temporal horizon, and their cap
const POINTS_PER_HORIZON: (f64, f64) = (5.0, 20.0);

/// Reliability per horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalAnalysis {
    /// Short-term horizon confidence
    pub short_term_reliability: f64,
    /// Seasonal horizon confidence
    pub seasonal_reliability: f64,
    /// Climate horizon confidence
    pub climate_reliability: f64,
    /// Short-term vs climate consistency
    pub cross_horizon_consistency: f64,
}

impl Default for TemporalAnalysis {
    fn default() -> Self {
        Self {
            short_term_reliability: defaults::SHORT_TERM_RELIABILITY,
            seasonal_reliability: defaults::SEASONAL_RELIABILITY,
            climate_reliability: defaults::CLIMATE_RELIABILITY,
            cross_horizon_consistency: defaults::CROSS_HORIZON_CONSISTENCY,
        }
    }
}

/// Methods, algorithms and horizons that went into a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnovationMetrics {
    /// Methodology label per contributing model
    pub methodologies_used: Vec<String>,
    /// Named algorithms across the contributing models
    pub advanced_algorithms: Vec<String>,
    /// Prediction techniques across the contributing models
    pub prediction_techniques: Vec<String>,
    /// Number of time-scales covered
    pub temporal_horizons: usize,
    /// Horizon innovation score, or the composite score (0-100)
    pub innovation_score: f64,
}

/// Temporal analysis from the horizon detail, defaults where a horizon is missing
pub fn temporal_analysis(outputs: &BTreeMap<ModelKind, ModelOutput>) -> TemporalAnalysis {
    let mut analysis = TemporalAnalysis::default();
    if let Some(detail) = horizon_detail(outputs) {
        if let Some(r) = detail.reliability(Horizon::ShortTerm) {
            analysis.short_term_reliability = r;
        }
        if let Some(r) = detail.reliability(Horizon::Seasonal) {
            analysis.seasonal_reliability = r;
        }
        if let Some(r) = detail.reliability(Horizon::Climate) {
            analysis.climate_reliability = r;
        }
        analysis.cross_horizon_consistency = detail.temporal_consistency;
    }
    analysis
}

/// `20·methodologies + min(30, 3·algorithms) + min(20, 5·horizons)`, capped at 100
pub fn composite_innovation_score(methodologies: usize, algorithms: usize, horizons: usize) -> f64 {
    let base = POINTS_PER_METHODOLOGY * methodologies as f64;
    let algorithm = (POINTS_PER_ALGORITHM.0 * algorithms as f64).min(POINTS_PER_ALGORITHM.1);
    let horizon = (POINTS_PER_HORIZON.0 * horizons as f64).min(POINTS_PER_HORIZON.1);
    (base + algorithm + horizon).min(100.0)
}

/// Innovation metrics for the models present in `outputs`
pub fn innovation_metrics(outputs: &BTreeMap<ModelKind, ModelOutput>) -> InnovationMetrics {
    let mut methodologies_used = Vec::new();
    let mut advanced_algorithms = Vec::new();
    let mut prediction_techniques = Vec::new();
    for kind in LISTING_ORDER.iter().filter(|k| outputs.contains_key(*k)) {
        methodologies_used.push(kind.methodology().to_string());
        advanced_algorithms.extend(kind.algorithms().iter().map(|a| (*a).to_string()));
        prediction_techniques.extend(kind.techniques().iter().map(|t| (*t).to_string()));
    }

    let detail = horizon_detail(outputs);
    let temporal_horizons = detail.map_or(1, |d| d.horizon_count.max(1));
    let innovation_score = match detail {
        Some(d) if d.innovation_score > 0.0 => d.innovation_score,
        _ => composite_innovation_score(methodologies_used.len(), advanced_algorithms.len(), temporal_horizons),
    };

    InnovationMetrics {
        methodologies_used,
        advanced_algorithms,
        prediction_techniques,
        temporal_horizons,
        innovation_score,
    }
}
