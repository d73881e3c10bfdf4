//! Meta-ensemble over horizons
//!
//! Combines whichever horizons ran into one prediction, and scores how well
//! they agree with each other.

use super::Horizon;
use crate::core_types::{RiskCategory, RiskPrediction, UncertaintyLevel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Agreement reported when fewer than two horizons ran
pub const SINGLE_HORIZON_AGREEMENT: f64 = 70.0;

/// Starting temporal consistency
pub const BASE_TEMPORAL_CONSISTENCY: f64 = 80.0;

/// Short/climate disagreement that costs consistency (percentage points)
pub const INCONSISTENCY_GAP: f64 = 50.0;

/// Consistency lost per inconsistent category
pub const INCONSISTENCY_PENALTY: f64 = 10.0;

/// Overall confidence above which uncertainty is LOW
pub const LOW_UNCERTAINTY_ABOVE: f64 = 75.0;

/// Overall confidence above which uncertainty is MODERATE
pub const MODERATE_UNCERTAINTY_ABOVE: f64 = 50.0;

/// Innovation points per horizon run
pub const POINTS_PER_HORIZON: f64 = 5.0;

/// Heuristic family a horizon exercises, scored for the innovation metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicFamily {
    /// Stacked non-linear layers
    LayeredActivation,
    /// Attention pooling
    Attention,
    /// Frequency-domain analysis
    Spectral,
    /// Integrated dynamical system
    DynamicalSystem,
    /// Combining horizons
    MetaEnsemble,
}

impl HeuristicFamily {
    /// Innovation points awarded once per family
    pub fn points(self) -> f64 {
        match self {
            HeuristicFamily::LayeredActivation => 25.0,
            HeuristicFamily::Attention | HeuristicFamily::Spectral => 20.0,
            HeuristicFamily::DynamicalSystem => 30.0,
            HeuristicFamily::MetaEnsemble => 15.0,
        }
    }
}

/// One horizon's risks and confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonPrediction {
    /// Risk per category (0-100)
    pub predictions: RiskPrediction,
    /// Horizon confidence (0-100)
    pub confidence: f64,
}

/// Combined horizons
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetaEnsemble {
    /// Confidence-weighted risks
    pub predictions: RiskPrediction,
    /// Mean horizon confidence
    pub overall_confidence: f64,
    /// Mean over categories of `max(0, 100 - std)` across horizons
    pub ensemble_agreement: f64,
    /// Short-term vs climate consistency
    pub temporal_consistency: f64,
    /// Label for `overall_confidence`
    pub uncertainty_level: UncertaintyLevel,
}

fn population_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Confidence-weighted combination; `None` when no horizon ran
///
/// Falls back to a plain mean when the confidences sum to zero or less, or
/// are not finite.
pub fn combine(horizons: &BTreeMap<Horizon, HorizonPrediction>) -> Option<MetaEnsemble> {
    if horizons.is_empty() {
        return None;
    }
    let n = horizons.len() as f64;
    let total: f64 = horizons.values().map(|h| h.confidence).sum();
    let weight = |h: &HorizonPrediction| {
        if total > 0.0 && total.is_finite() {
            h.confidence / total
        } else {
            1.0 / n
        }
    };

    let mut predictions = RiskPrediction::default();
    for category in RiskCategory::ALL {
        let value = horizons.values().map(|h| weight(h) * h.predictions.get(category)).sum();
        predictions.set(category, value);
    }
    let overall_confidence = total / n;

    Some(MetaEnsemble {
        predictions,
        overall_confidence,
        ensemble_agreement: ensemble_agreement(horizons),
        temporal_consistency: temporal_consistency(horizons),
        uncertainty_level: UncertaintyLevel::from_confidence(
            overall_confidence,
            LOW_UNCERTAINTY_ABOVE,
            MODERATE_UNCERTAINTY_ABOVE,
        ),
    })
}

/// Mean over categories of `max(0, 100 - std)` across horizons
pub fn ensemble_agreement(horizons: &BTreeMap<Horizon, HorizonPrediction>) -> f64 {
    if horizons.len() < 2 {
        return SINGLE_HORIZON_AGREEMENT;
    }
    let per_category: Vec<f64> = RiskCategory::ALL
        .iter()
        .map(|c| {
            let values: Vec<f64> = horizons.values().map(|h| h.predictions.get(*c)).collect();
            (100.0 - population_std(&values)).max(0.0)
        })
        .collect();
    per_category.iter().sum::<f64>() / per_category.len() as f64
}

/// [`BASE_TEMPORAL_CONSISTENCY`] less a penalty per category where the
/// short-term and climate horizons differ by more than [`INCONSISTENCY_GAP`]
pub fn temporal_consistency(horizons: &BTreeMap<Horizon, HorizonPrediction>) -> f64 {
    let (Some(short), Some(climate)) = (horizons.get(&Horizon::ShortTerm), horizons.get(&Horizon::Climate)) else {
        return BASE_TEMPORAL_CONSISTENCY;
    };
    let inconsistent = RiskCategory::ALL
        .iter()
        .filter(|c| (short.predictions.get(**c) - climate.predictions.get(**c)).abs() > INCONSISTENCY_GAP)
        .count();
    (BASE_TEMPORAL_CONSISTENCY - INCONSISTENCY_PENALTY * inconsistent as f64).clamp(0.0, 100.0)
}

/// Points per heuristic family exercised plus [`POINTS_PER_HORIZON`], capped at 100
pub fn innovation_score(horizons: &BTreeSet<Horizon>) -> f64 {
    if horizons.is_empty() {
        return 0.0;
    }
    let mut families: BTreeSet<HeuristicFamily> = horizons.iter().flat_map(|h| h.families().iter().copied()).collect();
    families.insert(HeuristicFamily::MetaEnsemble);
    let points: f64 = families.iter().map(|f| f.points()).sum();
    (points + POINTS_PER_HORIZON * horizons.len() as f64).min(100.0)
}
