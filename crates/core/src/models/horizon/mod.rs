//! Multi-horizon heuristic model
//!
//! Three pipelines look at the same request on different time-scales:
//!
//! | Horizon | Pipeline | Span |
//! |---------|----------|------|
//! | [`Horizon::ShortTerm`] | Dilated layers + attention over prior logits | 1-14 days |
//! | [`Horizon::Seasonal`] | DFT of a synthetic annual cycle | 1-12 months |
//! | [`Horizon::Climate`] | Lorenz trajectory + warming offset | 1-10 years |
//!
//! A confidence-weighted meta-ensemble combines them. Every random quantity
//! (layer weights, seasonal jitter) is drawn once in [`HorizonModel::new`]
//! from the configured seed, so predictions are pure functions of the
//! request.

pub mod climate;
pub mod features;
pub mod meta;
pub mod seasonal;
pub mod short_term;

use self::climate::{ClimateModel, ClimateOutput};
use self::features::HorizonInputs;
use self::meta::{HeuristicFamily, HorizonPrediction};
use self::seasonal::{SeasonalModel, SeasonalOutput};
use self::short_term::{ShortTermNetwork, ShortTermOutput};
use super::{ModelAdapter, ModelDetail, ModelKind, ModelOutput, PredictionRequest};
use crate::config::HorizonConfig;
use crate::core_types::{RiskPrediction, UncertaintyLevel};
use crate::error::{ModelFailure, ModelResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

/// Forecast time-scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    /// Days ahead
    ShortTerm,
    /// Months ahead
    Seasonal,
    /// Years ahead
    Climate,
}

impl Horizon {
    /// Every horizon, shortest first
    pub const ALL: [Horizon; 3] = [Horizon::ShortTerm, Horizon::Seasonal, Horizon::Climate];

    /// Wire name
    pub fn name(self) -> &'static str {
        match self {
            Horizon::ShortTerm => "short_term",
            Horizon::Seasonal => "seasonal",
            Horizon::Climate => "climate",
        }
    }

    /// Human-readable span
    pub fn span(self) -> &'static str {
        match self {
            Horizon::ShortTerm => "1-14 days",
            Horizon::Seasonal => "1-12 months",
            Horizon::Climate => "1-10 years",
        }
    }

    /// Heuristic families the horizon's pipeline exercises
    pub fn families(self) -> &'static [HeuristicFamily] {
        match self {
            Horizon::ShortTerm => &[HeuristicFamily::LayeredActivation, HeuristicFamily::Attention],
            Horizon::Seasonal => &[HeuristicFamily::Spectral],
            Horizon::Climate => &[HeuristicFamily::DynamicalSystem],
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Horizon model diagnostics for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonDetail {
    /// Clamped risks and confidence per horizon that ran
    pub horizons: BTreeMap<Horizon, HorizonPrediction>,
    /// Mean horizon confidence
    pub overall_confidence: f64,
    /// Cross-horizon agreement (0-100)
    pub ensemble_agreement: f64,
    /// Short-term vs climate consistency (0-100)
    pub temporal_consistency: f64,
    /// Label for `overall_confidence`
    pub uncertainty_level: UncertaintyLevel,
    /// Heuristic-family score (0-100)
    pub innovation_score: f64,
    /// Number of horizons combined
    pub horizon_count: usize,
    /// Short-term pipeline internals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_term: Option<ShortTermOutput>,
    /// Seasonal pipeline internals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonal: Option<SeasonalOutput>,
    /// Climate pipeline internals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climate: Option<ClimateOutput>,
}

impl HorizonDetail {
    /// Confidence of one horizon, if it ran
    pub fn reliability(&self, horizon: Horizon) -> Option<f64> {
        self.horizons.get(&horizon).map(|h| h.confidence)
    }
}

/// Multi-horizon model with fixed, seeded parameters
#[derive(Debug, Clone)]
pub struct HorizonModel {
    horizons: BTreeSet<Horizon>,
    short_term: ShortTermNetwork,
    seasonal: SeasonalModel,
    climate: ClimateModel,
}

/// Reject non-finite sub-predictions, then clamp
fn checked_horizon(horizon: Horizon, predictions: RiskPrediction, confidence: f64) -> ModelResult<HorizonPrediction> {
    if let Some(category) = predictions.first_non_finite() {
        return Err(ModelFailure::non_finite(format!("{horizon} horizon {category}")));
    }
    if !confidence.is_finite() {
        return Err(ModelFailure::non_finite(format!("{horizon} horizon confidence")));
    }
    Ok(HorizonPrediction {
        predictions: predictions.clamped(),
        confidence: confidence.clamp(0.0, 100.0),
    })
}

impl HorizonModel {
    /// Draw all fixed parameters from `config.seed`
    pub fn new(config: &HorizonConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let short_term = ShortTermNetwork::new(&mut rng, config.hidden_width, config.residual_scale);
        let seasonal = SeasonalModel::new(
            &mut rng,
            config.seasonal_jitter,
            config.seasonal_components,
            config.seasonal_window_days,
        );
        info!(
            "Initialised horizon model: {} horizon(s), width {}, {} Lorenz steps",
            config.horizons.len(),
            config.hidden_width,
            config.lorenz_steps
        );
        Self {
            horizons: config.horizons.clone(),
            short_term,
            seasonal,
            climate: ClimateModel::new(config.lorenz_steps, config.lorenz_dt),
        }
    }

    /// Horizons this model runs
    pub fn horizons(&self) -> &BTreeSet<Horizon> {
        &self.horizons
    }
}

impl ModelAdapter for HorizonModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Horizon
    }

    fn predict(&self, request: &PredictionRequest) -> ModelResult<ModelOutput> {
        let inputs = HorizonInputs::from_request(request);
        let enrichment = &request.enrichment;
        let mut horizons = BTreeMap::new();
        let mut short_term = None;
        let mut seasonal = None;
        let mut climate = None;

        for horizon in &self.horizons {
            let prediction = match horizon {
                Horizon::ShortTerm => {
                    let out = self.short_term.predict(&inputs, enrichment.forecast.as_ref());
                    let p = checked_horizon(*horizon, out.predictions, out.confidence)?;
                    short_term = Some(out);
                    p
                }
                Horizon::Seasonal => {
                    let out = self.seasonal.predict(&inputs, enrichment.seasonal.as_ref());
                    let p = checked_horizon(*horizon, out.predictions, out.confidence)?;
                    seasonal = Some(out);
                    p
                }
                Horizon::Climate => {
                    let out = self.climate.predict(&inputs, enrichment);
                    let p = checked_horizon(*horizon, out.predictions, out.confidence)?;
                    climate = Some(out);
                    p
                }
            };
            debug!(
                horizon = %horizon,
                confidence = prediction.confidence,
                heat = prediction.predictions.extreme_heat,
                cold = prediction.predictions.extreme_cold,
                "Horizon prediction"
            );
            horizons.insert(*horizon, prediction);
        }

        let meta = meta::combine(&horizons)
            .ok_or_else(|| ModelFailure::Computation("no horizons configured".to_string()))?;
        let innovation_score = meta::innovation_score(&self.horizons);

        let detail = HorizonDetail {
            horizon_count: horizons.len(),
            horizons,
            overall_confidence: meta.overall_confidence,
            ensemble_agreement: meta.ensemble_agreement,
            temporal_consistency: meta.temporal_consistency,
            uncertainty_level: meta.uncertainty_level,
            innovation_score,
            short_term,
            seasonal,
            climate,
        };
        ModelOutput::checked(
            ModelKind::Horizon,
            meta.predictions,
            meta.overall_confidence,
            Some("multi_horizon_meta_ensemble"),
            Some(ModelDetail::Horizon(Box::new(detail))),
        )
    }

    fn fallback(&self, _request: &PredictionRequest) -> ModelOutput {
        ModelOutput::fallback(
            RiskPrediction::new(35.0, 20.0, 40.0, 25.0, 45.0),
            50.0,
            "horizon fallback",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Enrichment, Observation, Percent, SeasonalOutlook, TargetDate};

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

    fn request(obs: Observation) -> PredictionRequest {
        PredictionRequest::new(obs, TargetDate::MID_JULY, None, 2025, None)
    }

    fn detail(out: &ModelOutput) -> &HorizonDetail {
        match &out.detail {
            Some(ModelDetail::Horizon(detail)) => detail,
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn test_scenarios() {
        let model = HorizonModel::new(&HorizonConfig::default());
        let hot = model.predict(&request(desert())).unwrap();
        assert!(hot.predictions.extreme_heat > 60.0);
        assert!(hot.predictions.extreme_cold < 5.0);

        let cold = model.predict(&request(polar())).unwrap();
        assert!(cold.predictions.extreme_cold > 60.0);
        assert!(cold.predictions.extreme_heat < 5.0);
    }

    #[test]
    fn test_detail_is_complete() {
        let model = HorizonModel::new(&HorizonConfig::default());
        let out = model.predict(&request(desert())).unwrap();
        let d = detail(&out);
        assert_eq!(d.horizon_count, 3);
        assert_eq!(d.innovation_score, 100.0);
        assert!(d.short_term.is_some() && d.seasonal.is_some() && d.climate.is_some());
        assert!(Horizon::ALL.iter().all(|h| d.reliability(*h).is_some()));
        assert_eq!(out.confidence, d.overall_confidence);
        assert!((0.0..=100.0).contains(&d.temporal_consistency));
    }

    #[test]
    fn test_horizon_subset() {
        let config = HorizonConfig {
            horizons: BTreeSet::from([Horizon::Seasonal]),
            ..HorizonConfig::default()
        };
        let out = HorizonModel::new(&config).predict(&request(desert())).unwrap();
        let d = detail(&out);
        assert_eq!(d.horizon_count, 1);
        assert_eq!(d.innovation_score, 40.0);
        assert_eq!(d.temporal_consistency, meta::BASE_TEMPORAL_CONSISTENCY);
        assert!(d.short_term.is_none());
        assert_eq!(d.reliability(Horizon::Climate), None);
    }

    #[test]
    fn test_no_horizons_falls_back() {
        let config = HorizonConfig {
            horizons: BTreeSet::new(),
            ..HorizonConfig::default()
        };
        let run = HorizonModel::new(&config).run(&request(desert()));
        assert!(!run.succeeded());
        assert_eq!(run.output.predictions, RiskPrediction::new(35.0, 20.0, 40.0, 25.0, 45.0));
    }

    #[test]
    fn test_deterministic() {
        let config = HorizonConfig::default();
        let a = HorizonModel::new(&config).predict(&request(desert())).unwrap();
        let b = HorizonModel::new(&config).predict(&request(desert())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_enrichment_changes_output() {
        let model = HorizonModel::new(&HorizonConfig::default());
        let enrichment = Enrichment {
            seasonal: Some(SeasonalOutlook {
                temperature_anomaly: 3.0,
                precipitation_anomaly: Percent::new(20.0),
            }),
            ..Enrichment::default()
        };
        let req = PredictionRequest::new(desert(), TargetDate::MID_JULY, None, 2025, Some(enrichment));
        let with = model.predict(&req).unwrap();
        let without = model.predict(&request(desert())).unwrap();
        let seasonal = |out: &ModelOutput| detail(out).seasonal.clone().unwrap();
        assert!(seasonal(&with).window_mean_temp > seasonal(&without).window_mean_temp);
    }
}
