//! Climate-zone statistical model
//!
//! Baseline heat and cold risk come from a six-band latitude classification
//! (Köppen-style bands simplified to latitude only), scaled by a local-season
//! factor and topped up by threshold exceedances in the climatology.
//!
//! This model reads the raw climatology rather than the real-time overlay:
//! it describes what is typical for the place and date, which is the
//! baseline the other models deviate from.
//!
//! # References
//!
//! - Peel, M.C., Finlayson, B.L. & McMahon, T.A. (2007). Updated world map
//!   of the Köppen-Geiger climate classification. Hydrology and Earth
//!   System Sciences, 11, 1633-1644.

use super::{ModelAdapter, ModelDetail, ModelKind, ModelOutput, PredictionRequest};
use crate::core_types::{ResolvedObservation, RiskPrediction, TargetDate};
use crate::error::ModelResult;
use serde::{Deserialize, Serialize};

/// Latitude band used to pick baseline risks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimateZone {
    /// |lat| < 10°
    Equatorial,
    /// |lat| < 23.5°
    Tropical,
    /// |lat| < 35°
    Subtropical,
    /// |lat| < 50°
    Temperate,
    /// |lat| < 66.5°
    Subpolar,
    /// Everything poleward of the polar circles
    Polar,
}

/// Baselines for one climate zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneBaseline {
    /// Baseline extreme-heat risk (%)
    pub heat: f64,
    /// Baseline extreme-cold risk (%)
    pub cold: f64,
    /// Precipitation risk multiplier
    pub precip_multiplier: f64,
    /// How well the zone classification describes local climate (0-1)
    pub certainty: f64,
}

impl ClimateZone {
    /// Classify a latitude
    pub fn from_latitude(latitude: f64) -> Self {
        let lat = latitude.abs();
        if lat < 10.0 {
            ClimateZone::Equatorial
        } else if lat < 23.5 {
            ClimateZone::Tropical
        } else if lat < 35.0 {
            ClimateZone::Subtropical
        } else if lat < 50.0 {
            ClimateZone::Temperate
        } else if lat < 66.5 {
            ClimateZone::Subpolar
        } else {
            ClimateZone::Polar
        }
    }

    /// Baseline risks for the zone
    pub fn baseline(self) -> ZoneBaseline {
        let (heat, cold, precip_multiplier, certainty) = match self {
            ClimateZone::Equatorial => (70.0, 5.0, 1.5, 0.8),
            ClimateZone::Tropical => (60.0, 10.0, 1.3, 0.9),
            ClimateZone::Subtropical => (50.0, 20.0, 1.0, 0.8),
            ClimateZone::Temperate => (35.0, 30.0, 0.8, 0.9),
            ClimateZone::Subpolar => (20.0, 50.0, 0.6, 0.8),
            ClimateZone::Polar => (10.0, 70.0, 0.4, 0.8),
        };
        ZoneBaseline {
            heat,
            cold,
            precip_multiplier,
            certainty,
        }
    }
}

/// Hemisphere from the sign of latitude (equator counts as north)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hemisphere {
    /// lat ≥ 0
    North,
    /// lat < 0
    South,
}

impl Hemisphere {
    /// Classify a latitude
    pub fn from_latitude(latitude: f64) -> Self {
        if latitude >= 0.0 {
            Hemisphere::North
        } else {
            Hemisphere::South
        }
    }

    /// Date falls in this hemisphere's meteorological summer
    pub fn is_summer(self, date: TargetDate) -> bool {
        match self {
            Hemisphere::North => date.is_june_to_august(),
            Hemisphere::South => date.is_december_to_february(),
        }
    }

    /// Date falls in this hemisphere's meteorological winter
    pub fn is_winter(self, date: TargetDate) -> bool {
        match self {
            Hemisphere::North => date.is_december_to_february(),
            Hemisphere::South => date.is_june_to_august(),
        }
    }
}

/// Statistical model internals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalDetail {
    /// Latitude band
    pub climate_zone: ClimateZone,
    /// Hemisphere
    pub hemisphere: Hemisphere,
    /// Multiplier applied to baseline heat
    pub seasonal_heat_factor: f64,
    /// Multiplier applied to baseline cold
    pub seasonal_cold_factor: f64,
}

/// Climate-zone + seasonal heuristic model
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalModel;

impl StatisticalModel {
    /// Create the model (stateless)
    pub fn new() -> Self {
        Self
    }

    /// Local-season `(heat, cold)` factors
    pub fn seasonal_factors(hemisphere: Hemisphere, date: TargetDate) -> (f64, f64) {
        if hemisphere.is_summer(date) {
            (1.4, 0.3)
        } else if hemisphere.is_winter(date) {
            (0.4, 1.6)
        } else {
            (1.0, 1.0)
        }
    }

    /// Raw (unclamped) risks and the detail record
    fn compute(obs: &ResolvedObservation, date: TargetDate) -> (RiskPrediction, StatisticalDetail) {
        let zone = ClimateZone::from_latitude(obs.latitude);
        let base = zone.baseline();
        let hemisphere = Hemisphere::from_latitude(obs.latitude);
        let (f_heat, f_cold) = Self::seasonal_factors(hemisphere, date);

        let mut heat = base.heat * f_heat;
        if obs.temp_max > 25.0 {
            heat += 2.0 * (obs.temp_max - 25.0);
        }
        if obs.humidity > 70.0 {
            heat += 0.3 * obs.humidity;
        }

        let mut cold = base.cold * f_cold;
        if obs.temp_min < 15.0 {
            cold += 2.0 * (15.0 - obs.temp_min);
        }
        if obs.temp_min < 10.0 {
            cold += 0.5 * obs.wind_speed;
        }

        let mut precip = 15.0 * obs.precipitation * base.precip_multiplier;
        if date.is_transition_season() {
            precip *= 1.2;
        }

        let mut wind = 4.0 * obs.wind_speed;
        if obs.latitude.abs() > 40.0 {
            wind *= 1.2;
        }
        if matches!(date.month, 11 | 12 | 1..=3) {
            wind *= 1.1;
        }

        let discomfort = (1.2 * obs.temp_max + 0.8 * obs.humidity - 40.0) * f_heat;

        let raw = RiskPrediction {
            extreme_heat: heat,
            extreme_cold: cold,
            heavy_precipitation: precip,
            strong_winds: wind,
            heat_discomfort: discomfort,
        };
        let detail = StatisticalDetail {
            climate_zone: zone,
            hemisphere,
            seasonal_heat_factor: f_heat,
            seasonal_cold_factor: f_cold,
        };
        (raw, detail)
    }
}

impl ModelAdapter for StatisticalModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Statistical
    }

    fn predict(&self, request: &PredictionRequest) -> ModelResult<ModelOutput> {
        let obs = request.climatology.resolved();
        let (raw, detail) = Self::compute(&obs, request.date);
        let certainty = detail.climate_zone.baseline().certainty;
        let confidence = (request.climatology.surface_completeness() * 0.6 + certainty * 0.4) * 100.0;

        ModelOutput::checked(
            ModelKind::Statistical,
            raw,
            confidence,
            Some("climate_zone_percentiles"),
            Some(ModelDetail::Statistical(detail)),
        )
    }

    /// Coarse three-zone heuristic
    fn fallback(&self, request: &PredictionRequest) -> ModelOutput {
        let obs = request.climatology.resolved();
        let lat = obs.latitude.abs();
        let t = obs.temp_max;
        let p = obs.precipitation;

        let (heat, cold, precip) = if lat < 23.5 {
            (60.0 + (t - 25.0) * 2.0, (30.0 - lat).max(5.0), 40.0 + p * 10.0)
        } else if lat < 50.0 {
            (40.0 + (t - 20.0) * 1.5, 20.0 + (25.0 - t) * 1.5, 30.0 + p * 8.0)
        } else {
            ((20.0 + (t - 10.0) * 1.2).max(10.0), 50.0 + (15.0 - t) * 2.0, 20.0 + p * 6.0)
        };

        // 1.3 in local winter, 0.7 in local summer; the equator takes 0.7
        // in both solstice seasons
        let factor = if request.date.is_december_to_february() {
            if obs.latitude > 0.0 { 1.3 } else { 0.7 }
        } else if request.date.is_june_to_august() {
            if obs.latitude < 0.0 { 1.3 } else { 0.7 }
        } else {
            1.0
        };

        let predictions = RiskPrediction::new(
            heat * (2.0 - factor),
            cold * factor,
            precip,
            20.0 + 3.0 * obs.wind_speed,
            1.5 * t + 0.5 * obs.humidity - 20.0,
        );
        ModelOutput::fallback(predictions, 60.0, "statistical fallback")
    }
}
