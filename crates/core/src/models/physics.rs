//! Thermodynamic risk model
//!
//! Each category comes from a textbook atmospheric formula evaluated on the
//! (real-time merged) observation:
//! - Heat: Wet Bulb Globe Temperature from a Stull wet-bulb estimate
//! - Cold: Environment Canada wind chill with a dryness adjustment
//! - Precipitation: column moisture, instability and convergence
//! - Wind: geostrophic balance on a synoptic pressure gradient plus a
//!   thermal-wind term
//!
//! # Scientific References
//! - Stull, R. (2011). "Wet-Bulb Temperature from Relative Humidity and Air
//!   Temperature". Journal of Applied Meteorology and Climatology, 50(11),
//!   2267-2269
//! - Yaglou, C.P. & Minard, D. (1957). "Control of heat casualties at
//!   military training centers". AMA Archives of Industrial Health, 16, 302-316
//! - Osczevski, R. & Bluestein, M. (2005). "The new wind chill equivalent
//!   temperature chart". Bulletin of the AMS, 86(10), 1453-1458
//! - Bolton, D. (1980). "The computation of equivalent potential temperature".
//!   Monthly Weather Review, 108, 1046-1053
//! - Holton, J.R. (2004). An Introduction to Dynamic Meteorology, 4th ed., ch. 3

use super::{ModelAdapter, ModelDetail, ModelKind, ModelOutput, PredictionRequest};
use crate::core_types::{Hectopascals, MetersPerSecond, ResolvedObservation, RiskPrediction};
use crate::error::ModelResult;
use serde::{Deserialize, Serialize};

/// Physical constants
pub mod constants {
    /// Earth's angular velocity (rad/s)
    pub const EARTH_ROTATION: f64 = 7.292e-5;

    /// Standard air density at sea level (kg/m³)
    pub const AIR_DENSITY: f64 = 1.225;

    /// Floor on |f| so the geostrophic estimate stays finite near the equator (s⁻¹)
    pub const CORIOLIS_FLOOR: f64 = 1e-5;

    /// Length over which the pressure anomaly is assumed to act (m)
    pub const SYNOPTIC_LENGTH_SCALE: f64 = 1.0e6;

    /// Clear-sky solar irradiance used for globe temperature (W/m²)
    pub const SOLAR_RADIATION: f64 = 800.0;

    /// WBGT at which heat risk starts (°C)
    pub const WBGT_LOW: f64 = 27.0;

    /// WBGT at which heat risk saturates (°C)
    pub const WBGT_HIGH: f64 = 32.0;

    /// Temperature above which cold risk is zero (°C)
    pub const COLD_ACTIVATION: f64 = 10.0;

    /// Wind speed below which wind chill equals air temperature (km/h)
    pub const WIND_CHILL_MIN_WIND_KMH: f64 = 4.8;

    /// Wind speed treated as 100% wind risk (m/s)
    pub const WIND_RISK_CEILING: f64 = 15.0;

    /// Wind below which WBGT uses the globe-temperature form (m/s)
    pub const CALM_WIND: f64 = 3.0;
}

use constants::*;

/// Stull (2011) wet-bulb temperature approximation
///
/// # Arguments
/// * `temp` - Air temperature (°C)
/// * `humidity` - Relative humidity (%)
///
/// # Returns
/// Wet-bulb temperature (°C)
pub fn wet_bulb_temperature(temp: f64, humidity: f64) -> f64 {
    temp * (0.151977 * (humidity + 8.313659).sqrt()).atan() + (temp + humidity).atan()
        - (humidity - 1.676331).atan()
        + 0.00391838 * humidity.powf(1.5) * (0.023101 * humidity).atan()
        - 4.686035
}

/// Wet Bulb Globe Temperature
///
/// Calm conditions include radiant load through a simplified globe
/// temperature; in wind the globe term is dropped.
///
/// # Returns
/// `(wet_bulb, wbgt)` in °C
pub fn wbgt(temp: f64, humidity: f64, wind_speed: f64) -> (f64, f64) {
    let wet_bulb = wet_bulb_temperature(temp, humidity);
    let globe = temp + 2.0 * (SOLAR_RADIATION / 1000.0);
    let wbgt = if wind_speed < CALM_WIND {
        0.7 * wet_bulb + 0.2 * globe + 0.1 * temp
    } else {
        0.7 * wet_bulb + 0.3 * temp
    };
    (wet_bulb, wbgt)
}

/// Heat stress risk (%) from WBGT: linear from 27 °C to 32 °C
pub fn heat_stress_risk(temp: f64, humidity: f64, wind_speed: f64) -> f64 {
    let (_, wbgt) = wbgt(temp, humidity, wind_speed);
    ((wbgt - WBGT_LOW) / (WBGT_HIGH - WBGT_LOW) * 100.0).clamp(0.0, 100.0)
}

/// Environment Canada wind chill index
///
/// # Arguments
/// * `temp` - Air temperature (°C)
/// * `wind_speed` - Wind speed (m/s)
///
/// # Returns
/// Wind chill (°C); equal to `temp` in near-calm air
pub fn wind_chill(temp: f64, wind_speed: f64) -> f64 {
    let v = MetersPerSecond::new(wind_speed).to_km_per_hour();
    if v < WIND_CHILL_MIN_WIND_KMH {
        return temp;
    }
    let v16 = v.powf(0.16);
    13.12 + 0.6215 * temp - 11.37 * v16 + 0.3965 * temp * v16
}

/// Wind chill scaled for dry air (dry cold feels colder)
pub fn effective_chill(temp: f64, wind_speed: f64, humidity: f64) -> f64 {
    let humidity = humidity.clamp(0.0, 100.0);
    wind_chill(temp, wind_speed) * (1.0 + (50.0 - humidity) / 200.0)
}

/// Cold risk (%) on the daily minimum temperature
///
/// Zero above 10 °C. Below that, 3.33 % per degree of effective chill
/// under 0 °C down to −15 °C, then 2 % per degree beyond.
pub fn cold_risk(temp: f64, wind_speed: f64, humidity: f64) -> f64 {
    if temp > COLD_ACTIVATION {
        return 0.0;
    }
    let chill = effective_chill(temp, wind_speed, humidity);
    let risk = if chill > 0.0 {
        0.0
    } else if chill > -15.0 {
        -chill * 3.33
    } else {
        50.0 + (-15.0 - chill) * 2.0
    };
    risk.clamp(0.0, 100.0)
}

/// Saturation vapour pressure (hPa), Bolton (1980)
pub fn saturation_vapour_pressure(temp: f64) -> f64 {
    6.112 * (17.67 * temp / (temp + 243.5)).exp()
}

/// Precipitation potential (%) from moisture, instability and convergence
pub fn precipitation_potential(temp: f64, humidity: f64, pressure: f64, wind_speed: f64) -> f64 {
    let vapour = saturation_vapour_pressure(temp) * humidity / 100.0;
    let precipitable_water = vapour / pressure * 1.0e4;
    let instability = ((temp - 15.0) * (humidity - 70.0) / 100.0).max(0.0);
    let convergence = (wind_speed / 10.0).min(1.0);

    let potential = 0.4 * precipitable_water + 0.3 * instability + 0.2 * convergence + 0.1 * (1000.0 - pressure);
    potential.clamp(0.0, 100.0)
}

/// Coriolis parameter f = 2Ω sin(φ)
pub fn coriolis_parameter(latitude: f64) -> f64 {
    2.0 * EARTH_ROTATION * latitude.to_radians().sin()
}

/// Geostrophic wind (m/s) for a pressure anomaly
///
/// The anomaly from standard atmosphere (at least 1 hPa) is taken to act
/// over [`SYNOPTIC_LENGTH_SCALE`]; |f| is floored at [`CORIOLIS_FLOOR`].
pub fn geostrophic_wind(pressure: f64, latitude: f64) -> f64 {
    let anomaly = (Hectopascals::STANDARD_ATMOSPHERE.value() - pressure).abs().max(1.0);
    let gradient = Hectopascals::new(anomaly).to_pascals() / SYNOPTIC_LENGTH_SCALE;
    let f = coriolis_parameter(latitude).abs().max(CORIOLIS_FLOOR);
    gradient / (AIR_DENSITY * f)
}

/// Strong-wind risk (%) from geostrophic and thermal wind
///
/// # Returns
/// `(risk, geostrophic_wind)`
pub fn wind_risk(pressure: f64, latitude: f64, temp_max: f64, temp_min: f64) -> (f64, f64) {
    let geostrophic = geostrophic_wind(pressure, latitude);
    let thermal = 2.0 * (temp_max - temp_min).abs() / 1000.0;
    let total = geostrophic.hypot(thermal);
    ((total / WIND_RISK_CEILING * 100.0).clamp(0.0, 100.0), geostrophic)
}

/// Physics model internals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsDetail {
    /// Wet-bulb temperature (°C)
    pub wet_bulb: f64,
    /// Wet Bulb Globe Temperature (°C)
    pub wbgt: f64,
    /// Wind chill on the daily minimum (°C)
    pub wind_chill: f64,
    /// Dryness-adjusted wind chill (°C)
    pub effective_chill: f64,
    /// Saturation vapour pressure at Tmax (hPa)
    pub saturation_vapour_pressure: f64,
    /// Geostrophic wind estimate (m/s)
    pub geostrophic_wind: f64,
    /// Surface pressure used (hPa)
    pub pressure: f64,
    /// Share of plausibility checks passed (%)
    pub data_quality: f64,
    /// Share of consistency checks passed (%)
    pub physics_validity: f64,
}

/// Formula-driven atmospheric physics model
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicsModel;

impl PhysicsModel {
    /// Create the model (stateless)
    pub fn new() -> Self {
        Self
    }

    /// Raw risks for one observation
    pub fn risks(obs: &ResolvedObservation) -> RiskPrediction {
        RiskPrediction {
            extreme_heat: heat_stress_risk(obs.temp_max, obs.humidity, obs.wind_speed),
            extreme_cold: cold_risk(obs.temp_min, obs.wind_speed, obs.humidity),
            heavy_precipitation: precipitation_potential(obs.temp_max, obs.humidity, obs.pressure, obs.wind_speed),
            strong_winds: wind_risk(obs.pressure, obs.latitude, obs.temp_max, obs.temp_min).0,
            heat_discomfort: heat_stress_risk(obs.temp_max, obs.humidity, obs.wind_speed * 0.7),
        }
    }

    /// `(data_quality, physics_validity)`, both in %
    fn quality_scores(obs: &ResolvedObservation, risks: &RiskPrediction) -> (f64, f64) {
        let quality_checks = [
            (-50.0..=60.0).contains(&obs.temp_max),
            (0.0..=100.0).contains(&obs.humidity),
            (0.0..=100.0).contains(&obs.wind_speed),
        ];
        let validity_checks = [
            obs.temp_max >= obs.temp_min,
            risks.first_non_finite().is_none() && risks.is_within_bounds(),
        ];
        let share = |checks: &[bool]| checks.iter().filter(|c| **c).count() as f64 / checks.len() as f64 * 100.0;
        (share(&quality_checks), share(&validity_checks))
    }
}

impl ModelAdapter for PhysicsModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Physics
    }

    fn predict(&self, request: &PredictionRequest) -> ModelResult<ModelOutput> {
        let obs = request.resolved();
        let raw = Self::risks(&obs);
        let (data_quality, physics_validity) = Self::quality_scores(&obs, &raw);
        let confidence = 0.6 * data_quality + 0.4 * physics_validity;

        let (wet_bulb, wbgt) = wbgt(obs.temp_max, obs.humidity, obs.wind_speed);
        let detail = PhysicsDetail {
            wet_bulb,
            wbgt,
            wind_chill: wind_chill(obs.temp_min, obs.wind_speed),
            effective_chill: effective_chill(obs.temp_min, obs.wind_speed, obs.humidity),
            saturation_vapour_pressure: saturation_vapour_pressure(obs.temp_max),
            geostrophic_wind: geostrophic_wind(obs.pressure, obs.latitude),
            pressure: obs.pressure,
            data_quality,
            physics_validity,
        };

        ModelOutput::checked(
            ModelKind::Physics,
            raw,
            confidence,
            Some("atmospheric_physics"),
            Some(ModelDetail::Physics(detail)),
        )
    }

    fn fallback(&self, _request: &PredictionRequest) -> ModelOutput {
        ModelOutput::fallback(RiskPrediction::new(30.0, 20.0, 35.0, 25.0, 40.0), 60.0, "physics fallback")
    }
}
