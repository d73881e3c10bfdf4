//! Inputs shared by the horizon pipelines
//!
//! Raw values are kept for the physically-motivated parts; the short-term
//! layers see a standardised, bounded vector instead.

use crate::core_types::ResolvedObservation;
use crate::models::PredictionRequest;
use nalgebra::DVector;
use std::f64::consts::PI;

/// Length of the standardised input vector
pub const N_INPUTS: usize = 12;

/// Standardised inputs, in vector order
pub const INPUT_NAMES: [&str; N_INPUTS] = [
    "temp_max",
    "temp_min",
    "humidity",
    "pressure",
    "wind_speed",
    "precipitation",
    "abs_latitude",
    "annual_sin",
    "annual_cos",
    "latent_heat_flux",
    "sensible_heat_flux",
    "year_offset",
];

/// `(centre, scale)` per standardised input
const STANDARDISATION: [(f64, f64); N_INPUTS] = [
    (15.0, 15.0),
    (5.0, 15.0),
    (60.0, 25.0),
    (1013.25, 15.0),
    (5.0, 5.0),
    (2.0, 5.0),
    (35.0, 25.0),
    (0.0, 1.0),
    (0.0, 1.0),
    (30.0, 30.0),
    (0.0, 20.0),
    (0.0, 10.0),
];

/// Standardised values are clipped to ± this many scales
const STANDARD_CLIP: f64 = 5.0;

/// Days per year used by the annual cycle terms
pub const YEAR_DAYS: f64 = 365.25;

/// Observation values plus calendar context
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonInputs {
    /// Observation with defaults applied
    pub obs: ResolvedObservation,
    /// Day of year of the target date
    pub day_of_year: u32,
    /// Year the estimate is for
    pub target_year: i32,
    /// `target_year - reference_year`
    pub year_offset: i32,
}

impl HorizonInputs {
    /// Inputs for a request
    pub fn from_request(request: &PredictionRequest) -> Self {
        Self {
            obs: request.resolved(),
            day_of_year: request.day_of_year,
            target_year: request.target_year,
            year_offset: request.year_offset(),
        }
    }

    /// Copy with a different maximum temperature
    #[must_use]
    pub fn with_temp_max(mut self, temp_max: f64) -> Self {
        self.obs.temp_max = temp_max;
        self
    }

    /// Raw (unstandardised) values in [`INPUT_NAMES`] order
    pub fn raw(&self) -> [f64; N_INPUTS] {
        let o = &self.obs;
        let phase = 2.0 * PI * f64::from(self.day_of_year) / YEAR_DAYS;
        [
            o.temp_max,
            o.temp_min,
            o.humidity,
            o.pressure,
            o.wind_speed,
            o.precipitation,
            o.latitude.abs(),
            phase.sin(),
            phase.cos(),
            o.humidity * o.wind_speed * 0.1,
            (o.temp_max - 15.0) * o.wind_speed * 0.05,
            f64::from(self.year_offset),
        ]
    }

    /// Centred, scaled and clipped input vector
    pub fn standardised(&self) -> DVector<f64> {
        let raw = self.raw();
        DVector::from_iterator(
            N_INPUTS,
            raw.iter()
                .zip(STANDARDISATION)
                .map(|(x, (centre, scale))| ((x - centre) / scale).clamp(-STANDARD_CLIP, STANDARD_CLIP)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Observation, TargetDate};

    #[test]
    fn test_standardised_is_bounded() {
        let obs = Observation::at(-77.8, 166.7)
            .with_temperatures(-60.0, -80.0)
            .with_wind_speed(90.0)
            .with_pressure(900.0);
        let req = PredictionRequest::new(obs, TargetDate::MID_JULY, None, 2025, None);
        let x = HorizonInputs::from_request(&req).standardised();
        assert_eq!(x.len(), N_INPUTS);
        assert!(x.iter().all(|v| v.abs() <= STANDARD_CLIP));
        // Wind of 90 m/s is far beyond five scales
        assert_eq!(x[4], STANDARD_CLIP);
    }

    #[test]
    fn test_defaults_sit_near_centre() {
        let req = PredictionRequest::new(Observation::default(), TargetDate::MID_JULY, None, 2025, None);
        let x = HorizonInputs::from_request(&req).standardised();
        assert!(x[2].abs() < 1e-12);
        assert!(x[3].abs() < 1e-12);
        assert!(x[11].abs() < 1e-12);
    }
}
