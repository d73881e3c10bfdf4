//! Closed-form training labels for the synthetic corpus

use super::features::EngineeredFeatures;
use crate::core_types::RiskPrediction;
use std::f64::consts::PI;

/// Label every category for one engineered sample (each clamped to [0, 100])
pub fn risk_labels(features: &EngineeredFeatures) -> RiskPrediction {
    let v = |name: &str| features.get(name).unwrap_or(0.0);
    let temp_max = v("temp_max");
    let heat_index = v("heat_index");
    let wind_chill = v("wind_chill");
    let lat = v("lat").abs();
    let month = v("month");
    let humidity = v("humidity");
    let precipitation = v("precipitation");
    let wind = v("wind_speed");
    let tendency = v("pressure_tendency").abs();

    let heat = 3.0 * (0.6 * temp_max + 0.3 * heat_index - 0.1 * lat - 25.0);
    let cold = 4.0 * (5.0 - (0.7 * wind_chill + 0.2 * lat + 2.0 * (6.0 - (month - 6.5).abs())));
    let precip = 0.4 * humidity + 0.003 * precipitation + 10.0 * tendency + 20.0 * (month * PI / 6.0).sin();
    let storm_track = if lat > 40.0 { 20.0 } else { 0.0 };
    let winds = 8.0 * wind + 15.0 * tendency + storm_track;
    let discomfort = 3.0 * (heat_index - 24.0) + 0.5 * (humidity - 40.0) - 2.0 * wind;

    RiskPrediction::new(heat, cold, precip, winds, discomfort)
}
