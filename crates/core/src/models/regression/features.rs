//! Engineered feature vector
//!
//! Seventeen features: the raw surface variables, location and month,
//! derived comfort indices, a pressure-tendency proxy and four temporal
//! features placing the target year relative to the reference year.

use crate::core_types::{ResolvedObservation, TargetDate};
use crate::models::physics;
use serde::{Deserialize, Serialize};

/// Number of engineered features
pub const N_FEATURES: usize = 17;

/// Feature names in vector order
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "temp_max",
    "temp_min",
    "precipitation",
    "wind_speed",
    "humidity",
    "dew_point",
    "month",
    "lat",
    "lon",
    "temp_range",
    "heat_index",
    "wind_chill",
    "pressure_tendency",
    "year_offset",
    "is_historical",
    "is_forecast",
    "climate_era",
];

/// First year of the warming-era scale
pub const CLIMATE_ERA_START: i32 = 2020;

/// Dew point (°C) via the Magnus formula
pub fn dew_point(temp: f64, humidity: f64) -> f64 {
    const A: f64 = 17.27;
    const B: f64 = 237.7;
    let rh = humidity.clamp(1.0, 100.0) / 100.0;
    let gamma = A * temp / (B + temp) + rh.ln();
    B * gamma / (A - gamma)
}

/// Rothfusz heat index (°C) when hot and humid, else `temp`
///
/// The regression is defined in °F; inputs are converted and the result
/// converted back.
pub fn heat_index(temp: f64, humidity: f64) -> f64 {
    if temp < 27.0 || humidity < 40.0 {
        return temp;
    }
    let t = temp * 9.0 / 5.0 + 32.0;
    let rh = humidity;
    let hi = -42.379 + 2.04901523 * t + 10.14333127 * rh
        - 0.22475541 * t * rh
        - 6.83783e-3 * t * t
        - 5.481717e-2 * rh * rh
        + 1.22874e-3 * t * t * rh
        + 8.5282e-4 * t * rh * rh
        - 1.99e-6 * t * t * rh * rh;
    (hi - 32.0) * 5.0 / 9.0
}

/// Wind chill on Tmax when cold and windy, else `temp`
pub fn feature_wind_chill(temp: f64, wind_speed: f64) -> f64 {
    if temp <= 10.0 && wind_speed > 4.8 {
        physics::wind_chill(temp, wind_speed)
    } else {
        temp
    }
}

/// Pressure tendency proxy from temperature and humidity
pub fn pressure_tendency(temp: f64, humidity: f64) -> f64 {
    -0.1 * (temp - 15.0) - 0.05 * (humidity - 50.0)
}

/// `(target - 2020) / 50` from 2020 on, −1 before
pub fn climate_era(year: i32) -> f64 {
    if year >= CLIMATE_ERA_START {
        f64::from(year - CLIMATE_ERA_START) / 50.0
    } else {
        -1.0
    }
}

/// Inputs the feature vector is built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureInput {
    /// Daily maximum temperature (°C)
    pub temp_max: f64,
    /// Daily minimum temperature (°C)
    pub temp_min: f64,
    /// Precipitation (mm/day)
    pub precipitation: f64,
    /// Wind speed (m/s)
    pub wind_speed: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Latitude (°)
    pub latitude: f64,
    /// Longitude (°)
    pub longitude: f64,
    /// Month (1-12)
    pub month: u32,
    /// Target year
    pub year: i32,
    /// Reference ("current") year
    pub reference_year: i32,
}

impl FeatureInput {
    /// Feature input for a live request
    pub fn from_observation(obs: &ResolvedObservation, date: TargetDate, year: i32, reference_year: i32) -> Self {
        Self {
            temp_max: obs.temp_max,
            temp_min: obs.temp_min,
            precipitation: obs.precipitation,
            wind_speed: obs.wind_speed,
            humidity: obs.humidity,
            latitude: obs.latitude,
            longitude: obs.longitude,
            month: date.month,
            year,
            reference_year,
        }
    }
}

/// Named, engineered features for one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineeredFeatures {
    /// Values in [`FEATURE_NAMES`] order
    pub values: [f64; N_FEATURES],
}

impl EngineeredFeatures {
    /// Engineer all features
    pub fn from_input(input: &FeatureInput) -> Self {
        let t = input.temp_max;
        let rh = input.humidity;
        let year_offset = input.year - input.reference_year;
        Self {
            values: [
                t,
                input.temp_min,
                input.precipitation,
                input.wind_speed,
                rh,
                dew_point(t, rh),
                f64::from(input.month),
                input.latitude,
                input.longitude,
                t - input.temp_min,
                heat_index(t, rh),
                feature_wind_chill(t, input.wind_speed),
                pressure_tendency(t, rh),
                f64::from(year_offset),
                f64::from(u8::from(year_offset < 0)),
                f64::from(u8::from(year_offset > 0)),
                climate_era(input.year),
            ],
        }
    }

    /// Value of a feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES.iter().position(|n| *n == name).map(|i| self.values[i])
    }

    /// `(name, value)` pairs in vector order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn input(temp_max: f64, humidity: f64, year: i32) -> FeatureInput {
        FeatureInput {
            temp_max,
            temp_min: temp_max - 10.0,
            precipitation: 1.0,
            wind_speed: 3.0,
            humidity,
            latitude: 30.0,
            longitude: 10.0,
            month: 7,
            year,
            reference_year: 2025,
        }
    }

    #[test]
    fn test_dew_point_magnus() {
        // Saturated air: dew point equals temperature
        assert_relative_eq!(dew_point(20.0, 100.0), 20.0, epsilon = 1e-9);
        assert_relative_eq!(dew_point(30.0, 50.0), 18.4, epsilon = 0.1);
    }

    #[test]
    fn test_heat_index_activation() {
        assert_eq!(heat_index(25.0, 80.0), 25.0);
        assert_eq!(heat_index(35.0, 30.0), 35.0);
        // NWS table: 95 °F at 70 % RH reads 124 °F
        assert_relative_eq!(heat_index(35.0, 70.0), (124.0 - 32.0) * 5.0 / 9.0, epsilon = 1.0);
    }

    #[test]
    fn test_temporal_features() {
        let past = EngineeredFeatures::from_input(&input(30.0, 50.0, 2018));
        assert_eq!(past.get("year_offset"), Some(-7.0));
        assert_eq!(past.get("is_historical"), Some(1.0));
        assert_eq!(past.get("is_forecast"), Some(0.0));
        assert_eq!(past.get("climate_era"), Some(-1.0));

        let future = EngineeredFeatures::from_input(&input(30.0, 50.0, 2045));
        assert_eq!(future.get("is_forecast"), Some(1.0));
        assert_relative_eq!(future.get("climate_era").unwrap(), 0.5);
    }

    #[test]
    fn test_vector_layout() {
        let f = EngineeredFeatures::from_input(&input(30.0, 50.0, 2025));
        assert_eq!(f.named().count(), N_FEATURES);
        assert_eq!(f.get("temp_range"), Some(10.0));
        assert_relative_eq!(f.get("pressure_tendency").unwrap(), -1.5);
        assert_eq!(f.get("nope"), None);
    }
}
