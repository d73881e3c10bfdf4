//! Climatological observation for one location and calendar date
//!
//! An [`Observation`] is assembled per request by the data-retrieval layer
//! from monthly climatology. Every numeric field is optional: models read
//! it through [`Observation::resolved`], which substitutes the documented
//! defaults below, so a sparse observation never stops a prediction.
//!
//! | field         | default      |
//! |---------------|--------------|
//! | temp_max      | 20 °C        |
//! | temp_min      | 10 °C        |
//! | humidity      | 60 %         |
//! | precipitation | 0 mm/day     |
//! | wind_speed    | 5 m/s        |
//! | pressure      | 1013.25 hPa  |
//! | latitude      | 0°           |
//! | longitude     | 0°           |

use crate::core_types::units::{Celsius, Degrees, Hectopascals, MetersPerSecond, Millimeters, Percent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Defaults applied to absent observation fields
pub mod defaults {
    /// Daily maximum temperature (°C)
    pub const TEMP_MAX: f64 = 20.0;
    /// Daily minimum temperature (°C)
    pub const TEMP_MIN: f64 = 10.0;
    /// Relative humidity (%)
    pub const HUMIDITY: f64 = 60.0;
    /// Precipitation (mm/day)
    pub const PRECIPITATION: f64 = 0.0;
    /// Wind speed (m/s)
    pub const WIND_SPEED: f64 = 5.0;
    /// Surface pressure (hPa)
    pub const PRESSURE: f64 = 1013.25;
    /// Latitude / longitude (°)
    pub const COORDINATE: f64 = 0.0;
}

/// Rejection reasons for a malformed observation
///
/// Raised by [`Observation::validate`], which the request boundary calls
/// before handing an observation to the ensemble.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A field holds NaN or infinity
    #[error("field '{0}' is not a finite number")]
    NonFinite(&'static str),
    /// A field is outside its physical range
    #[error("field '{field}' = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
        /// Inclusive lower bound
        min: f64,
        /// Inclusive upper bound
        max: f64,
    },
    /// Minimum temperature above maximum temperature
    #[error("temp_min {temp_min} exceeds temp_max {temp_max}")]
    InvertedTemperatures {
        /// Reported daily maximum
        temp_max: f64,
        /// Reported daily minimum
        temp_min: f64,
    },
}

/// Monthly-climatology observation for a location
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Observation {
    /// Mean daily maximum temperature
    pub temp_max: Option<Celsius>,
    /// Mean daily minimum temperature
    pub temp_min: Option<Celsius>,
    /// Relative humidity at 2 m
    pub humidity: Option<Percent>,
    /// Precipitation (mm/day)
    pub precipitation: Option<Millimeters>,
    /// Wind speed at 2 m
    pub wind_speed: Option<MetersPerSecond>,
    /// Surface pressure
    pub pressure: Option<Hectopascals>,
    /// Latitude (positive north)
    pub latitude: Option<Degrees>,
    /// Longitude (positive east)
    pub longitude: Option<Degrees>,
    /// Month (1-12) the climatology was extracted for
    pub month: Option<u32>,
    /// Day of month
    pub day: Option<u32>,
    /// Year the estimate targets (historical or future)
    pub target_year: Option<i32>,
}

/// Observation with defaults applied; plain f64 fields for formula code
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedObservation {
    /// Daily maximum temperature (°C)
    pub temp_max: f64,
    /// Daily minimum temperature (°C)
    pub temp_min: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Precipitation (mm/day)
    pub precipitation: f64,
    /// Wind speed (m/s)
    pub wind_speed: f64,
    /// Surface pressure (hPa)
    pub pressure: f64,
    /// Latitude (°)
    pub latitude: f64,
    /// Longitude (°)
    pub longitude: f64,
    /// Fraction (0-1) of the eight numeric fields that were present
    pub completeness: f64,
}

impl ResolvedObservation {
    /// Mean of daily maximum and minimum
    pub fn mean_temperature(&self) -> f64 {
        (self.temp_max + self.temp_min) / 2.0
    }

    /// Diurnal temperature range
    pub fn temperature_range(&self) -> f64 {
        self.temp_max - self.temp_min
    }

    /// `true` for latitude ≥ 0
    pub fn is_northern(&self) -> bool {
        self.latitude >= 0.0
    }
}

/// Present and finite
fn present<T: Into<f64> + Copy>(value: Option<T>) -> Option<f64> {
    value.map(Into::into).filter(|v: &f64| v.is_finite())
}

impl Observation {
    /// Observation with only a location set
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(Degrees::new(latitude)),
            longitude: Some(Degrees::new(longitude)),
            ..Self::default()
        }
    }

    /// Set daily maximum and minimum temperature
    pub fn with_temperatures(mut self, temp_max: f64, temp_min: f64) -> Self {
        self.temp_max = Some(Celsius::new(temp_max));
        self.temp_min = Some(Celsius::new(temp_min));
        self
    }

    /// Set relative humidity
    pub fn with_humidity(mut self, humidity: f64) -> Self {
        self.humidity = Some(Percent::new(humidity));
        self
    }

    /// Set precipitation
    pub fn with_precipitation(mut self, precipitation: f64) -> Self {
        self.precipitation = Some(Millimeters::new(precipitation));
        self
    }

    /// Set wind speed
    pub fn with_wind_speed(mut self, wind_speed: f64) -> Self {
        self.wind_speed = Some(MetersPerSecond::new(wind_speed));
        self
    }

    /// Set surface pressure
    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(Hectopascals::new(pressure));
        self
    }

    /// Set the target year
    pub fn with_target_year(mut self, year: i32) -> Self {
        self.target_year = Some(year);
        self
    }

    /// Apply documented defaults to absent (or non-finite) fields
    pub fn resolved(&self) -> ResolvedObservation {
        ResolvedObservation {
            temp_max: present(self.temp_max).unwrap_or(defaults::TEMP_MAX),
            temp_min: present(self.temp_min).unwrap_or(defaults::TEMP_MIN),
            humidity: present(self.humidity).unwrap_or(defaults::HUMIDITY),
            precipitation: present(self.precipitation).unwrap_or(defaults::PRECIPITATION),
            wind_speed: present(self.wind_speed).unwrap_or(defaults::WIND_SPEED),
            pressure: present(self.pressure).unwrap_or(defaults::PRESSURE),
            latitude: present(self.latitude).unwrap_or(defaults::COORDINATE),
            longitude: present(self.longitude).unwrap_or(defaults::COORDINATE),
            completeness: self.completeness(),
        }
    }

    /// Fraction of the eight numeric fields that are present and finite
    pub fn completeness(&self) -> f64 {
        let fields = [
            present(self.temp_max),
            present(self.temp_min),
            present(self.humidity),
            present(self.precipitation),
            present(self.wind_speed),
            present(self.pressure),
            present(self.latitude),
            present(self.longitude),
        ];
        fields.iter().filter(|f| f.is_some()).count() as f64 / fields.len() as f64
    }

    /// Fraction of the five surface-weather fields (temperatures, humidity,
    /// precipitation, wind) that are present and finite
    pub fn surface_completeness(&self) -> f64 {
        let fields = [
            present(self.temp_max),
            present(self.temp_min),
            present(self.humidity),
            present(self.precipitation),
            present(self.wind_speed),
        ];
        fields.iter().filter(|f| f.is_some()).count() as f64 / fields.len() as f64
    }

    /// Overlay every field that `other` has onto a copy of `self`
    ///
    /// Used to apply real-time conditions on top of monthly climatology.
    pub fn merged_with(&self, other: &Observation) -> Observation {
        Observation {
            temp_max: other.temp_max.or(self.temp_max),
            temp_min: other.temp_min.or(self.temp_min),
            humidity: other.humidity.or(self.humidity),
            precipitation: other.precipitation.or(self.precipitation),
            wind_speed: other.wind_speed.or(self.wind_speed),
            pressure: other.pressure.or(self.pressure),
            latitude: other.latitude.or(self.latitude),
            longitude: other.longitude.or(self.longitude),
            month: other.month.or(self.month),
            day: other.day.or(self.day),
            target_year: other.target_year.or(self.target_year),
        }
    }

    /// Boundary-layer check for malformed observations
    ///
    /// The ensemble itself tolerates anything (absent or odd values fall
    /// back to defaults); this is for callers that want to reject bad
    /// requests before they reach it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_finite("temp_max", self.temp_max.map(f64::from))?;
        check_finite("temp_min", self.temp_min.map(f64::from))?;
        check_range("humidity", self.humidity.map(f64::from), 0.0, 100.0)?;
        check_range("precipitation", self.precipitation.map(f64::from), 0.0, f64::INFINITY)?;
        check_range("wind_speed", self.wind_speed.map(f64::from), 0.0, f64::INFINITY)?;
        check_range("pressure", self.pressure.map(f64::from), f64::MIN_POSITIVE, f64::INFINITY)?;
        check_range("latitude", self.latitude.map(f64::from), -90.0, 90.0)?;
        check_range("longitude", self.longitude.map(f64::from), -180.0, 180.0)?;
        check_range("month", self.month.map(f64::from), 1.0, 12.0)?;
        check_range("day", self.day.map(f64::from), 1.0, 31.0)?;

        if let (Some(max), Some(min)) = (self.temp_max, self.temp_min) {
            if min > max {
                return Err(ValidationError::InvertedTemperatures {
                    temp_max: max.value(),
                    temp_min: min.value(),
                });
            }
        }
        Ok(())
    }
}

fn check_finite(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::NonFinite(field)),
        _ => Ok(()),
    }
}

fn check_range(field: &'static str, value: Option<f64>, min: f64, max: f64) -> Result<(), ValidationError> {
    let Some(value) = value else {
        return Ok(());
    };
    if !value.is_finite() {
        return Err(ValidationError::NonFinite(field));
    }
    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
