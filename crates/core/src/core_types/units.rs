//! Semantic unit types for meteorological quantities
//!
//! Newtype wrappers keep observation fields from being mixed up (a humidity
//! percentage passed where a wind speed is expected, hectopascals where
//! millimetres belong).
//!
//! # Design Philosophy
//! - All quantities use f64; risk formulas chain `exp`/`atan`/`powf` and the
//!   ensemble must be bit-for-bit reproducible
//! - Total ordering via `Ord` (NaN sorts above every value)
//! - `Deref` to the raw value so formulas read naturally (`*temp - 25.0`)
//! - Serde support with transparent representation
//!
//! # Usage
//! ```
//! use risk_ensemble_core::core_types::units::{Celsius, Percent};
//!
//! let temp = Celsius::new(42.0);
//! let humidity = Percent::new(35.0);
//! assert!((*temp - 42.0).abs() < f64::EPSILON);
//! assert!((*humidity - 35.0).abs() < f64::EPSILON);
//! assert_eq!(Celsius::new(-5.0).min(Celsius::new(3.0)), Celsius::new(-5.0));
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Deref, Mul, Sub};

/// Shared boilerplate for an f64 newtype: total ordering, `Deref`,
/// conversions, and arithmetic with plain scalars.
macro_rules! unit_newtype {
    ($name:ident, $suffix:literal) => {
        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl Deref for $name {
            type Target = f64;
            #[inline]
            fn deref(&self) -> &f64 {
                &self.0
            }
        }

        impl $name {
            /// Get the raw f64 value
            #[inline]
            #[must_use]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// `true` when the underlying value is neither NaN nor infinite
            #[inline]
            #[must_use]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl From<f64> for $name {
            fn from(v: f64) -> Self {
                $name(v)
            }
        }

        impl From<$name> for f64 {
            fn from(v: $name) -> f64 {
                v.0
            }
        }

        impl Add for $name {
            type Output = $name;
            fn add(self, rhs: $name) -> $name {
                $name(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = $name;
            fn sub(self, rhs: $name) -> $name {
                $name(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $name {
            type Output = $name;
            fn mul(self, rhs: f64) -> $name {
                $name(self.0 * rhs)
            }
        }

        impl PartialEq<f64> for $name {
            fn eq(&self, other: &f64) -> bool {
                self.0 == *other
            }
        }

        impl PartialOrd<f64> for $name {
            fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
                self.0.partial_cmp(other)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.1}{}", self.0, $suffix)
            }
        }
    };
}

// ============================================================================
// TEMPERATURE
// ============================================================================

/// Air temperature in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Celsius(f64);

unit_newtype!(Celsius, "°C");

impl Celsius {
    /// Create a new Celsius temperature.
    ///
    /// No range check is applied here; implausible values are reported by
    /// [`crate::core_types::Observation::validate`] at the request boundary.
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Celsius(value)
    }
}

// ============================================================================
// RATIOS
// ============================================================================

/// A percentage (0-100): relative humidity, risk probability, confidence
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Percent(f64);

unit_newtype!(Percent, "%");

impl Percent {
    /// Create a new percentage
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Percent(value)
    }
}

/// Clamp a raw value into [0, 100]. NaN maps to 0.
#[inline]
#[must_use]
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

// ============================================================================
// SPEED / DEPTH / PRESSURE
// ============================================================================

/// Wind speed in metres per second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MetersPerSecond(f64);

unit_newtype!(MetersPerSecond, " m/s");

impl MetersPerSecond {
    /// Create a new wind speed
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        MetersPerSecond(value)
    }

    /// Convert to km/h
    #[inline]
    #[must_use]
    pub fn to_km_per_hour(self) -> f64 {
        self.0 * 3.6
    }
}

/// Daily precipitation depth in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Millimeters(f64);

unit_newtype!(Millimeters, " mm");

impl Millimeters {
    /// Create a new precipitation depth
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Millimeters(value)
    }
}

/// Atmospheric pressure in hectopascals (millibars)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Hectopascals(f64);

unit_newtype!(Hectopascals, " hPa");

impl Hectopascals {
    /// ISA mean sea-level pressure
    pub const STANDARD_ATMOSPHERE: Hectopascals = Hectopascals(1013.25);

    /// Create a new pressure
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Hectopascals(value)
    }

    /// Convert to pascals
    #[inline]
    #[must_use]
    pub fn to_pascals(self) -> f64 {
        self.0 * 100.0
    }
}

// ============================================================================
// ANGLES
// ============================================================================

/// Geographic angle in degrees (latitude / longitude)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Degrees(f64);

unit_newtype!(Degrees, "°");

impl Degrees {
    /// Create a new angle
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Degrees(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_clamping() {
        assert_eq!(clamp_percent(140.0), 100.0);
        assert_eq!(clamp_percent(-3.0), 0.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(42.5), 42.5);
    }

    #[test]
    fn test_total_ordering_puts_nan_last() {
        let mut temps = vec![Celsius::new(f64::NAN), Celsius::new(3.0), Celsius::new(-1.0)];
        temps.sort();
        assert_eq!(temps[0], Celsius::new(-1.0));
        assert_eq!(temps[1], Celsius::new(3.0));
        assert!(temps[2].is_nan());
    }

    #[test]
    fn test_unit_conversions() {
        assert!((MetersPerSecond::new(10.0).to_km_per_hour() - 36.0).abs() < 1e-9);
        assert!((Hectopascals::STANDARD_ATMOSPHERE.to_pascals() - 101_325.0).abs() < 1e-9);
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&Celsius::new(21.5)).unwrap();
        assert_eq!(json, "21.5");
        let back: Percent = serde_json::from_str("35.0").unwrap();
        assert_eq!(back, Percent::new(35.0));
    }
}
