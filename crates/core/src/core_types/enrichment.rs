//! Optional context snippets supplied alongside the climatology
//!
//! None of these are required. The boundary layer fills in whatever its
//! upstream services returned; models treat every part as a nudge.

use crate::core_types::observation::Observation;
use crate::core_types::units::{Celsius, MetersPerSecond, Millimeters, Percent};
use serde::{Deserialize, Serialize};

/// Summary of a short-range forecast window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    /// Mean daily maximum temperature over the window
    pub mean_temp_max: Celsius,
    /// Highest wind speed in the window
    pub max_wind_speed: MetersPerSecond,
    /// Accumulated precipitation over the window
    pub total_precipitation: Millimeters,
}

/// Seasonal outlook anomalies relative to climatology
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalOutlook {
    /// Temperature anomaly (°C)
    pub temperature_anomaly: f64,
    /// Precipitation anomaly (% of normal, signed)
    pub precipitation_anomaly: Percent,
}

/// Long-range warming projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateProjection {
    /// Warming rate (°C per decade)
    pub warming_per_decade: f64,
}

/// Bundle of optional enrichment data for one request
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Enrichment {
    /// Current conditions; present fields override the climatology
    pub realtime: Option<Observation>,
    /// Short-range forecast summary
    pub forecast: Option<ForecastSummary>,
    /// Seasonal outlook
    pub seasonal: Option<SeasonalOutlook>,
    /// Climate projection
    pub climate: Option<ClimateProjection>,
}

impl Enrichment {
    /// `true` when no snippet is present
    pub fn is_empty(&self) -> bool {
        self.realtime.is_none() && self.forecast.is_none() && self.seasonal.is_none() && self.climate.is_none()
    }

    /// Apply the real-time overlay (if any) to a climatology observation
    pub fn apply_realtime(&self, climatology: &Observation) -> Observation {
        match &self.realtime {
            Some(realtime) => climatology.merged_with(realtime),
            None => *climatology,
        }
    }

    /// Extra warming (°C) implied by the projection over `years` years
    pub fn projected_warming(&self, years: f64) -> f64 {
        self.climate
            .map_or(0.0, |c| c.warming_per_decade * years / 10.0)
            .clamp(-5.0, 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bundle_is_a_no_op() {
        let enrichment = Enrichment::default();
        assert!(enrichment.is_empty());
        let obs = Observation::at(10.0, 20.0).with_temperatures(30.0, 20.0);
        assert_eq!(enrichment.apply_realtime(&obs), obs);
        assert_eq!(enrichment.projected_warming(30.0), 0.0);
    }

    #[test]
    fn test_realtime_overrides_present_fields_only() {
        let enrichment = Enrichment {
            realtime: Some(Observation::default().with_wind_speed(22.0)),
            ..Enrichment::default()
        };
        let obs = Observation::at(10.0, 20.0).with_wind_speed(3.0).with_humidity(40.0);
        let merged = enrichment.apply_realtime(&obs);
        assert_eq!(merged.wind_speed, Some(MetersPerSecond::new(22.0)));
        assert_eq!(merged.humidity, Some(Percent::new(40.0)));
    }

    #[test]
    fn test_projected_warming_is_bounded() {
        let enrichment = Enrichment {
            climate: Some(ClimateProjection { warming_per_decade: 0.3 }),
            ..Enrichment::default()
        };
        assert!((enrichment.projected_warming(20.0) - 0.6).abs() < 1e-12);
        assert_eq!(enrichment.projected_warming(10_000.0), 5.0);
    }

    #[test]
    fn test_deserialize_partial_bundle() {
        let json = r#"{"seasonal": {"temperature_anomaly": 1.5, "precipitation_anomaly": -10.0}}"#;
        let enrichment: Enrichment = serde_json::from_str(json).unwrap();
        assert!(enrichment.realtime.is_none());
        assert_eq!(enrichment.seasonal.map(|s| s.temperature_anomaly), Some(1.5));
    }
}
