//! Closed-form regression variant
//!
//! Hand-set formulas standing in for the tree ensemble when no training is
//! wanted. Same inputs, no fitted parameters.

use crate::core_types::{ResolvedObservation, RiskPrediction, TargetDate};

/// Raw (unclamped) risks
pub fn closed_form_risks(obs: &ResolvedObservation, date: TargetDate) -> RiskPrediction {
    let month = date.month;
    let summer = if date.is_june_to_august() { 1.2 } else { 0.8 };
    let winter = if date.is_december_to_february() { 1.3 } else { 0.7 };
    let monsoon = if matches!(month, 6..=9) { 1.5 } else { 1.0 };
    let storm = if date.is_transition_season() { 1.2 } else { 1.0 };

    RiskPrediction {
        extreme_heat: (obs.temp_max - 20.0) * 2.5 * summer * (1.0 - 0.01 * obs.latitude.abs()),
        extreme_cold: (15.0 - obs.temp_min) * 3.0 * winter,
        heavy_precipitation: obs.precipitation.ln_1p() * 8.0 * monsoon * obs.humidity / 100.0,
        strong_winds: 12.0 * obs.wind_speed * storm,
        heat_discomfort: 4.0 * (obs.temp_max + 0.2 * (obs.humidity - 40.0) - 24.0),
    }
}

/// Share (%) of plausibility checks passed: Tmax, humidity, wind in range
pub fn input_validity(obs: &ResolvedObservation) -> f64 {
    let checks = [
        (-50.0..=60.0).contains(&obs.temp_max),
        (0.0..=100.0).contains(&obs.humidity),
        (0.0..=100.0).contains(&obs.wind_speed),
    ];
    checks.iter().filter(|c| **c).count() as f64 / checks.len() as f64 * 100.0
}

/// `0.6 × completeness + 0.4 × validity`, in %
pub fn closed_form_confidence(obs: &ResolvedObservation) -> f64 {
    0.6 * obs.completeness * 100.0 + 0.4 * input_validity(obs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Observation;
    use approx::assert_relative_eq;

    #[test]
    fn test_desert_summer() {
        let obs = Observation::at(25.0, 55.0)
            .with_temperatures(42.0, 28.0)
            .with_humidity(35.0)
            .with_precipitation(0.0)
            .with_wind_speed(5.0)
            .with_pressure(1015.0)
            .resolved();
        let risks = closed_form_risks(&obs, TargetDate::MID_JULY);
        assert_relative_eq!(risks.extreme_heat, 22.0 * 2.5 * 1.2 * 0.75, epsilon = 1e-9);
        assert!(risks.extreme_cold < 0.0);
        assert_relative_eq!(risks.heavy_precipitation, 0.0);
        assert_relative_eq!(risks.strong_winds, 60.0, epsilon = 1e-9);
        assert_relative_eq!(closed_form_confidence(&obs), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_winter_cold() {
        let obs = Observation::at(60.0, 10.0).with_temperatures(-5.0, -15.0).resolved();
        let january = TargetDate { month: 1, day: 15 };
        let risks = closed_form_risks(&obs, january);
        assert_relative_eq!(risks.extreme_cold, 30.0 * 3.0 * 1.3, epsilon = 1e-9);
        // Four of eight fields present
        assert_relative_eq!(closed_form_confidence(&obs), 0.6 * 50.0 + 0.4 * 100.0, epsilon = 1e-9);
    }
}
