//! Property tests over random observations
//!
//! Bounds and normalisation must hold for any finite observation the
//! boundary layer accepts; the physics cold risk must be monotone in
//! temperature below its activation threshold.

mod common;

use common::coordinator;
use proptest::prelude::*;
use risk_ensemble_core::models::physics::{cold_risk, constants::COLD_ACTIVATION, PhysicsModel};
use risk_ensemble_core::{Observation, UncertaintyLevel};

prop_compose! {
    fn observations()(
        lat in -90.0..=90.0f64,
        lon in -180.0..=180.0f64,
        temp_min in -60.0..40.0f64,
        spread in 0.0..25.0f64,
        humidity in 0.0..=100.0f64,
        precipitation in 0.0..80.0f64,
        wind in 0.0..45.0f64,
        pressure in 940.0..1060.0f64,
    ) -> Observation {
        Observation::at(lat, lon)
            .with_temperatures(temp_min + spread, temp_min)
            .with_humidity(humidity)
            .with_precipitation(precipitation)
            .with_wind_speed(wind)
            .with_pressure(pressure)
    }
}

fn dates() -> impl Strategy<Value = String> {
    (1u32..=12, 1u32..=28).prop_map(|(m, d)| format!("{m:02}-{d:02}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_every_probability_in_range(
        obs in observations(),
        date in dates(),
        year in prop::option::of(1990i32..2060),
    ) {
        prop_assert!(obs.validate().is_ok());
        let result = coordinator().predict(&obs, &date, None, year);

        prop_assert!(result.predictions.is_within_bounds());
        for output in result.model_breakdown.values() {
            prop_assert!(output.predictions.is_within_bounds());
        }
        let overall = result.confidence_metrics.overall_confidence;
        prop_assert!((0.0..=100.0).contains(&overall));
        prop_assert!(matches!(
            result.confidence_metrics.uncertainty_level,
            UncertaintyLevel::Low | UncertaintyLevel::Moderate | UncertaintyLevel::High
        ));
    }

    #[test]
    fn prop_weights_normalised(obs in observations(), date in dates()) {
        let result = coordinator().predict(&obs, &date, None, None);
        for weights in result.adaptive_weights.values() {
            let sum: f64 = weights.values().sum();
            prop_assert!((sum - 1.0).abs() < 1e-9, "weights sum to {}", sum);
        }
    }
}

proptest! {
    #[test]
    fn prop_colder_never_lowers_cold_risk(
        temp in -60.0..COLD_ACTIVATION,
        drop in 0.0..30.0f64,
        wind in 0.0..45.0f64,
        humidity in 0.0..=100.0f64,
    ) {
        let warmer = cold_risk(temp, wind, humidity);
        let colder = cold_risk(temp - drop, wind, humidity);
        prop_assert!(colder >= warmer, "{} at {} vs {} at {}", colder, temp - drop, warmer, temp);
    }

    #[test]
    fn prop_physics_model_cold_monotone(
        temp_min in -60.0..COLD_ACTIVATION,
        drop in 0.0..30.0f64,
        wind in 0.0..45.0f64,
    ) {
        let obs = |t: f64| Observation::at(45.0, 0.0)
            .with_temperatures(t + 8.0, t)
            .with_humidity(50.0)
            .with_wind_speed(wind)
            .resolved();
        let warmer = PhysicsModel::risks(&obs(temp_min)).extreme_cold;
        let colder = PhysicsModel::risks(&obs(temp_min - drop)).extreme_cold;
        prop_assert!(colder >= warmer);
    }
}
