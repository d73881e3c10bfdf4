//! Shared fixtures for the integration tests
//!
//! One compact coordinator is trained per test binary and shared through a
//! `OnceLock`; tracing output goes to the test writer.

#![allow(dead_code)]

use ctor::ctor;
use risk_ensemble_core::{EnsembleConfig, EnsembleCoordinator, Observation};
use std::sync::OnceLock;

/// Year every fixture treats as "now"
pub const REFERENCE_YEAR: i32 = 2025;

#[ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Compact configuration pinned to [`REFERENCE_YEAR`]
pub fn config() -> EnsembleConfig {
    EnsembleConfig::compact().with_reference_year(REFERENCE_YEAR)
}

/// Coordinator shared by every test in the binary
pub fn coordinator() -> &'static EnsembleCoordinator {
    static COORDINATOR: OnceLock<EnsembleCoordinator> = OnceLock::new();
    COORDINATOR.get_or_init(|| EnsembleCoordinator::new(&config()).expect("compact config is valid"))
}

/// Scenario A: desert summer
pub fn desert() -> Observation {
    Observation::at(25.2, 55.27)
        .with_temperatures(42.0, 28.0)
        .with_humidity(35.0)
        .with_precipitation(0.1)
        .with_wind_speed(8.0)
        .with_pressure(1015.0)
}

/// Scenario B: Antarctic winter
pub fn polar() -> Observation {
    Observation::at(-77.8, 166.7)
        .with_temperatures(-25.0, -35.0)
        .with_humidity(60.0)
        .with_precipitation(0.5)
        .with_wind_speed(30.0)
        .with_pressure(980.0)
}
