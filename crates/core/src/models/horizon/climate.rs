//! Climate horizon: Lorenz dynamics plus a warming offset
//!
//! The Lorenz-63 system is seeded from normalised temperature, humidity and
//! pressure and integrated with classical RK4. Trajectory spread scales the
//! tails of the temperature distribution; a correlation-based Lyapunov
//! estimate scores predictability. The target year shifts temperatures by
//! the corpus warming trend and any supplied projection.
//!
//! # References
//! - Lorenz, E.N. (1963). "Deterministic Nonperiodic Flow". Journal of the
//!   Atmospheric Sciences, 20(2), 130-141.
//! - Wolf, A., Swift, J.B., Swinney, H.L. & Vastano, J.A. (1985).
//!   "Determining Lyapunov exponents from a time series". Physica D, 16(3).

use super::features::HorizonInputs;
use crate::core_types::{Enrichment, RiskPrediction};
use crate::models::regression::corpus::{TREND_START_YEAR, WARMING_PER_YEAR};
use crate::models::regression::features::heat_index;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Lorenz system constants
pub mod constants {
    /// Prandtl number σ
    pub const SIGMA: f64 = 10.0;

    /// Rayleigh number ρ
    pub const RHO: f64 = 28.0;

    /// Geometric factor β
    pub const BETA: f64 = 8.0 / 3.0;

    /// Samples compared at each end of the trajectory for the Lyapunov estimate
    pub const LYAPUNOV_WINDOW: usize = 100;

    /// Lyapunov estimate used when the trajectory is too short to compare
    pub const DEFAULT_LYAPUNOV: f64 = 0.1;

    /// Typical standard deviation of x on the attractor
    pub const X_SPREAD: f64 = 8.0;
}

use constants::{BETA, DEFAULT_LYAPUNOV, LYAPUNOV_WINDOW, RHO, SIGMA, X_SPREAD};

/// Time derivative of the Lorenz system
pub fn lorenz_derivative(s: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(
        SIGMA * (s.y - s.x),
        s.x * (RHO - s.z) - s.y,
        s.x * s.y - BETA * s.z,
    )
}

/// One classical Runge-Kutta step
pub fn rk4_step(s: &Vector3<f64>, dt: f64) -> Vector3<f64> {
    let k1 = lorenz_derivative(s);
    let k2 = lorenz_derivative(&(s + k1 * (dt / 2.0)));
    let k3 = lorenz_derivative(&(s + k2 * (dt / 2.0)));
    let k4 = lorenz_derivative(&(s + k3 * dt));
    s + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
}

/// States after each of `steps` RK4 steps
pub fn integrate(initial: Vector3<f64>, steps: usize, dt: f64) -> Vec<Vector3<f64>> {
    let mut trajectory = Vec::with_capacity(steps);
    let mut state = initial;
    for _ in 0..steps {
        state = rk4_step(&state, dt);
        trajectory.push(state);
    }
    trajectory
}

/// Initial state from the observation
///
/// `x0 = 1 + (Tmax - 15)/5`, `y0 = 1 + (RH - 50)/10`,
/// `z0 = 20 + (p - 1013.25)/5`, clamped to keep the start near the attractor.
pub fn initial_state(inputs: &HorizonInputs) -> Vector3<f64> {
    let o = &inputs.obs;
    Vector3::new(
        (1.0 + (o.temp_max - 15.0) / 5.0).clamp(-20.0, 20.0),
        (1.0 + (o.humidity - 50.0) / 10.0).clamp(-20.0, 20.0),
        (20.0 + (o.pressure - 1013.25) / 5.0).clamp(0.0, 50.0),
    )
}

/// Pearson correlation; 1 when either series is constant
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 1.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    if var_a <= 0.0 || var_b <= 0.0 {
        1.0
    } else {
        cov / (var_a * var_b).sqrt()
    }
}

/// Lyapunov-style divergence estimate for one coordinate
///
/// Compares the first and last [`LYAPUNOV_WINDOW`] samples:
/// `λ = -ln(|ρ| + 1e-10) / window`.
pub fn lyapunov_estimate(series: &[f64]) -> f64 {
    if series.len() < 2 * LYAPUNOV_WINDOW {
        return DEFAULT_LYAPUNOV;
    }
    let early = &series[..LYAPUNOV_WINDOW];
    let late = &series[series.len() - LYAPUNOV_WINDOW..];
    -(correlation(early, late).abs() + 1e-10).ln() / LYAPUNOV_WINDOW as f64
}

/// Summary statistics per coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStats {
    /// Mean of x, y, z
    pub mean: [f64; 3],
    /// Standard deviation of x, y, z
    pub std: [f64; 3],
    /// Max minus min of x, y, z
    pub range: [f64; 3],
    /// Mean step-to-step change of x, y, z
    pub trend: [f64; 3],
    /// Lyapunov estimate of x, y, z
    pub lyapunov: [f64; 3],
}

impl TrajectoryStats {
    /// Statistics of a trajectory
    pub fn from_trajectory(trajectory: &[Vector3<f64>]) -> Self {
        let mut stats = Self {
            mean: [0.0; 3],
            std: [0.0; 3],
            range: [0.0; 3],
            trend: [0.0; 3],
            lyapunov: [DEFAULT_LYAPUNOV; 3],
        };
        if trajectory.is_empty() {
            return stats;
        }
        for dim in 0..3 {
            let series: Vec<f64> = trajectory.iter().map(|s| s[dim]).collect();
            let n = series.len() as f64;
            let mean = series.iter().sum::<f64>() / n;
            let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = series.iter().copied().fold(f64::INFINITY, f64::min);
            stats.mean[dim] = mean;
            stats.std[dim] = (series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
            stats.range[dim] = max - min;
            stats.trend[dim] = if series.len() > 1 {
                (series[series.len() - 1] - series[0]) / (n - 1.0)
            } else {
                0.0
            };
            stats.lyapunov[dim] = lyapunov_estimate(&series);
        }
        stats
    }

    /// Largest Lyapunov estimate
    pub fn max_lyapunov(&self) -> f64 {
        self.lyapunov.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Climate sub-prediction plus diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateOutput {
    /// Risk per category (unchecked)
    pub predictions: RiskPrediction,
    /// Horizon confidence (0-100)
    pub confidence: f64,
    /// Lorenz starting point
    pub initial_state: [f64; 3],
    /// Trajectory statistics
    pub trajectory: TrajectoryStats,
    /// Warming applied for the target year (°C)
    pub warming_offset: f64,
    /// Predictability score (0-100)
    pub predictability: f64,
    /// Stability score (0-100)
    pub stability: f64,
    /// Long-term reliability score (30-80)
    pub long_term_reliability: f64,
}

/// Lorenz-driven climate pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateModel {
    steps: usize,
    dt: f64,
}

impl ClimateModel {
    /// Pipeline integrating `steps` RK4 steps of size `dt`
    pub fn new(steps: usize, dt: f64) -> Self {
        Self { steps, dt }
    }

    /// Warming for the target year: corpus trend from 2020 plus any projection
    pub fn warming_offset(inputs: &HorizonInputs, enrichment: &Enrichment) -> f64 {
        f64::from(inputs.target_year - TREND_START_YEAR) * WARMING_PER_YEAR
            + enrichment.projected_warming(f64::from(inputs.year_offset))
    }

    /// Run the pipeline
    pub fn predict(&self, inputs: &HorizonInputs, enrichment: &Enrichment) -> ClimateOutput {
        let o = &inputs.obs;
        let start = initial_state(inputs);
        let trajectory = integrate(start, self.steps, self.dt);
        let stats = TrajectoryStats::from_trajectory(&trajectory);
        let warming = Self::warming_offset(inputs, enrichment);

        let variability = stats.std[0] / X_SPREAD;
        let spread = 3.0 + 2.0 * variability;
        let predictions = RiskPrediction {
            extreme_heat: 5.0 * (o.temp_max + warming + spread - 32.0),
            extreme_cold: 5.0 * (spread - warming - o.temp_min - 5.0),
            heavy_precipitation: 0.4 * o.humidity + 6.0 * o.precipitation.ln_1p() + 5.0 * variability + 2.0 * warming,
            strong_winds: 5.0 * o.wind_speed + 10.0 * variability,
            heat_discomfort: 3.0 * (heat_index(o.temp_max + warming, o.humidity) - 26.0) + 5.0 * variability,
        };

        let max_lyapunov = stats.max_lyapunov();
        let predictability = (100.0 - 50.0 * max_lyapunov).clamp(0.0, 100.0);
        let stability = (100.0 - 2.0 * stats.std.iter().sum::<f64>() / 3.0).clamp(0.0, 100.0);
        let long_term_reliability =
            (80.0 - 20.0 * max_lyapunov - 2.0 * f64::from(inputs.year_offset.abs())).clamp(30.0, 80.0);

        ClimateOutput {
            predictions,
            confidence: (predictability + stability + long_term_reliability) / 3.0,
            initial_state: [start.x, start.y, start.z],
            trajectory: stats,
            warming_offset: warming,
            predictability,
            stability,
            long_term_reliability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{ClimateProjection, Observation, TargetDate};
    use crate::models::PredictionRequest;
    use approx::assert_relative_eq;

    fn inputs(obs: Observation, year: i32) -> HorizonInputs {
        HorizonInputs::from_request(&PredictionRequest::new(obs, TargetDate::MID_JULY, Some(year), 2025, None))
    }

    fn desert() -> Observation {
        Observation::at(25.2, 55.27)
            .with_temperatures(42.0, 28.0)
            .with_humidity(35.0)
            .with_precipitation(0.1)
            .with_wind_speed(8.0)
            .with_pressure(1015.0)
    }

    #[test]
    fn test_fixed_point_is_stationary() {
        let c = (BETA * (RHO - 1.0)).sqrt();
        let fixed = Vector3::new(c, c, RHO - 1.0);
        assert!(lorenz_derivative(&fixed).norm() < 1e-12);
        let after = rk4_step(&fixed, 0.01);
        assert!((after - fixed).norm() < 1e-12);
    }

    #[test]
    fn test_trajectory_stays_on_attractor() {
        let trajectory = integrate(Vector3::new(1.0, 1.0, 20.0), 730, 0.01);
        assert_eq!(trajectory.len(), 730);
        for s in &trajectory {
            assert!(s.x.abs() < 30.0 && s.y.abs() < 40.0 && (0.0..60.0).contains(&s.z));
        }
    }

    #[test]
    fn test_initial_state_clamps() {
        let hot = Observation::at(0.0, 0.0).with_temperatures(500.0, 0.0).with_pressure(2000.0);
        let s = initial_state(&inputs(hot, 2025));
        assert_eq!(s.x, 20.0);
        assert_eq!(s.z, 50.0);
        let s = initial_state(&inputs(desert(), 2025));
        assert_relative_eq!(s.x, 1.0 + 27.0 / 5.0);
        assert_relative_eq!(s.y, -0.5);
    }

    #[test]
    fn test_correlation() {
        assert_relative_eq!(correlation(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), 1.0);
        assert_relative_eq!(correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]), -1.0);
        assert_eq!(correlation(&[1.0, 1.0], &[1.0, 2.0]), 1.0);
        assert_eq!(lyapunov_estimate(&[0.0; 10]), DEFAULT_LYAPUNOV);
    }

    #[test]
    fn test_later_years_are_warmer() {
        let model = ClimateModel::new(730, 0.01);
        let none = Enrichment::default();
        let now = model.predict(&inputs(desert(), 2025), &none);
        let later = model.predict(&inputs(desert(), 2045), &none);
        assert_relative_eq!(later.warming_offset - now.warming_offset, 1.0, epsilon = 1e-12);
        assert!(later.predictions.extreme_heat > now.predictions.extreme_heat);
        assert!(later.long_term_reliability < now.long_term_reliability);
    }

    #[test]
    fn test_projection_adds_warming() {
        let enrichment = Enrichment {
            climate: Some(ClimateProjection {
                warming_per_decade: 0.3,
            }),
            ..Enrichment::default()
        };
        let offset = ClimateModel::warming_offset(&inputs(desert(), 2035), &enrichment);
        let base = ClimateModel::warming_offset(&inputs(desert(), 2035), &Enrichment::default());
        assert_relative_eq!(offset - base, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_scores_bounded() {
        let out = ClimateModel::new(730, 0.01).predict(&inputs(desert(), 2025), &Enrichment::default());
        assert!((0.0..=100.0).contains(&out.confidence));
        assert!((30.0..=80.0).contains(&out.long_term_reliability));
        assert!(out.predictions.extreme_heat > 50.0);
        assert!(out.predictions.extreme_cold < 0.0);
    }
}
