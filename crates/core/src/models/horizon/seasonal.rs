//! Seasonal horizon: spectral analysis of a synthetic annual cycle
//!
//! A 365-day temperature cycle is anchored on the observation: the cycle
//! passes through the observed Tmax on the target day, its amplitude grows
//! with latitude and it peaks in local summer. A fixed jitter, drawn once
//! at initialisation, stands in for weather noise. The series is taken to
//! the frequency domain, reduced to its dominant components, and risks are
//! read off the reconstruction over the window following the target date.
//!
//! The DFT is the direct O(N²) sum; at N = 365 that is cheaper than
//! planning an FFT.

use super::features::HorizonInputs;
use super::short_term::std_dev;
use crate::core_types::{RiskPrediction, SeasonalOutlook};
use crate::models::regression::features::heat_index;
use nalgebra::Complex;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Length of the synthetic series (days)
pub const DAYS: usize = 365;

/// Day of year of peak temperature, northern hemisphere
pub const NORTHERN_PEAK_DAY: f64 = 200.0;

/// Day of year of peak temperature, southern hemisphere
pub const SOUTHERN_PEAK_DAY: f64 = 15.0;

/// Highest harmonic counted as a seasonal signal (cycles per year)
const SEASONAL_HARMONICS: usize = 4;

/// Annual temperature amplitude (°C): `3 + 0.25 |lat|`, capped at 20
pub fn annual_amplitude(latitude: f64) -> f64 {
    (3.0 + 0.25 * latitude.abs()).min(20.0)
}

/// DFT coefficients `X_k` for `k = 0..=N/2`
pub fn dft(series: &[f64]) -> Vec<Complex<f64>> {
    let n = series.len();
    (0..=n / 2)
        .map(|k| {
            series.iter().enumerate().fold(Complex::new(0.0, 0.0), |acc, (t, x)| {
                let theta = -2.0 * PI * (k * t) as f64 / n as f64;
                acc + Complex::new(theta.cos(), theta.sin()) * *x
            })
        })
        .collect()
}

/// Indices of the `count` strongest non-constant components, strongest first
pub fn dominant_components(spectrum: &[Complex<f64>], count: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (1..spectrum.len()).collect();
    ranked.sort_by(|a, b| {
        spectrum[*b]
            .norm_sqr()
            .total_cmp(&spectrum[*a].norm_sqr())
            .then(a.cmp(b))
    });
    ranked.truncate(count);
    ranked
}

/// Inverse DFT from the mean plus the kept components
pub fn reconstruct(spectrum: &[Complex<f64>], n: usize, keep: &[usize]) -> Vec<f64> {
    let n_f = n as f64;
    let mean = spectrum.first().map_or(0.0, |x0| x0.re / n_f);
    (0..n)
        .map(|t| {
            mean + keep
                .iter()
                .map(|&k| {
                    let theta = 2.0 * PI * (k * t) as f64 / n_f;
                    let rotated = spectrum[k] * Complex::new(theta.cos(), theta.sin());
                    // Conjugate pair counted once for k < N/2
                    let pair = if 2 * k == n { 1.0 } else { 2.0 };
                    pair * rotated.re / n_f
                })
                .sum::<f64>()
        })
        .collect()
}

/// Seasonal sub-prediction plus diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalOutput {
    /// Risk per category (unchecked)
    pub predictions: RiskPrediction,
    /// Horizon confidence (0-100)
    pub confidence: f64,
    /// Periods of the dominant components (days)
    pub dominant_periods: Vec<f64>,
    /// Share of non-constant power in the dominant components (%)
    pub power_concentration: f64,
    /// Share of dominant power at seasonal harmonics (%)
    pub frequency_stability: f64,
    /// Mean reconstructed temperature over the window (°C)
    pub window_mean_temp: f64,
}

/// Spectral seasonal pipeline with a fixed jitter
#[derive(Debug, Clone)]
pub struct SeasonalModel {
    jitter: Vec<f64>,
    components: usize,
    window_days: usize,
}

impl SeasonalModel {
    /// Draw the jitter from `rng`
    pub fn new<R: Rng + ?Sized>(rng: &mut R, jitter_std: f64, components: usize, window_days: usize) -> Self {
        let jitter = (0..DAYS)
            .map(|_| {
                let z: f64 = StandardNormal.sample(&mut *rng);
                jitter_std * z
            })
            .collect();
        Self {
            jitter,
            components,
            window_days,
        }
    }

    /// Synthetic daily temperature for a year; index 0 is day 1
    ///
    /// # Arguments
    ///
    /// * `inputs` - Observation and target day
    /// * `anomaly` - Outlook temperature anomaly added to every day (°C)
    pub fn annual_cycle(&self, inputs: &HorizonInputs, anomaly: f64) -> Vec<f64> {
        let obs = &inputs.obs;
        let amplitude = annual_amplitude(obs.latitude);
        let peak = if obs.is_northern() {
            NORTHERN_PEAK_DAY
        } else {
            SOUTHERN_PEAK_DAY
        };
        let cycle = |day: f64| (2.0 * PI * (day - peak) / DAYS as f64).cos();
        let anchor = cycle(f64::from(inputs.day_of_year));

        self.jitter
            .iter()
            .enumerate()
            .map(|(i, j)| obs.temp_max + anomaly + amplitude * (cycle((i + 1) as f64) - anchor) + j)
            .collect()
    }

    /// Run the pipeline
    pub fn predict(&self, inputs: &HorizonInputs, outlook: Option<&SeasonalOutlook>) -> SeasonalOutput {
        let obs = &inputs.obs;
        let anomaly = outlook.map_or(0.0, |o| o.temperature_anomaly);
        let precip_anomaly = outlook.map_or(0.0, |o| o.precipitation_anomaly.value());

        let series = self.annual_cycle(inputs, anomaly);
        let spectrum = dft(&series);
        let keep = dominant_components(&spectrum, self.components);
        let reconstruction = reconstruct(&spectrum, series.len(), &keep);

        let start = (inputs.day_of_year as usize).saturating_sub(1) % DAYS;
        let window: Vec<f64> = (0..self.window_days.max(1))
            .map(|d| reconstruction[(start + d) % DAYS])
            .collect();
        let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = window.iter().copied().fold(f64::INFINITY, f64::min);
        let mean = window.iter().sum::<f64>() / window.len() as f64;

        // Wetter in the warm half of the cycle
        let amplitude = annual_amplitude(obs.latitude).max(f64::EPSILON);
        let warmth = ((mean - obs.temp_max) / amplitude).clamp(-1.0, 1.0);
        let moisture = obs.precipitation * (1.0 + 0.5 * warmth) * (1.0 + precip_anomaly / 100.0);

        let predictions = RiskPrediction {
            extreme_heat: 5.0 * (max - 28.0),
            extreme_cold: 5.0 * (5.0 - min),
            heavy_precipitation: 0.5 * obs.humidity + 8.0 * moisture.ln_1p() + 0.3 * precip_anomaly - 10.0,
            strong_winds: 6.0 * obs.wind_speed + 2.0 * std_dev(&window),
            heat_discomfort: 4.0 * (heat_index(mean, obs.humidity) - 26.0),
        };

        let power = |k: &usize| spectrum[*k].norm_sqr();
        let total: f64 = (1..spectrum.len()).map(|k| power(&k)).sum();
        let dominant: f64 = keep.iter().map(power).sum();
        let seasonal: f64 = keep.iter().filter(|k| **k <= SEASONAL_HARMONICS).map(power).sum();
        let power_concentration = if total > 0.0 { dominant / total * 100.0 } else { 50.0 };
        let frequency_stability = if dominant > 0.0 { seasonal / dominant * 100.0 } else { 80.0 };

        SeasonalOutput {
            predictions,
            confidence: ((power_concentration + frequency_stability) / 2.0).clamp(0.0, 100.0),
            dominant_periods: keep.iter().map(|k| DAYS as f64 / *k as f64).collect(),
            power_concentration,
            frequency_stability,
            window_mean_temp: mean,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Observation, Percent, TargetDate};
    use crate::models::PredictionRequest;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model(jitter: f64) -> SeasonalModel {
        SeasonalModel::new(&mut StdRng::seed_from_u64(7), jitter, 5, 90)
    }

    fn inputs(obs: Observation) -> HorizonInputs {
        HorizonInputs::from_request(&PredictionRequest::new(obs, TargetDate::MID_JULY, None, 2025, None))
    }

    fn desert() -> Observation {
        Observation::at(25.2, 55.27)
            .with_temperatures(42.0, 28.0)
            .with_humidity(35.0)
            .with_precipitation(0.1)
            .with_wind_speed(8.0)
            .with_pressure(1015.0)
    }

    fn polar() -> Observation {
        Observation::at(-77.8, 166.7)
            .with_temperatures(-25.0, -35.0)
            .with_humidity(60.0)
            .with_precipitation(0.5)
            .with_wind_speed(30.0)
            .with_pressure(980.0)
    }

    #[test]
    fn test_jitter_is_seeded_gaussian() {
        let a = model(0.8);
        assert_eq!(a.jitter, model(0.8).jitter);
        assert_eq!(a.jitter.len(), DAYS);

        let mean = a.jitter.iter().sum::<f64>() / DAYS as f64;
        assert!(mean.abs() < 0.2, "mean {mean}");
        assert!((0.6..1.0).contains(&std_dev(&a.jitter)), "std {}", std_dev(&a.jitter));
        assert!(model(0.0).jitter.iter().all(|j| *j == 0.0));
    }

    #[test]
    fn test_dft_of_pure_cosine() {
        let n = 64;
        let series: Vec<f64> = (0..n)
            .map(|t| 3.0 + 2.0 * (2.0 * PI * 5.0 * t as f64 / n as f64).cos())
            .collect();
        let spectrum = dft(&series);
        assert_relative_eq!(spectrum[0].re, 3.0 * n as f64, epsilon = 1e-9);
        assert_relative_eq!(spectrum[5].norm(), n as f64, epsilon = 1e-9);
        assert_eq!(dominant_components(&spectrum, 1), vec![5]);

        let rebuilt = reconstruct(&spectrum, n, &[5]);
        for (a, b) in rebuilt.iter().zip(&series) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_cycle_is_anchored_on_observation() {
        let m = model(0.0);
        let series = m.annual_cycle(&inputs(desert()), 0.0);
        assert_eq!(series.len(), DAYS);
        // 15 July 2025 is day 196
        assert_relative_eq!(series[195], 42.0, epsilon = 1e-9);
        let warmest = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(warmest - 42.0, 9.3 * (1.0 - (2.0 * PI * 4.0 / 365.0).cos()), epsilon = 1e-9);
    }

    #[test]
    fn test_amplitude_cap() {
        assert_relative_eq!(annual_amplitude(0.0), 3.0);
        assert_relative_eq!(annual_amplitude(-40.0), 13.0);
        assert_relative_eq!(annual_amplitude(80.0), 20.0);
    }

    #[test]
    fn test_desert_and_polar_risks() {
        let m = model(0.8);
        let hot = m.predict(&inputs(desert()), None);
        assert!(hot.predictions.extreme_heat > 50.0);
        assert!(hot.predictions.extreme_cold < 0.0);

        let cold = m.predict(&inputs(polar()), None);
        assert!(cold.predictions.extreme_cold > 100.0);
        assert!(cold.predictions.extreme_heat < 0.0);
    }

    #[test]
    fn test_annual_component_dominates() {
        let out = model(0.8).predict(&inputs(desert()), None);
        assert_relative_eq!(out.dominant_periods[0], 365.0);
        assert!(out.power_concentration > 90.0, "{}", out.power_concentration);
        assert!(out.frequency_stability > 90.0, "{}", out.frequency_stability);
        assert!((0.0..=100.0).contains(&out.confidence));
    }

    #[test]
    fn test_outlook_anomaly_shifts_cycle() {
        let m = model(0.8);
        let outlook = SeasonalOutlook {
            temperature_anomaly: 2.0,
            precipitation_anomaly: Percent::new(0.0),
        };
        let base = m.predict(&inputs(desert()), None);
        let warm = m.predict(&inputs(desert()), Some(&outlook));
        assert_relative_eq!(warm.window_mean_temp - base.window_mean_temp, 2.0, epsilon = 1e-6);
        assert_relative_eq!(warm.predictions.extreme_heat - base.predictions.extreme_heat, 10.0, epsilon = 1e-6);
    }
}
