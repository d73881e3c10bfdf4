//! Short-term horizon: layered pipeline over standardised inputs
//!
//! Three dense layers with dilated connectivity (unit `i` of a layer with
//! dilation `d` only reads inputs `j` with `j ≡ i (mod d)`), each followed
//! by ReLU. Attention pooling mixes the three layer outputs; a dense readout
//! produces a residual per category that is squashed by `tanh` and added to
//! physically-motivated prior logits.
//!
//! Weights are drawn once from a seeded generator and never trained, so the
//! residual is bounded by `residual_scale` in logit space and the prior
//! carries the physical signal.
//!
//! # References
//! - Yu, F. & Koltun, V. (2016). "Multi-Scale Context Aggregation by Dilated
//!   Convolutions". ICLR.
//! - Bahdanau, D., Cho, K. & Bengio, Y. (2015). "Neural Machine Translation
//!   by Jointly Learning to Align and Translate". ICLR.

use super::features::{HorizonInputs, N_INPUTS};
use crate::core_types::{ForecastSummary, RiskCategory, RiskPrediction};
use crate::models::regression::features::heat_index;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

/// Dilation of each layer, input side first
const DILATIONS: [usize; 3] = [1, 2, 4];

/// Weight of the forecast mean Tmax in the blended temperature
const FORECAST_BLEND: f64 = 0.5;

/// Dense layer with dilated connectivity
#[derive(Debug, Clone)]
struct DilatedLayer {
    weights: DMatrix<f64>,
    bias: DVector<f64>,
}

impl DilatedLayer {
    fn new<R: Rng + ?Sized>(rng: &mut R, outputs: usize, inputs: usize, dilation: usize) -> Self {
        let scale = (dilation as f64 / inputs as f64).sqrt();
        let weights = DMatrix::from_fn(outputs, inputs, |i, j| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            if j % dilation == i % dilation { z * scale } else { 0.0 }
        });
        let bias = DVector::from_fn(outputs, |_, _| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            0.1 * z
        });
        Self { weights, bias }
    }

    fn forward(&self, x: &DVector<f64>) -> DVector<f64> {
        (&self.weights * x + &self.bias).map(|v| v.max(0.0))
    }
}

/// Short-term sub-prediction plus diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortTermOutput {
    /// Risk per category (0-100, unchecked)
    pub predictions: RiskPrediction,
    /// Horizon confidence (0-100)
    pub confidence: f64,
    /// Attention weight per layer
    pub attention: Vec<f64>,
    /// Standard deviation of the last hidden layer
    pub hidden_dispersion: f64,
    /// Temperature the pipeline ran on (°C), after any forecast blend
    pub effective_temp_max: f64,
}

/// Fixed-weight layered pipeline
#[derive(Debug, Clone)]
pub struct ShortTermNetwork {
    layers: Vec<DilatedLayer>,
    attention_query: DVector<f64>,
    readout: DMatrix<f64>,
    readout_bias: DVector<f64>,
    residual_scale: f64,
}

/// Logistic function
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Prior logits from the raw observation
///
/// Each category crosses 50 % where a simple physical threshold is
/// crossed: Tmax 32 °C, Tmin 0 °C, 10 mm/day at 70 % RH, 12 m/s and a
/// heat index of 30 °C.
pub fn prior_logits(inputs: &HorizonInputs) -> RiskPrediction {
    let o = &inputs.obs;
    RiskPrediction {
        extreme_heat: (o.temp_max - 32.0) / 4.0,
        extreme_cold: -o.temp_min / 5.0,
        heavy_precipitation: (o.precipitation - 10.0) / 5.0 + (o.humidity - 70.0) / 20.0,
        strong_winds: (o.wind_speed - 12.0) / 4.0,
        heat_discomfort: (heat_index(o.temp_max, o.humidity) - 30.0) / 4.0,
    }
}

impl ShortTermNetwork {
    /// Draw weights from `rng`
    pub fn new<R: Rng + ?Sized>(rng: &mut R, width: usize, residual_scale: f64) -> Self {
        let mut layers = Vec::with_capacity(DILATIONS.len());
        let mut fan_in = N_INPUTS;
        for dilation in DILATIONS {
            layers.push(DilatedLayer::new(rng, width, fan_in, dilation));
            fan_in = width;
        }
        let attention_query: DVector<f64> = DVector::from_fn(width, |_, _| StandardNormal.sample(&mut *rng));
        let readout_scale = (1.0 / width as f64).sqrt();
        let readout = DMatrix::from_fn(RiskCategory::ALL.len(), width, |_, _| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            z * readout_scale
        });
        let readout_bias = DVector::from_fn(RiskCategory::ALL.len(), |_, _| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            0.1 * z
        });
        Self {
            layers,
            attention_query,
            readout,
            readout_bias,
            residual_scale,
        }
    }

    /// Run the pipeline
    ///
    /// # Arguments
    ///
    /// * `inputs` - Observation and calendar context
    /// * `forecast` - Optional forecast; its mean Tmax is blended into the
    ///   temperature input
    pub fn predict(&self, inputs: &HorizonInputs, forecast: Option<&ForecastSummary>) -> ShortTermOutput {
        let inputs = match forecast {
            Some(f) => inputs.with_temp_max(
                (1.0 - FORECAST_BLEND) * inputs.obs.temp_max + FORECAST_BLEND * f.mean_temp_max.value(),
            ),
            None => *inputs,
        };

        let mut hidden = Vec::with_capacity(self.layers.len());
        let mut x = inputs.standardised();
        for layer in &self.layers {
            x = layer.forward(&x);
            hidden.push(x.clone());
        }

        let attention = self.attention_weights(&hidden);
        let width = self.attention_query.len();
        let pooled = hidden
            .iter()
            .zip(&attention)
            .fold(DVector::zeros(width), |acc, (h, a)| acc + h * *a);

        let residual = (&self.readout * pooled + &self.readout_bias).map(f64::tanh);
        let prior = prior_logits(&inputs);
        let mut predictions = RiskPrediction::default();
        for category in RiskCategory::ALL {
            let logit = prior.get(category) + self.residual_scale * residual[category.index()];
            predictions.set(category, sigmoid(logit) * 100.0);
        }

        let last = hidden.last().map_or_else(|| DVector::zeros(0), Clone::clone);
        let hidden_dispersion = std_dev(last.as_slice());
        let attention_confidence = (100.0 - 50.0 * hidden_dispersion).clamp(0.0, 100.0);
        let data_quality = (90.0 - 20.0 * hidden_dispersion).clamp(50.0, 100.0);

        ShortTermOutput {
            predictions,
            confidence: (attention_confidence + data_quality) / 2.0,
            attention,
            hidden_dispersion,
            effective_temp_max: inputs.obs.temp_max,
        }
    }

    /// Softmax of scaled query-layer dot products
    fn attention_weights(&self, hidden: &[DVector<f64>]) -> Vec<f64> {
        let scale = (self.attention_query.len() as f64).sqrt();
        let scores: Vec<f64> = hidden.iter().map(|h| self.attention_query.dot(h) / scale).collect();
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        exp.iter().map(|e| e / total).collect()
    }
}

/// Population standard deviation; 0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Celsius, MetersPerSecond, Millimeters, Observation, TargetDate};
    use crate::models::PredictionRequest;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn network() -> ShortTermNetwork {
        ShortTermNetwork::new(&mut StdRng::seed_from_u64(7), 16, 0.5)
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

    #[test]
    fn test_prior_dominates_direction() {
        let out = network().predict(&inputs(desert()), None);
        // Prior logit 2.5 minus at most 0.5 of residual
        assert!(out.predictions.extreme_heat > sigmoid(2.0) * 100.0 - 1e-9);
        assert!(out.predictions.extreme_cold < sigmoid(-5.1) * 100.0 + 1e-9);
        assert!(out.predictions.is_within_bounds());
        assert!((0.0..=100.0).contains(&out.confidence));
    }

    #[test]
    fn test_attention_is_a_distribution() {
        let out = network().predict(&inputs(desert()), None);
        assert_eq!(out.attention.len(), 3);
        assert_relative_eq!(out.attention.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(out.attention.iter().all(|a| *a >= 0.0));
    }

    #[test]
    fn test_forecast_blend() {
        let forecast = ForecastSummary {
            mean_temp_max: Celsius::new(30.0),
            max_wind_speed: MetersPerSecond::new(10.0),
            total_precipitation: Millimeters::new(0.0),
        };
        let net = network();
        let blended = net.predict(&inputs(desert()), Some(&forecast));
        assert_relative_eq!(blended.effective_temp_max, 36.0);
        let plain = net.predict(&inputs(desert()), None);
        assert!(blended.predictions.extreme_heat < plain.predictions.extreme_heat);
    }

    #[test]
    fn test_same_seed_same_weights() {
        let a = network().predict(&inputs(desert()), None);
        let b = network().predict(&inputs(desert()), None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[]), 0.0);
        assert_relative_eq!(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
    }
}
