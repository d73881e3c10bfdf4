//! Risk models and the contract the ensemble drives them through
//!
//! Every model implements [`ModelAdapter`]. The coordinator holds them as
//! `Box<dyn ModelAdapter>` and never needs to know which concrete model is
//! behind a box, mirroring how a backend is picked once and then used
//! through a trait object.
//!
//! # Models
//!
//! - [`StatisticalModel`]: climate-zone baselines with seasonal factors
//! - [`PhysicsModel`]: WBGT, wind chill, moisture and geostrophic wind
//! - [`RegressionModel`]: engineered features into a tree ensemble trained
//!   on a synthetic corpus, or a closed-form variant
//! - [`HorizonModel`]: short-term, seasonal and climate pipelines combined
//!   by a meta-ensemble
//!
//! # Backend Selection
//!
//! The regression backend is chosen once at construction from
//! [`RegressionConfig::backend`](crate::config::RegressionConfig); see
//! [`create_regression_model`].

pub mod horizon;
pub mod physics;
pub mod regression;
pub mod statistical;

pub use horizon::{HorizonDetail, HorizonModel};
pub use physics::{PhysicsDetail, PhysicsModel};
pub use regression::{RegressionDetail, RegressionModel};
pub use statistical::{StatisticalDetail, StatisticalModel};

use crate::config::{EnsembleConfig, RegressionBackend, RegressionConfig};
use crate::core_types::{Enrichment, Observation, ResolvedObservation, RiskPrediction, TargetDate};
use crate::error::{ModelFailure, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Identity of a model in the ensemble
///
/// Ordering is the order of the model breakdown map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Climate-zone statistical model
    Statistical,
    /// Thermodynamic formula model
    Physics,
    /// Engineered-feature regression model
    Regression,
    /// Multi-horizon heuristic model
    Horizon,
}

impl ModelKind {
    /// Every model kind in breakdown order
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Statistical,
        ModelKind::Physics,
        ModelKind::Regression,
        ModelKind::Horizon,
    ];

    /// Wire name
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Statistical => "statistical",
            ModelKind::Physics => "physics",
            ModelKind::Regression => "regression",
            ModelKind::Horizon => "horizon",
        }
    }

    /// Methodology label used in innovation metrics and summaries
    pub fn methodology(self) -> &'static str {
        match self {
            ModelKind::Statistical => "Statistical Analysis",
            ModelKind::Physics => "Atmospheric Physics",
            ModelKind::Regression => "Feature Regression",
            ModelKind::Horizon => "Multi-Horizon Heuristics",
        }
    }

    /// Named algorithms this model exercises
    pub fn algorithms(self) -> &'static [&'static str] {
        match self {
            ModelKind::Statistical => &[],
            ModelKind::Physics => &["WBGT", "Geostrophic Wind", "Coriolis Effect"],
            ModelKind::Regression => &["Random Forest", "Gradient Boosting"],
            ModelKind::Horizon => &[
                "Dilated Layers",
                "Attention Pooling",
                "Lorenz Dynamics",
                "Spectral Analysis",
            ],
        }
    }

    /// Prediction techniques this model contributes
    pub fn techniques(self) -> &'static [&'static str] {
        match self {
            ModelKind::Statistical => &["Percentile Analysis"],
            ModelKind::Horizon => &["Multi-Horizon Meta-Ensemble"],
            ModelKind::Physics | ModelKind::Regression => &[],
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether an output is a real prediction or a substituted fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelStatus {
    /// Computed normally
    Ok,
    /// The model failed; its documented fallback was used
    Fallback {
        /// Failure description
        reason: String,
    },
}

/// Model-specific diagnostic record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelDetail {
    /// Statistical model internals
    Statistical(StatisticalDetail),
    /// Physics model internals
    Physics(PhysicsDetail),
    /// Regression model internals
    Regression(RegressionDetail),
    /// Horizon model internals
    Horizon(Box<HorizonDetail>),
}

/// One model's contribution for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    /// Risk probability per category (0-100)
    pub predictions: RiskPrediction,
    /// Self-reported confidence (0-100)
    pub confidence: f64,
    /// Method tag (`tree_ensemble`, `closed_form`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Diagnostic record; absent on fallbacks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ModelDetail>,
    /// Ok or fallback
    pub status: ModelStatus,
}

impl ModelOutput {
    /// Successful output from raw (unclamped) values
    ///
    /// Rejects NaN or infinite probabilities and confidence, then clamps
    /// everything into [0, 100].
    ///
    /// # Errors
    ///
    /// [`ModelFailure::NonFinite`] naming the first offending quantity
    pub fn checked(
        kind: ModelKind,
        raw: RiskPrediction,
        confidence: f64,
        method: Option<&str>,
        detail: Option<ModelDetail>,
    ) -> ModelResult<Self> {
        if let Some(category) = raw.first_non_finite() {
            return Err(ModelFailure::non_finite(format!("{kind} {category}")));
        }
        if !confidence.is_finite() {
            return Err(ModelFailure::non_finite(format!("{kind} confidence")));
        }
        Ok(Self {
            predictions: raw.clamped(),
            confidence: confidence.clamp(0.0, 100.0),
            method: method.map(str::to_string),
            detail,
            status: ModelStatus::Ok,
        })
    }

    /// Fixed fallback output
    pub fn fallback(predictions: RiskPrediction, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            predictions: predictions.clamped(),
            confidence: confidence.clamp(0.0, 100.0),
            method: Some("fallback".to_string()),
            detail: None,
            status: ModelStatus::Fallback { reason: reason.into() },
        }
    }

    /// `true` for a substituted fallback
    pub fn is_fallback(&self) -> bool {
        matches!(self.status, ModelStatus::Fallback { .. })
    }
}

/// Everything a model sees for one request
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    /// Climatology with real-time conditions overlaid
    pub observation: Observation,
    /// Climatology as extracted, without overlays
    pub climatology: Observation,
    /// Target calendar date
    pub date: TargetDate,
    /// Day of year of `date` in `target_year`
    pub day_of_year: u32,
    /// Year the estimate is for
    pub target_year: i32,
    /// "Now" for historical/forecast classification
    pub reference_year: i32,
    /// Optional context snippets
    pub enrichment: Enrichment,
}

impl PredictionRequest {
    /// Assemble a request
    ///
    /// # Arguments
    ///
    /// * `climatology` - Observation from monthly climatology
    /// * `date` - Target date
    /// * `target_year` - Explicit target year; falls back to the
    ///   observation's own target year, then `reference_year`
    /// * `reference_year` - Current year
    /// * `enrichment` - Optional context snippets
    pub fn new(
        climatology: Observation,
        date: TargetDate,
        target_year: Option<i32>,
        reference_year: i32,
        enrichment: Option<Enrichment>,
    ) -> Self {
        let enrichment = enrichment.unwrap_or_default();
        let target_year = target_year
            .or(climatology.target_year)
            .unwrap_or(reference_year);
        Self {
            observation: enrichment.apply_realtime(&climatology),
            climatology,
            date,
            day_of_year: date.day_of_year(target_year),
            target_year,
            reference_year,
            enrichment,
        }
    }

    /// Overlaid observation with defaults applied
    pub fn resolved(&self) -> ResolvedObservation {
        self.observation.resolved()
    }

    /// `target_year - reference_year`
    pub fn year_offset(&self) -> i32 {
        self.target_year - self.reference_year
    }
}

/// Outcome of [`ModelAdapter::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRun {
    /// Prediction or fallback
    pub output: ModelOutput,
    /// Why the fallback was used, if it was
    pub failure: Option<ModelFailure>,
}

impl ModelRun {
    /// `true` when the model produced its own prediction
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Common interface for every risk model
///
/// Implementations hold only immutable parameters (trained or drawn once at
/// construction), so one instance serves concurrent requests.
pub trait ModelAdapter: Send + Sync {
    /// Which model this is
    fn kind(&self) -> ModelKind;

    /// Compute a prediction
    ///
    /// # Errors
    ///
    /// [`ModelFailure`] if the computation fails or yields non-finite output
    fn predict(&self, request: &PredictionRequest) -> ModelResult<ModelOutput>;

    /// Documented fallback output; never fails
    fn fallback(&self, request: &PredictionRequest) -> ModelOutput;

    /// Predict, substituting the fallback on failure
    fn run(&self, request: &PredictionRequest) -> ModelRun {
        match self.predict(request) {
            Ok(output) => {
                debug!(
                    model = %self.kind(),
                    confidence = output.confidence,
                    heat = output.predictions.extreme_heat,
                    cold = output.predictions.extreme_cold,
                    "Model prediction complete"
                );
                ModelRun { output, failure: None }
            }
            Err(failure) => {
                warn!("{} model failed, using fallback: {}", self.kind(), failure);
                let mut output = self.fallback(request);
                output.status = ModelStatus::Fallback {
                    reason: failure.to_string(),
                };
                ModelRun {
                    output,
                    failure: Some(failure),
                }
            }
        }
    }
}

/// Create the regression model for the configured backend
///
/// Training a tree ensemble on the synthetic corpus happens here, once.
/// If training cannot complete the closed-form variant is used instead.
///
/// # Arguments
///
/// * `config` - Regression settings, including the backend
/// * `reference_year` - Year the temporal features are relative to
///
/// # Returns
///
/// A boxed `ModelAdapter` for the regression slot
pub fn create_regression_model(config: &RegressionConfig, reference_year: i32) -> Box<dyn ModelAdapter> {
    match config.backend {
        RegressionBackend::TreeEnsemble => match RegressionModel::train(config, reference_year) {
            Ok(model) => {
                info!("Using tree-ensemble regression backend");
                return Box::new(model);
            }
            Err(e) => {
                warn!("Tree-ensemble training failed: {}. Falling back to closed form.", e);
            }
        },
        RegressionBackend::ClosedForm => {
            info!("Closed-form regression backend selected");
        }
    }
    Box::new(RegressionModel::closed_form())
}

/// Build every enabled model in [`ModelKind`] order
pub fn build_models(config: &EnsembleConfig) -> Vec<Box<dyn ModelAdapter>> {
    let mut models: Vec<Box<dyn ModelAdapter>> = Vec::new();
    for kind in ModelKind::ALL {
        if !config.is_enabled(kind) {
            info!("{} model disabled by configuration", kind);
            continue;
        }
        let model: Box<dyn ModelAdapter> = match kind {
            ModelKind::Statistical => Box::new(StatisticalModel::new()),
            ModelKind::Physics => Box::new(PhysicsModel::new()),
            ModelKind::Regression => create_regression_model(&config.regression, config.reference_year),
            ModelKind::Horizon => Box::new(HorizonModel::new(&config.horizon)),
        };
        models.push(model);
    }
    models
}
