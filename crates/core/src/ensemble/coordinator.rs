//! Ensemble coordinator
//!
//! Owns the models, runs them concurrently for each request and fuses their
//! outputs. Models are built (and the regression model trained) once in
//! [`EnsembleCoordinator::new`]; after that the coordinator is immutable and
//! can serve concurrent requests from any thread.

use super::analysis::{innovation_metrics, temporal_analysis};
use super::confidence::confidence_metrics;
use super::fusion;
use super::summary::narrative;
use super::{EnsembleResult, ENSEMBLE_METHOD};
use crate::config::EnsembleConfig;
use crate::core_types::{Enrichment, Observation, TargetDate};
use crate::error::{ConfigError, EnsembleFailure};
use crate::models::{build_models, ModelAdapter, ModelKind, ModelOutput, ModelRun, PredictionRequest};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs every enabled model and fuses their outputs
pub struct EnsembleCoordinator {
    config: EnsembleConfig,
    models: Vec<Box<dyn ModelAdapter>>,
    base_weights: BTreeMap<ModelKind, f64>,
}

impl fmt::Debug for EnsembleCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnsembleCoordinator")
            .field("models", &self.model_kinds())
            .field("base_weights", &self.base_weights)
            .finish_non_exhaustive()
    }
}

impl EnsembleCoordinator {
    /// Validate `config` and build every enabled model
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the configuration is invalid
    pub fn new(config: &EnsembleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let start = Instant::now();
        let models = build_models(config);
        info!(
            "Ensemble ready with {} models in {:.2?}",
            models.len(),
            start.elapsed()
        );
        Ok(Self {
            base_weights: config.effective_base_weights(),
            config: config.clone(),
            models,
        })
    }

    /// Use caller-supplied models instead of building them
    ///
    /// The enabled model set becomes the kinds of `models`; everything else
    /// in `config` applies unchanged.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyModelSet`] for an empty vector
    /// - [`ConfigError::DuplicateModel`] when two models share a kind
    /// - any error from [`EnsembleConfig::validate`]
    pub fn with_models(config: &EnsembleConfig, mut models: Vec<Box<dyn ModelAdapter>>) -> Result<Self, ConfigError> {
        let mut kinds = BTreeSet::new();
        for model in &models {
            if !kinds.insert(model.kind()) {
                return Err(ConfigError::DuplicateModel(model.kind()));
            }
        }
        let mut config = config.clone();
        config.models = kinds;
        config.validate()?;
        models.sort_by_key(|m| m.kind());
        Ok(Self {
            base_weights: config.effective_base_weights(),
            config,
            models,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Kinds of the models this coordinator runs
    pub fn model_kinds(&self) -> Vec<ModelKind> {
        self.models.iter().map(|m| m.kind()).collect()
    }

    /// Base weight per model, summing to 1
    pub fn base_weights(&self) -> &BTreeMap<ModelKind, f64> {
        &self.base_weights
    }

    /// Parse `date`; fall back to the observation's month and day, then
    /// to mid-July
    pub fn resolve_date(date: &str, observation: &Observation) -> TargetDate {
        match date.parse::<TargetDate>() {
            Ok(parsed) => parsed,
            Err(e) => {
                let from_observation = match (observation.month, observation.day) {
                    (Some(month), Some(day)) => TargetDate::new(month, day).ok(),
                    _ => None,
                };
                let resolved = from_observation.unwrap_or(TargetDate::MID_JULY);
                warn!("Unusable date ({}), using {}", e, resolved);
                resolved
            }
        }
    }

    /// Fused risk estimate for one location and date
    ///
    /// Never fails: model failures are replaced by each model's fallback,
    /// and a fusion failure by [`EnsembleResult::fallback`].
    ///
    /// # Arguments
    ///
    /// * `observation` - Monthly climatology for the location
    /// * `date` - Target date as `MM-DD`
    /// * `enrichment` - Optional real-time, forecast, seasonal and climate context
    /// * `target_year` - Year the estimate is for; defaults to the
    ///   observation's target year, then the reference year
    pub fn predict(
        &self,
        observation: &Observation,
        date: &str,
        enrichment: Option<Enrichment>,
        target_year: Option<i32>,
    ) -> EnsembleResult {
        let date = Self::resolve_date(date, observation);
        let request = PredictionRequest::new(
            *observation,
            date,
            target_year,
            self.config.reference_year,
            enrichment,
        );

        let runs: BTreeMap<ModelKind, ModelRun> = self
            .models
            .par_iter()
            .map(|model| (model.kind(), model.run(&request)))
            .collect();

        match self.assemble(runs, &request) {
            Ok(result) => result,
            Err(e) => {
                warn!("Ensemble fusion failed, returning fallback: {}", e);
                EnsembleResult::fallback(date, request.target_year)
            }
        }
    }

    fn assemble(
        &self,
        runs: BTreeMap<ModelKind, ModelRun>,
        request: &PredictionRequest,
    ) -> Result<EnsembleResult, EnsembleFailure> {
        if !runs.values().any(ModelRun::succeeded) {
            return Err(EnsembleFailure::NoSuccessfulModel);
        }
        let outputs: BTreeMap<ModelKind, ModelOutput> =
            runs.into_iter().map(|(kind, run)| (kind, run.output)).collect();

        let fused = fusion::fuse(&outputs, &self.base_weights, &self.config)?;
        let confidence = confidence_metrics(&outputs, &self.config)?;
        let innovation = innovation_metrics(&outputs);
        let summary = narrative(&fused.predictions, confidence.overall_confidence, &innovation);
        debug!(
            overall_confidence = confidence.overall_confidence,
            uncertainty = %confidence.uncertainty_level,
            "Ensemble fused"
        );

        Ok(EnsembleResult {
            predictions: fused.predictions,
            confidence_metrics: confidence,
            temporal_analysis: Some(temporal_analysis(&outputs)),
            innovation_metrics: Some(innovation),
            model_breakdown: outputs,
            adaptive_weights: fused.weights,
            ensemble_method: ENSEMBLE_METHOD.to_string(),
            date: request.date,
            target_year: request.target_year,
            summary,
        })
    }
}
