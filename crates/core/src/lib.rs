//! Extreme-Weather Risk Ensemble Core Library
//!
//! Estimates probabilities for five extreme-weather risk categories (extreme
//! heat, extreme cold, heavy precipitation, strong winds, heat discomfort)
//! for a location and date by fusing four independent models into one
//! result with a composite confidence score.
//!
//! ## Models
//!
//! - Statistical: climate-zone baselines scaled by local season
//! - Physics: WBGT heat stress, wind chill, moisture and geostrophic wind
//! - Regression: engineered features into a tree ensemble trained once on a
//!   synthetic multi-year corpus (or a closed-form variant)
//! - Horizon: short-term, seasonal and climate pipelines combined by a
//!   meta-ensemble
//!
//! ## Usage
//!
//! ```no_run
//! use risk_ensemble_core::{EnsembleConfig, EnsembleCoordinator, Observation};
//!
//! let coordinator = EnsembleCoordinator::new(&EnsembleConfig::compact())?;
//! let obs = Observation::at(25.2, 55.27)
//!     .with_temperatures(42.0, 28.0)
//!     .with_humidity(35.0);
//! let result = coordinator.predict(&obs, "07-15", None, None);
//! println!("{}", result.summary);
//! # Ok::<(), risk_ensemble_core::ConfigError>(())
//! ```

// Core types and utilities
pub mod core_types;

// Configuration and errors
pub mod config;
pub mod error;

// Models and fusion
pub mod ensemble;
pub mod models;

// Re-export core types
pub use core_types::{ClimateProjection, Enrichment, ForecastSummary, SeasonalOutlook};
pub use core_types::{DateParseError, TargetDate};
pub use core_types::{Observation, ResolvedObservation, ValidationError};
pub use core_types::{RiskCategory, RiskPrediction, UncertaintyLevel};

// Re-export configuration and errors
pub use config::{EnsembleConfig, HorizonConfig, RegressionBackend, RegressionConfig};
pub use error::{ConfigError, EnsembleFailure, ModelFailure};

// Re-export models and fusion
pub use ensemble::{ConfidenceMetrics, EnsembleCoordinator, EnsembleResult, InnovationMetrics, TemporalAnalysis};
pub use models::{ModelAdapter, ModelKind, ModelOutput, ModelStatus, PredictionRequest};
