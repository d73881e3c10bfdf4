//! Error types for models, fusion and configuration
//!
//! None of these escape [`crate::EnsembleCoordinator::predict`]: a
//! [`ModelFailure`] is replaced by that model's fallback output and an
//! [`EnsembleFailure`] by the global fallback result. [`ConfigError`] is
//! raised while building a coordinator.

use crate::core_types::RiskCategory;
use crate::models::ModelKind;
use thiserror::Error;

/// A model's computation failed or produced unusable output
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelFailure {
    /// A probability or confidence came out NaN or infinite
    #[error("non-finite value in {0}")]
    NonFinite(String),

    /// An internal numeric step could not be completed
    #[error("computation failed: {0}")]
    Computation(String),

    /// The model has no trained parameters for a category
    #[error("no trained parameters for {0}")]
    Untrained(RiskCategory),
}

impl ModelFailure {
    /// Non-finite failure naming the offending quantity
    pub fn non_finite(what: impl Into<String>) -> Self {
        ModelFailure::NonFinite(what.into())
    }
}

/// Fusion could not produce a usable ensemble result
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnsembleFailure {
    /// Every model failed
    #[error("no model produced a successful output")]
    NoSuccessfulModel,

    /// A fused probability came out NaN or infinite
    #[error("fused value for {0} is not finite")]
    NonFiniteFusion(RiskCategory),

    /// A composite confidence metric came out NaN or infinite
    #[error("confidence metric '{0}' is not finite")]
    NonFiniteConfidence(&'static str),
}

/// Invalid [`crate::EnsembleConfig`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// No model is enabled
    #[error("at least one model must be enabled")]
    EmptyModelSet,

    /// Two models of the same kind were supplied
    #[error("more than one {0} model supplied")]
    DuplicateModel(ModelKind),

    /// A weight, multiplier or blend fraction is out of range
    #[error("weight '{name}' is out of range: {value}")]
    InvalidWeight {
        /// Weight name
        name: String,
        /// Offending value
        value: f64,
    },

    /// A size parameter (sample count, tree count, depth, steps) is zero
    #[error("parameter '{0}' must be greater than zero")]
    ZeroParameter(&'static str),

    /// A fraction parameter is outside (0, 1]
    #[error("parameter '{name}' must be in (0, 1], got {value}")]
    InvalidFraction {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Result alias for model computations
pub type ModelResult<T> = Result<T, ModelFailure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        assert_eq!(
            ModelFailure::non_finite("physics heat").to_string(),
            "non-finite value in physics heat"
        );
        assert_eq!(
            EnsembleFailure::NonFiniteFusion(RiskCategory::StrongWinds).to_string(),
            "fused value for strong_winds is not finite"
        );
        assert_eq!(
            ConfigError::ZeroParameter("n_trees").to_string(),
            "parameter 'n_trees' must be greater than zero"
        );
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ModelFailure>();
        assert_send_sync::<EnsembleFailure>();
        assert_send_sync::<ConfigError>();
    }
}
