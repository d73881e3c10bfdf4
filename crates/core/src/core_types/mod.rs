//! Core types shared by every model: units, observations, risk maps, dates

pub mod date;
pub mod enrichment;
pub mod observation;
pub mod risk;
pub mod units;

pub use date::{DateParseError, TargetDate};
pub use enrichment::{ClimateProjection, Enrichment, ForecastSummary, SeasonalOutlook};
pub use observation::{Observation, ResolvedObservation, ValidationError};
pub use risk::{RiskCategory, RiskPrediction, UncertaintyLevel};
pub use units::*;
