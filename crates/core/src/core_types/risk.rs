//! Risk categories, per-category probability maps and uncertainty labels
//!
//! The five category keys and the uncertainty labels are part of the
//! serialised result consumed by existing clients, so their serde names
//! are fixed.

use crate::core_types::units::clamp_percent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Extreme-weather risk category
///
/// Closed set; every model reports all five.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    /// Dangerous daytime heat
    ExtremeHeat,
    /// Dangerous cold or wind chill
    ExtremeCold,
    /// Heavy rainfall / snowfall
    HeavyPrecipitation,
    /// Damaging winds
    StrongWinds,
    /// Uncomfortable heat-humidity combination
    HeatDiscomfort,
}

impl RiskCategory {
    /// All categories in their canonical order
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::ExtremeHeat,
        RiskCategory::ExtremeCold,
        RiskCategory::HeavyPrecipitation,
        RiskCategory::StrongWinds,
        RiskCategory::HeatDiscomfort,
    ];

    /// Wire key (`extreme_heat`, ...)
    pub fn key(self) -> &'static str {
        match self {
            RiskCategory::ExtremeHeat => "extreme_heat",
            RiskCategory::ExtremeCold => "extreme_cold",
            RiskCategory::HeavyPrecipitation => "heavy_precipitation",
            RiskCategory::StrongWinds => "strong_winds",
            RiskCategory::HeatDiscomfort => "heat_discomfort",
        }
    }

    /// Human-readable name used in narrative summaries
    pub fn display_name(self) -> &'static str {
        match self {
            RiskCategory::ExtremeHeat => "Extreme Heat",
            RiskCategory::ExtremeCold => "Extreme Cold",
            RiskCategory::HeavyPrecipitation => "Heavy Precipitation",
            RiskCategory::StrongWinds => "Strong Winds",
            RiskCategory::HeatDiscomfort => "Heat Discomfort",
        }
    }

    /// Position in [`RiskCategory::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Probability (0-100) for each risk category
///
/// Construct through [`RiskPrediction::new`] or [`RiskPrediction::from_fn`]
/// to get values clamped into range; the raw fields stay public so fixed
/// fallback tables read as literals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskPrediction {
    /// Extreme heat probability (%)
    pub extreme_heat: f64,
    /// Extreme cold probability (%)
    pub extreme_cold: f64,
    /// Heavy precipitation probability (%)
    pub heavy_precipitation: f64,
    /// Strong winds probability (%)
    pub strong_winds: f64,
    /// Heat discomfort probability (%)
    pub heat_discomfort: f64,
}

impl RiskPrediction {
    /// Create a prediction, clamping every value into [0, 100]
    pub fn new(
        extreme_heat: f64,
        extreme_cold: f64,
        heavy_precipitation: f64,
        strong_winds: f64,
        heat_discomfort: f64,
    ) -> Self {
        Self {
            extreme_heat: clamp_percent(extreme_heat),
            extreme_cold: clamp_percent(extreme_cold),
            heavy_precipitation: clamp_percent(heavy_precipitation),
            strong_winds: clamp_percent(strong_winds),
            heat_discomfort: clamp_percent(heat_discomfort),
        }
    }

    /// Build a prediction by evaluating `f` for each category (clamped)
    pub fn from_fn(mut f: impl FnMut(RiskCategory) -> f64) -> Self {
        let mut prediction = Self::default();
        for category in RiskCategory::ALL {
            prediction.set(category, clamp_percent(f(category)));
        }
        prediction
    }

    /// Same value for every category
    pub fn uniform(value: f64) -> Self {
        Self::from_fn(|_| value)
    }

    /// Probability for one category
    pub fn get(&self, category: RiskCategory) -> f64 {
        match category {
            RiskCategory::ExtremeHeat => self.extreme_heat,
            RiskCategory::ExtremeCold => self.extreme_cold,
            RiskCategory::HeavyPrecipitation => self.heavy_precipitation,
            RiskCategory::StrongWinds => self.strong_winds,
            RiskCategory::HeatDiscomfort => self.heat_discomfort,
        }
    }

    /// Overwrite one category (unclamped; callers clamp)
    pub fn set(&mut self, category: RiskCategory, value: f64) {
        match category {
            RiskCategory::ExtremeHeat => self.extreme_heat = value,
            RiskCategory::ExtremeCold => self.extreme_cold = value,
            RiskCategory::HeavyPrecipitation => self.heavy_precipitation = value,
            RiskCategory::StrongWinds => self.strong_winds = value,
            RiskCategory::HeatDiscomfort => self.heat_discomfort = value,
        }
    }

    /// Iterate `(category, probability)` in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (RiskCategory, f64)> + '_ {
        RiskCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Clamp every value into [0, 100]
    pub fn clamped(self) -> Self {
        Self::from_fn(|c| self.get(c))
    }

    /// First category that is NaN or infinite, if any
    pub fn first_non_finite(&self) -> Option<RiskCategory> {
        self.iter().find(|(_, v)| !v.is_finite()).map(|(c, _)| c)
    }

    /// Every value inside [0, 100]
    pub fn is_within_bounds(&self) -> bool {
        self.iter().all(|(_, v)| (0.0..=100.0).contains(&v))
    }

    /// Highest-risk category; ties resolve to the earlier category
    pub fn max_category(&self) -> (RiskCategory, f64) {
        let mut best = (RiskCategory::ExtremeHeat, self.extreme_heat);
        for (category, value) in self.iter().skip(1) {
            if value > best.1 {
                best = (category, value);
            }
        }
        best
    }
}

/// Discrete uncertainty label attached to a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UncertaintyLevel {
    /// High confidence
    Low,
    /// Medium confidence
    Moderate,
    /// Low confidence, or a fallback result
    High,
}

impl UncertaintyLevel {
    /// Map a confidence score onto a label: `> low_above` is LOW,
    /// `> moderate_above` is MODERATE, anything else HIGH.
    pub fn from_confidence(confidence: f64, low_above: f64, moderate_above: f64) -> Self {
        if confidence > low_above {
            UncertaintyLevel::Low
        } else if confidence > moderate_above {
            UncertaintyLevel::Moderate
        } else {
            UncertaintyLevel::High
        }
    }

    /// Wire label
    pub fn as_str(self) -> &'static str {
        match self {
            UncertaintyLevel::Low => "LOW",
            UncertaintyLevel::Moderate => "MODERATE",
            UncertaintyLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for UncertaintyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_values() {
        let p = RiskPrediction::new(120.0, -4.0, 50.0, f64::NAN, 100.0);
        assert_eq!(p.extreme_heat, 100.0);
        assert_eq!(p.extreme_cold, 0.0);
        assert_eq!(p.heavy_precipitation, 50.0);
        assert_eq!(p.strong_winds, 0.0);
        assert!(p.is_within_bounds());
    }

    #[test]
    fn test_get_set_round_trip_per_category() {
        let mut p = RiskPrediction::default();
        for (i, category) in RiskCategory::ALL.into_iter().enumerate() {
            p.set(category, i as f64 * 10.0);
        }
        assert_eq!(p.get(RiskCategory::StrongWinds), 30.0);
        assert_eq!(RiskCategory::HeatDiscomfort.index(), 4);
    }

    #[test]
    fn test_max_category_prefers_first_on_tie() {
        let p = RiskPrediction::new(40.0, 70.0, 70.0, 10.0, 5.0);
        assert_eq!(p.max_category(), (RiskCategory::ExtremeCold, 70.0));
    }

    #[test]
    fn test_first_non_finite() {
        let mut p = RiskPrediction::uniform(10.0);
        assert_eq!(p.first_non_finite(), None);
        p.heavy_precipitation = f64::INFINITY;
        assert_eq!(p.first_non_finite(), Some(RiskCategory::HeavyPrecipitation));
    }

    #[test]
    fn test_wire_keys_are_stable() {
        let json = serde_json::to_value(RiskPrediction::uniform(1.0)).unwrap();
        for category in RiskCategory::ALL {
            assert!(json.get(category.key()).is_some(), "missing {category}");
        }
        assert_eq!(
            serde_json::to_string(&UncertaintyLevel::Moderate).unwrap(),
            "\"MODERATE\""
        );
    }

    #[test]
    fn test_uncertainty_cutoffs_are_exclusive() {
        assert_eq!(UncertaintyLevel::from_confidence(80.0, 80.0, 60.0), UncertaintyLevel::Moderate);
        assert_eq!(UncertaintyLevel::from_confidence(80.1, 80.0, 60.0), UncertaintyLevel::Low);
        assert_eq!(UncertaintyLevel::from_confidence(60.0, 80.0, 60.0), UncertaintyLevel::High);
    }
}
