//! Deterministic narrative summary

use super::analysis::InnovationMetrics;
use crate::core_types::RiskPrediction;

/// Innovation score above which the top algorithms are named
const HIGHLIGHT_ABOVE: f64 = 80.0;

/// Number of algorithms named in the highlight
const HIGHLIGHTED_ALGORITHMS: usize = 3;

/// Risk label: VERY HIGH > 80, HIGH > 60, MODERATE > 40, else LOW
pub fn risk_label(probability: f64) -> &'static str {
    if probability > 80.0 {
        "VERY HIGH"
    } else if probability > 60.0 {
        "HIGH"
    } else if probability > 40.0 {
        "MODERATE"
    } else {
        "LOW"
    }
}

/// Confidence label: VERY HIGH > 85, HIGH > 70, MODERATE > 55, else LOW
pub fn confidence_label(confidence: f64) -> &'static str {
    if confidence > 85.0 {
        "VERY HIGH"
    } else if confidence > 70.0 {
        "HIGH"
    } else if confidence > 55.0 {
        "MODERATE"
    } else {
        "LOW"
    }
}

/// Summary naming the highest-risk category and what produced it
///
/// # Example
///
/// ```text
/// Multi-Horizon Analysis: Extreme Heat shows VERY HIGH risk (91.3%) with
/// HIGH confidence (78.2%). Ensemble combines Atmospheric Physics, ...
/// ```
pub fn narrative(predictions: &RiskPrediction, overall_confidence: f64, innovation: &InnovationMetrics) -> String {
    let (category, probability) = predictions.max_category();
    let mut summary = format!(
        "Multi-Horizon Analysis: {} shows {} risk ({:.1}%) with {} confidence ({:.1}%).",
        category.display_name(),
        risk_label(probability),
        probability,
        confidence_label(overall_confidence),
        overall_confidence,
    );
    if innovation.innovation_score > HIGHLIGHT_ABOVE {
        let top: Vec<&str> = innovation
            .advanced_algorithms
            .iter()
            .take(HIGHLIGHTED_ALGORITHMS)
            .map(String::as_str)
            .collect();
        summary.push_str(&format!(
            " Using {} algorithms across {} temporal horizons.",
            top.join(", "),
            innovation.temporal_horizons
        ));
    }
    summary.push_str(&format!(
        " Ensemble combines {}.",
        innovation.methodologies_used.join(", ")
    ));
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(score: f64) -> InnovationMetrics {
        InnovationMetrics {
            methodologies_used: vec!["Atmospheric Physics".into(), "Statistical Analysis".into()],
            advanced_algorithms: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            prediction_techniques: Vec::new(),
            temporal_horizons: 3,
            innovation_score: score,
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(risk_label(80.0), "HIGH");
        assert_eq!(risk_label(80.1), "VERY HIGH");
        assert_eq!(risk_label(40.0), "LOW");
        assert_eq!(confidence_label(85.0), "HIGH");
        assert_eq!(confidence_label(55.5), "MODERATE");
        assert_eq!(confidence_label(12.0), "LOW");
    }

    #[test]
    fn test_narrative_without_highlight() {
        let p = RiskPrediction::new(10.0, 72.3, 30.0, 5.0, 0.0);
        assert_eq!(
            narrative(&p, 64.0, &metrics(60.0)),
            "Multi-Horizon Analysis: Extreme Cold shows HIGH risk (72.3%) with MODERATE confidence (64.0%). \
             Ensemble combines Atmospheric Physics, Statistical Analysis."
        );
    }

    #[test]
    fn test_narrative_with_highlight() {
        let p = RiskPrediction::new(91.0, 0.0, 0.0, 0.0, 50.0);
        let text = narrative(&p, 90.0, &metrics(95.0));
        assert!(text.starts_with("Multi-Horizon Analysis: Extreme Heat shows VERY HIGH risk (91.0%)"));
        assert!(text.contains(" Using A, B, C algorithms across 3 temporal horizons."));
        assert!(!text.contains(", D"));
    }
}
