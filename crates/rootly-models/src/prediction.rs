//! Classifier prediction shape.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Severity bucket derived from classifier confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Bucket a confidence percentage: above 80 is high, above 50 medium.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 80.0 {
            Severity::High
        } else if confidence > 50.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Prediction printed on stdout by the plant disease classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Human-readable disease class
    pub disease_name: String,
    /// Confidence percentage (0-100)
    pub confidence: f64,
    /// Severity bucket
    pub severity: Severity,
}

impl Prediction {
    /// Parse classifier stdout. Surrounding whitespace is ignored and the
    /// confidence must be a percentage.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let prediction: Self = serde_json::from_str(raw.trim())?;
        if !prediction.is_plausible() {
            return Err(serde::de::Error::custom(format!(
                "confidence {} outside 0-100",
                prediction.confidence
            )));
        }
        Ok(prediction)
    }

    /// Severity bucket the confidence falls into.
    pub fn confidence_bucket(&self) -> Severity {
        Severity::from_confidence(self.confidence)
    }

    /// Whether the confidence lies in the 0-100 range.
    pub fn is_plausible(&self) -> bool {
        self.confidence.is_finite() && (0.0..=100.0).contains(&self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(Severity::from_confidence(92.0), Severity::High);
        assert_eq!(Severity::from_confidence(80.0), Severity::Medium);
        assert_eq!(Severity::from_confidence(50.5), Severity::Medium);
        assert_eq!(Severity::from_confidence(50.0), Severity::Low);
    }

    #[test]
    fn test_parse_classifier_output() {
        let p = Prediction::parse(
            "{\"diseaseName\":\"Early Blight Disease\",\"confidence\":92,\"severity\":\"medium\"}\n",
        )
        .unwrap();
        assert_eq!(p.disease_name, "Early Blight Disease");
        assert_eq!(p.severity, Severity::Medium);
        assert_eq!(p.confidence_bucket(), Severity::High);
    }

    #[test]
    fn test_parse_rejects_non_prediction() {
        assert!(Prediction::parse("not json").is_err());
        assert!(Prediction::parse(r#"{"disease":"Healthy"}"#).is_err());
        assert!(Prediction::parse(r#"{"diseaseName":"x","confidence":1,"severity":"extreme"}"#).is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_confidence() {
        let err = Prediction::parse(r#"{"diseaseName":"Leaf Mold Disease","confidence":140,"severity":"high"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("outside 0-100"));
        assert!(Prediction::parse(r#"{"diseaseName":"x","confidence":-3,"severity":"low"}"#).is_err());
        assert!(Prediction::parse(r#"{"diseaseName":"x","confidence":100,"severity":"high"}"#).is_ok());
    }
}
