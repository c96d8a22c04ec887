//! Relay response payload.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Body returned by the upload relay.
///
/// Serializes to exactly one of `{"result": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RelayResponse {
    /// Raw classifier stdout.
    Success { result: String },
    /// Classifier diagnostics or a relay-side error message.
    Failure { error: String },
}

impl RelayResponse {
    pub fn success(result: impl Into<String>) -> Self {
        Self::Success {
            result: result.into(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The text carried by either variant.
    pub fn message(&self) -> &str {
        match self {
            Self::Success { result } => result,
            Self::Failure { error } => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let body = serde_json::to_value(RelayResponse::success(r#"{"diseaseName":"Healthy and Fresh"}"#))
            .unwrap();
        assert_eq!(body, json!({ "result": "{\"diseaseName\":\"Healthy and Fresh\"}" }));
        assert!(body.get("error").is_none());
    }

    #[test]
    fn test_failure_shape() {
        let body = serde_json::to_value(RelayResponse::failure("warning: low resolution")).unwrap();
        assert_eq!(body, json!({ "error": "warning: low resolution" }));
        assert!(body.get("result").is_none());
    }

    #[test]
    fn test_deserialize_picks_variant_by_key() {
        let ok: RelayResponse = serde_json::from_str(r#"{"result":"x"}"#).unwrap();
        assert!(ok.is_success());
        let err: RelayResponse = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert!(!err.is_success());
        assert_eq!(err.message(), "boom");
    }
}
