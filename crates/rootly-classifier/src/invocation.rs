//! One finished classifier run and the relay completion policy.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rootly_models::Prediction;

use crate::error::{ClassifierError, ClassifierResult};

/// How classifier stdout is checked before it is forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Forward stdout as opaque text.
    #[default]
    Passthrough,
    /// Require stdout to parse as a [`Prediction`]. The raw text is still forwarded.
    Validate,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "passthrough" | "raw" => Ok(OutputMode::Passthrough),
            "validate" | "strict" => Ok(OutputMode::Validate),
            other => Err(format!("unknown output mode: {}", other)),
        }
    }
}

/// Captured result of a classifier process that ran to exit.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Scratch path passed as the final argument
    pub input: PathBuf,
    /// Everything written to stdout
    pub stdout: String,
    /// Everything written to stderr
    pub stderr: String,
    /// Exit code, `None` when killed by a signal
    pub exit_code: Option<i32>,
    /// Wall time from spawn to exit
    pub elapsed: Duration,
}

impl Invocation {
    /// A run succeeded only if it exited 0 and wrote nothing to stderr.
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0) && self.stderr.is_empty()
    }

    /// Apply the completion policy, returning stdout on success.
    ///
    /// Stderr output wins over a zero exit code.
    pub fn into_result(self, mode: OutputMode) -> ClassifierResult<String> {
        if !self.succeeded() {
            return Err(ClassifierError::failed(self.stderr, self.exit_code));
        }

        if mode == OutputMode::Validate {
            let prediction =
                Prediction::parse(&self.stdout).map_err(ClassifierError::MalformedOutput)?;
            tracing::debug!(
                disease = %prediction.disease_name,
                confidence = prediction.confidence,
                "Classifier output validated"
            );
            if prediction.severity != prediction.confidence_bucket() {
                tracing::debug!(
                    severity = %prediction.severity,
                    bucket = %prediction.confidence_bucket(),
                    "Classifier severity differs from its confidence bucket"
                );
            }
        }

        Ok(self.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(stdout: &str, stderr: &str, exit_code: Option<i32>) -> Invocation {
        Invocation {
            input: PathBuf::from("uploads/1-abc.jpg"),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_clean_exit_forwards_stdout() {
        let out = r#"{"diseaseName":"Early Blight Disease","confidence":92,"severity":"medium"}"#;
        assert_eq!(
            invocation(out, "", Some(0)).into_result(OutputMode::Passthrough).unwrap(),
            out
        );
    }

    #[test]
    fn test_stderr_wins_over_zero_exit() {
        let err = invocation(r#"{"disease":"Healthy"}"#, "warning: low resolution", Some(0))
            .into_result(OutputMode::Passthrough)
            .unwrap_err();
        assert_eq!(err.to_string(), "warning: low resolution");
    }

    #[test]
    fn test_nonzero_exit_without_stderr() {
        let err = invocation("partial", "", Some(2))
            .into_result(OutputMode::Passthrough)
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Failed { exit_code: Some(2), .. }));
        assert_eq!(err.to_string(), "Classifier failed");
    }

    #[test]
    fn test_signal_exit_is_failure() {
        assert!(!invocation("", "", None).succeeded());
    }

    #[test]
    fn test_validate_mode() {
        let good = r#"{"diseaseName":"Healthy and Fresh","confidence":99.1,"severity":"high"}"#;
        assert!(invocation(good, "", Some(0)).into_result(OutputMode::Validate).is_ok());

        let err = invocation("hello", "", Some(0))
            .into_result(OutputMode::Validate)
            .unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedOutput(_)));

        let out_of_range = r#"{"diseaseName":"Target Spot Disease","confidence":250,"severity":"high"}"#;
        let err = invocation(out_of_range, "", Some(0))
            .into_result(OutputMode::Validate)
            .unwrap_err();
        assert_eq!(err.to_string(), "Classifier returned malformed output");

        // Passthrough never inspects the text
        assert!(invocation("hello", "", Some(0)).into_result(OutputMode::Passthrough).is_ok());
    }

    #[test]
    fn test_output_mode_parse() {
        assert_eq!("validate".parse::<OutputMode>().unwrap(), OutputMode::Validate);
        assert_eq!("PASSTHROUGH".parse::<OutputMode>().unwrap(), OutputMode::Passthrough);
        assert!("json".parse::<OutputMode>().is_err());
    }
}
