//! Error types for classifier operations.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for classifier operations.
pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Message used when the classifier fails without writing to stderr.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Classifier failed";

/// Errors that can occur while staging or running the classifier.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier program not found: {0}")]
    ProgramNotFound(String),

    #[error("Failed to start classifier: {0}")]
    Spawn(#[source] std::io::Error),

    /// Non-zero exit or any stderr output. Displays the stderr verbatim.
    #[error("{}", failure_message(.stderr))]
    Failed {
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("Classifier timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Classifier busy, try again later")]
    Busy,

    #[error("Classifier returned malformed output")]
    MalformedOutput(#[source] serde_json::Error),

    #[error("Scratch file not found: {0}")]
    ScratchMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn failure_message(stderr: &str) -> &str {
    if stderr.is_empty() {
        DEFAULT_FAILURE_MESSAGE
    } else {
        stderr
    }
}

impl ClassifierError {
    /// Create a process failure error.
    pub fn failed(stderr: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::Failed {
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierError::ProgramNotFound(_) | ClassifierError::Spawn(_) => "spawn",
            ClassifierError::Failed { .. } => "failed",
            ClassifierError::Timeout(_) => "timeout",
            ClassifierError::Busy => "busy",
            ClassifierError::MalformedOutput(_) => "malformed",
            ClassifierError::ScratchMissing(_) | ClassifierError::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_displays_stderr_verbatim() {
        let err = ClassifierError::failed("warning: low resolution", Some(0));
        assert_eq!(err.to_string(), "warning: low resolution");
    }

    #[test]
    fn test_failed_without_stderr_uses_fallback() {
        let err = ClassifierError::failed("", Some(1));
        assert_eq!(err.to_string(), DEFAULT_FAILURE_MESSAGE);
    }

    #[test]
    fn test_timeout_message() {
        let err = ClassifierError::Timeout(Duration::from_secs(60));
        assert_eq!(err.to_string(), "Classifier timed out after 60 seconds");
        assert_eq!(err.kind(), "timeout");
    }
}
