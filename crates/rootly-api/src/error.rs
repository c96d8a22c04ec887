//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rootly_classifier::ClassifierError;
use rootly_models::RelayResponse;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every variant renders as `{ "error": <message> }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Replace host details (paths, OS errors) with a generic message when
    /// `production` is set. Classifier stderr is never replaced.
    pub fn masked(self, production: bool) -> Self {
        if production && self.is_host_detail() {
            Self::Internal("An internal error occurred".to_string())
        } else {
            self
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Classifier(e) => match e {
                ClassifierError::Busy => StatusCode::SERVICE_UNAVAILABLE,
                ClassifierError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Whether the message may leak host details (paths, OS errors).
    fn is_host_detail(&self) -> bool {
        matches!(
            self,
            ApiError::Internal(_)
                | ApiError::Classifier(
                    ClassifierError::Io(_)
                        | ClassifierError::Spawn(_)
                        | ClassifierError::ProgramNotFound(_)
                        | ClassifierError::ScratchMissing(_)
                )
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        (status, Json(RelayResponse::failure(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::bad_request("No image file provided").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ClassifierError::failed("boom", Some(1))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(ClassifierError::Timeout(Duration::from_secs(1))).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::from(ClassifierError::Busy).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_classifier_failure_message_is_stderr() {
        let err = ApiError::from(ClassifierError::failed("warning: low resolution", Some(0)));
        assert_eq!(err.to_string(), "warning: low resolution");
    }

    #[test]
    fn test_masking_hides_host_details_only() {
        let missing = ApiError::from(ClassifierError::ProgramNotFound("python".to_string()));
        assert_eq!(
            missing.masked(true).to_string(),
            "An internal error occurred"
        );

        let missing = ApiError::from(ClassifierError::ProgramNotFound("python".to_string()));
        assert_eq!(
            missing.masked(false).to_string(),
            "Classifier program not found: python"
        );

        let failed = ApiError::from(ClassifierError::failed("CUDA out of memory", Some(1)));
        assert_eq!(failed.masked(true).to_string(), "CUDA out of memory");

        let busy = ApiError::from(ClassifierError::Busy).masked(true);
        assert_eq!(busy.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
