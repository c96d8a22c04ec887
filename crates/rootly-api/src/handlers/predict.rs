//! Upload relay handler.
//!
//! `POST /predict` stages the `image` field in the scratch directory, runs
//! the classifier on it and answers `{ "result": <stdout> }` or
//! `{ "error": <message> }`. The staged file is removed when the handler
//! returns or is dropped; dropping the handler also kills the classifier.

use std::time::Instant;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use rootly_models::RelayResponse;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use crate::upload::receive_image;

/// Relay one uploaded image to the classifier.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<RelayResponse>> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    relay(&state, &mut multipart)
        .await
        .map(Json)
        .map_err(|e| e.masked(state.config.is_production()))
}

async fn relay(state: &AppState, multipart: &mut Multipart) -> ApiResult<RelayResponse> {
    let upload = receive_image(multipart, &state.upload_policy, &state.scratch).await?;
    metrics::record_upload_bytes(upload.size());

    let _permit = state.pool.acquire().await.inspect_err(|_| {
        metrics::record_classifier_invocation("busy", 0.0);
    })?;

    metrics::classifier_started();
    let _in_flight = scopeguard::guard((), |_| metrics::classifier_finished());

    let start = Instant::now();
    let outcome = state
        .runner
        .run(&state.command, upload.path())
        .await
        .and_then(|invocation| invocation.into_result(state.config.classifier.output_mode));
    let elapsed = start.elapsed();

    match outcome {
        Ok(stdout) => {
            metrics::record_classifier_invocation("success", elapsed.as_secs_f64());
            info!(
                original_name = %upload.original_name,
                size = upload.size(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Prediction relayed"
            );
            Ok(RelayResponse::success(stdout))
        }
        Err(e) => {
            metrics::record_classifier_invocation(e.kind(), elapsed.as_secs_f64());
            warn!(
                original_name = %upload.original_name,
                kind = e.kind(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Classifier run failed: {}", e
            );
            Err(e.into())
        }
    }
}
