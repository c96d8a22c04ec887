//! Prometheus metrics for the relay.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "rootly_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "rootly_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "rootly_http_requests_in_flight";

    // Classifier metrics
    pub const CLASSIFIER_INVOCATIONS_TOTAL: &str = "rootly_classifier_invocations_total";
    pub const CLASSIFIER_DURATION_SECONDS: &str = "rootly_classifier_duration_seconds";
    pub const CLASSIFIER_IN_FLIGHT: &str = "rootly_classifier_in_flight";

    // Upload metrics
    pub const UPLOAD_BYTES: &str = "rootly_upload_bytes";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "rootly_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished classifier run (`outcome` is "success" or an error kind).
pub fn record_classifier_invocation(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::CLASSIFIER_INVOCATIONS_TOTAL, &labels).increment(1);
    histogram!(names::CLASSIFIER_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Track classifier processes currently running.
pub fn classifier_started() {
    gauge!(names::CLASSIFIER_IN_FLIGHT).increment(1.0);
}

pub fn classifier_finished() {
    gauge!(names::CLASSIFIER_IN_FLIGHT).decrement(1.0);
}

/// Record the size of a staged upload.
pub fn record_upload_bytes(bytes: u64) {
    histogram!(names::UPLOAD_BYTES).record(bytes as f64);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (collapse disease names and numeric ids).
fn sanitize_path(path: &str) -> String {
    let mut out = Vec::new();
    let mut previous = "";
    for segment in path.split('/') {
        let normalized = if previous == "diseases" && !segment.is_empty() {
            ":name"
        } else if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
            ":id"
        } else {
            segment
        };
        out.push(normalized);
        previous = segment;
    }
    out.join("/")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
