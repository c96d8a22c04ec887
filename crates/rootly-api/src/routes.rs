//! API routes.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::handlers::{disease_tips, health, list_diseases, predict, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Upload relay, served at the root for existing clients and under /api
    let relay_routes = Router::new().route("/predict", post(predict));
    let relay_routes = match NonZeroU32::new(state.config.rate_limit_rps) {
        Some(rps) => relay_routes.layer(middleware::from_fn_with_state(
            Arc::new(
                RateLimiterCache::new(rps)
                    .with_trusted_proxy_headers(state.config.trust_proxy_headers),
            ),
            rate_limit_middleware,
        )),
        None => relay_routes,
    };

    let disease_routes = Router::new()
        .route("/diseases", get(list_diseases))
        .route("/diseases/:name/tips", get(disease_tips));

    let api_routes = Router::new()
        .merge(relay_routes.clone())
        .merge(disease_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route("/metrics", get(move || async move { handle.render() })),
        None => Router::new(),
    };

    Router::new()
        .merge(relay_routes)
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Multipart reads past this limit fail inside the handler, which
        // answers with the JSON 413
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
