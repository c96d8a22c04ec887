//! Axum HTTP relay for the plant disease classifier.
//!
//! This crate provides:
//! - `POST /predict`: stage an uploaded leaf image and relay the classifier's output
//! - Server-side upload validation (extension, content type, size)
//! - Disease catalog and treatment tips
//! - Rate limiting, CORS and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod upload;

pub use config::{ApiConfig, ClassifierConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
