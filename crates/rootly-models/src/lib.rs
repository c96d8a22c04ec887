//! Shared data models for the Rootly relay.
//!
//! This crate provides Serde-serializable types for:
//! - Relay response payloads (`{ result }` / `{ error }`)
//! - The prediction shape printed by the bundled classifier
//! - The plant disease catalog and treatment tips

pub mod disease;
pub mod prediction;
pub mod relay;

// Re-export common types
pub use disease::{DiseaseClass, DiseaseInfo, UnknownDisease, FALLBACK_TIPS};
pub use prediction::{Prediction, Severity};
pub use relay::RelayResponse;
