//! Screening Classifier Inference
//!
//! The classifier is reached through the narrow [`InferenceGateway`] trait.
//! [`InferenceEngine`] wraps any gateway with the caller-facing policy:
//! shape check, bounded timeout, and a `0.0` sentinel score on failure.

mod engine;
mod gateway;
mod onnx;

pub use engine::{InferenceEngine, InferenceResult, DEFAULT_TIMEOUT_MS, SENTINEL_SCORE};
pub use gateway::{FnGateway, InferenceGateway, UnavailableGateway};
pub use onnx::OnnxGateway;

use thiserror::Error;

/// Errors during inference
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Inference timeout after {0}ms")]
    Timeout(u64),
    #[error("No classifier available: {0}")]
    Unavailable(String),
}
