//! Inference Engine Implementation

use crate::gateway::{check_shape, InferenceGateway, UnavailableGateway};
use crate::onnx::OnnxGateway;
use crate::InferenceError;
use feature_engine::FeatureVector;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Score reported whenever inference fails
pub const SENTINEL_SCORE: f32 = 0.0;

/// Default bound on a single inference call
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Result of inference operation
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    /// Probability of the positive class, or the sentinel on failure
    pub score: f32,
    /// Inference latency in milliseconds
    pub latency_ms: u64,
    /// Why the sentinel was used, if it was
    pub failure: Option<InferenceError>,
}

impl InferenceResult {
    /// Whether the gateway produced a real score
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    fn failed(error: InferenceError, latency_ms: u64) -> Self {
        Self {
            score: SENTINEL_SCORE,
            latency_ms,
            failure: Some(error),
        }
    }
}

/// Runs a gateway under a timeout and turns every failure into the sentinel
pub struct InferenceEngine {
    /// Classifier backend
    gateway: Arc<dyn InferenceGateway>,
    /// Bound on one inference call
    timeout: Duration,
}

impl InferenceEngine {
    /// Create an engine around `gateway`
    pub fn new(gateway: Arc<dyn InferenceGateway>, timeout: Duration) -> Self {
        info!(
            "Creating inference engine: gateway={}, timeout={}ms",
            gateway.name(),
            timeout.as_millis()
        );
        Self { gateway, timeout }
    }

    /// Create an engine with the default timeout
    pub fn with_gateway<G: InferenceGateway + 'static>(gateway: G) -> Self {
        Self::new(Arc::new(gateway), Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    /// Engine whose every prediction fails with [`InferenceError::Unavailable`]
    pub fn unavailable(reason: &str) -> Self {
        Self::with_gateway(UnavailableGateway::new(reason))
    }

    /// Load an ONNX model if a path is given.
    ///
    /// A missing path or a model that fails to load yields an engine that
    /// always returns the sentinel; the load failure is logged.
    pub fn from_model_path(path: Option<&Path>, timeout: Duration) -> Self {
        let gateway: Arc<dyn InferenceGateway> = match path {
            Some(path) => match OnnxGateway::load(path) {
                Ok(gateway) => Arc::new(gateway),
                Err(e) => {
                    warn!("Classifier unavailable: {}", e);
                    Arc::new(UnavailableGateway::new(&e.to_string()))
                }
            },
            None => {
                warn!("No classifier model configured, scores will be {}", SENTINEL_SCORE);
                Arc::new(UnavailableGateway::new("no model configured"))
            }
        };
        Self::new(gateway, timeout)
    }

    /// Run inference on an assembled feature vector
    pub async fn predict(&self, features: &FeatureVector) -> InferenceResult {
        self.predict_raw(features.as_slice()).await
    }

    /// Run inference on raw values; anything but a full vector fails.
    pub async fn predict_raw(&self, values: &[f32]) -> InferenceResult {
        let start = Instant::now();

        if let Err(e) = check_shape(values) {
            warn!("Inference rejected: {}", e);
            return InferenceResult::failed(e, 0);
        }

        let gateway = Arc::clone(&self.gateway);
        let input = values.to_vec();
        let task = tokio::task::spawn_blocking(move || gateway.infer(&input));

        let outcome = match timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(InferenceError::InferenceFailed(join_error.to_string())),
            Err(_) => Err(InferenceError::Timeout(self.timeout.as_millis() as u64)),
        };
        let latency_ms = start.elapsed().as_millis() as u64;

        match outcome.and_then(Self::validate) {
            Ok(score) => {
                debug!("Inference completed in {}ms: score={:.4}", latency_ms, score);
                InferenceResult {
                    score,
                    latency_ms,
                    failure: None,
                }
            }
            Err(e) => {
                warn!(
                    "Inference via {} failed after {}ms, using sentinel {}: {}",
                    self.gateway.name(),
                    latency_ms,
                    SENTINEL_SCORE,
                    e
                );
                InferenceResult::failed(e, latency_ms)
            }
        }
    }

    /// Non-finite output is a failure; finite output is clamped into [0, 1]
    fn validate(score: f32) -> Result<f32, InferenceError> {
        if !score.is_finite() {
            return Err(InferenceError::InferenceFailed(format!(
                "non-finite score {}",
                score
            )));
        }
        if !(0.0..=1.0).contains(&score) {
            warn!("Classifier score {} outside [0, 1], clamping", score);
        }
        Ok(score.clamp(0.0, 1.0))
    }

    /// Name of the configured gateway
    pub fn gateway_name(&self) -> &str {
        self.gateway.name()
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnGateway;
    use feature_engine::{FeatureAssembler, FEATURE_DIMENSION};

    fn constant(score: f32) -> InferenceEngine {
        InferenceEngine::with_gateway(FnGateway::new("constant", move |_| Ok(score)))
    }

    #[tokio::test]
    async fn test_successful_prediction() {
        let engine = constant(0.8);
        let result = engine.predict(&FeatureVector::default()).await;
        assert!(result.succeeded());
        assert_eq!(result.score, 0.8);
    }

    #[tokio::test]
    async fn test_gateway_sees_assembled_vector() {
        let engine = InferenceEngine::with_gateway(FnGateway::new("num-taps", |v| {
            Ok(v[3] / 100.0)
        }));
        let tapping = feature_engine::analyze_tapping(&[0.0, 400.0, 800.0, 1200.0]);
        let vector = FeatureAssembler::assemble(tapping.as_ref(), None, None);

        let result = engine.predict(&vector).await;
        assert_eq!(result.score, 0.04);
    }

    #[tokio::test]
    async fn test_wrong_length_returns_sentinel() {
        let engine = constant(0.9);
        for len in [0, 1, FEATURE_DIMENSION - 1, FEATURE_DIMENSION + 1] {
            let result = engine.predict_raw(&vec![0.5; len]).await;
            assert_eq!(result.score, SENTINEL_SCORE);
            assert_eq!(
                result.failure,
                Some(InferenceError::InvalidInputShape {
                    expected: FEATURE_DIMENSION,
                    actual: len
                })
            );
        }
    }

    #[tokio::test]
    async fn test_gateway_error_returns_sentinel() {
        let engine = InferenceEngine::with_gateway(FnGateway::new("broken", |_| {
            Err(InferenceError::InferenceFailed("tensor mismatch".into()))
        }));
        let result = engine.predict(&FeatureVector::default()).await;
        assert_eq!(result.score, SENTINEL_SCORE);
        assert!(!result.succeeded());
    }

    #[tokio::test]
    async fn test_unavailable_returns_sentinel() {
        let engine = InferenceEngine::unavailable("no model configured");
        let result = engine.predict(&FeatureVector::default()).await;
        assert_eq!(result.score, SENTINEL_SCORE);
        assert!(matches!(result.failure, Some(InferenceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_missing_model_path_degrades() {
        let engine = InferenceEngine::from_model_path(
            Some(Path::new("/nonexistent/model.onnx")),
            Duration::from_millis(100),
        );
        assert_eq!(engine.gateway_name(), "unavailable");
        let result = engine.predict(&FeatureVector::default()).await;
        assert_eq!(result.score, SENTINEL_SCORE);

        let engine = InferenceEngine::from_model_path(None, Duration::from_millis(100));
        assert_eq!(engine.gateway_name(), "unavailable");
    }

    #[tokio::test]
    async fn test_timeout_returns_sentinel() {
        let slow = FnGateway::new("slow", |_| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(0.9)
        });
        let engine = InferenceEngine::new(Arc::new(slow), Duration::from_millis(20));

        let result = engine.predict(&FeatureVector::default()).await;
        assert_eq!(result.score, SENTINEL_SCORE);
        assert_eq!(result.failure, Some(InferenceError::Timeout(20)));
    }

    #[tokio::test]
    async fn test_panicking_gateway_returns_sentinel() {
        let engine = InferenceEngine::with_gateway(FnGateway::new("panics", |_| {
            panic!("backend crashed")
        }));
        let result = engine.predict(&FeatureVector::default()).await;
        assert_eq!(result.score, SENTINEL_SCORE);
        assert!(matches!(result.failure, Some(InferenceError::InferenceFailed(_))));
    }

    #[tokio::test]
    async fn test_output_validation() {
        let result = constant(f32::NAN).predict(&FeatureVector::default()).await;
        assert_eq!(result.score, SENTINEL_SCORE);
        assert!(!result.succeeded());

        let result = constant(1.7).predict(&FeatureVector::default()).await;
        assert!(result.succeeded());
        assert_eq!(result.score, 1.0);
    }
}
