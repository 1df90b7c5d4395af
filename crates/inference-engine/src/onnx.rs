//! ONNX Classifier Gateway (tract)

use crate::gateway::{check_shape, InferenceGateway};
use crate::InferenceError;
use feature_engine::FEATURE_DIMENSION;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tract_onnx::prelude::*;

/// Runs an ONNX binary classifier with a `[1, 38]` f32 input and a single
/// probability output.
pub struct OnnxGateway {
    /// Model path
    model_path: PathBuf,
    /// Optimized, runnable plan
    model: TypedRunnableModel<TypedModel>,
}

impl OnnxGateway {
    /// Load and optimize the model at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading ONNX classifier from {}", path.display());

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| m.with_input_fact(0, f32::fact([1, FEATURE_DIMENSION]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        info!("Model loaded successfully");
        Ok(Self {
            model_path: path.to_path_buf(),
            model,
        })
    }

    /// Get model path
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl InferenceGateway for OnnxGateway {
    fn infer(&self, features: &[f32]) -> Result<f32, InferenceError> {
        check_shape(features)?;

        let input = Tensor::from_shape(&[1, FEATURE_DIMENSION], features)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no outputs".into()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
        let score = view
            .iter()
            .next()
            .copied()
            .ok_or_else(|| InferenceError::InferenceFailed("empty output tensor".into()))?;

        debug!("ONNX score: {}", score);
        Ok(score)
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
