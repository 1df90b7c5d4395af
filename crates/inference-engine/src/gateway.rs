//! Classifier Gateway Contract

use crate::InferenceError;
use feature_engine::FEATURE_DIMENSION;

/// Opaque classifier: feature vector in, probability out.
///
/// Implementations may block; the engine calls them off the async runtime.
pub trait InferenceGateway: Send + Sync {
    /// Score a feature vector. `features` should hold exactly
    /// [`FEATURE_DIMENSION`] values.
    fn infer(&self, features: &[f32]) -> Result<f32, InferenceError>;

    /// Short name for logs
    fn name(&self) -> &str {
        "gateway"
    }
}

/// Reject anything that is not a full feature vector
pub(crate) fn check_shape(features: &[f32]) -> Result<(), InferenceError> {
    if features.len() != FEATURE_DIMENSION {
        return Err(InferenceError::InvalidInputShape {
            expected: FEATURE_DIMENSION,
            actual: features.len(),
        });
    }
    Ok(())
}

/// Gateway backed by a plain function, used for stubs and rule-based scorers
pub struct FnGateway<F> {
    name: String,
    func: F,
}

impl<F> FnGateway<F>
where
    F: Fn(&[f32]) -> Result<f32, InferenceError> + Send + Sync,
{
    /// Wrap a scoring function
    pub fn new(name: &str, func: F) -> Self {
        Self {
            name: name.to_string(),
            func,
        }
    }
}

impl<F> InferenceGateway for FnGateway<F>
where
    F: Fn(&[f32]) -> Result<f32, InferenceError> + Send + Sync,
{
    fn infer(&self, features: &[f32]) -> Result<f32, InferenceError> {
        check_shape(features)?;
        (self.func)(features)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Gateway used when no model is configured or loading failed
pub struct UnavailableGateway {
    reason: String,
}

impl UnavailableGateway {
    /// Create an unavailable gateway that reports `reason` on every call
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl InferenceGateway for UnavailableGateway {
    fn infer(&self, _features: &[f32]) -> Result<f32, InferenceError> {
        Err(InferenceError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_gateway_checks_shape() {
        let gateway = FnGateway::new("constant", |_| Ok(0.25));
        assert_eq!(gateway.infer(&[0.0; FEATURE_DIMENSION]), Ok(0.25));
        assert_eq!(
            gateway.infer(&[0.0; 10]),
            Err(InferenceError::InvalidInputShape {
                expected: FEATURE_DIMENSION,
                actual: 10
            })
        );
        assert_eq!(gateway.name(), "constant");
    }

    #[test]
    fn test_unavailable_gateway() {
        let gateway = UnavailableGateway::new("no model configured");
        assert!(matches!(
            gateway.infer(&[0.0; FEATURE_DIMENSION]),
            Err(InferenceError::Unavailable(_))
        ));
    }
}
