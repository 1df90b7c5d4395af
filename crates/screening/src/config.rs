//! Screening configuration

use crate::ScreeningError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix (`BIOSCREEN_LOG_LEVEL`, ...)
pub const ENV_PREFIX: &str = "BIOSCREEN";

/// Screening configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    /// Accelerometer rate used when a tremor capture does not state one (Hz)
    pub tremor_sample_rate_hz: f64,

    /// Audio rate used when a voice capture does not state one (Hz)
    pub voice_sample_rate_hz: u32,

    /// ONNX classifier; without one every score is the sentinel
    pub model_path: Option<PathBuf>,

    /// Bound on one inference call (milliseconds)
    pub inference_timeout_ms: u64,

    /// sqlx SQLite URL; results stay in memory when unset
    pub database_url: Option<String>,

    /// Max log level
    pub log_level: String,

    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            tremor_sample_rate_hz: 50.0,
            voice_sample_rate_hz: 16000,
            model_path: None,
            inference_timeout_ms: 2000,
            database_url: None,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ScreeningConfig {
    /// Defaults, then the optional file (TOML, JSON, ... by extension), then
    /// `BIOSCREEN_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ScreeningError> {
        Self::load_from(path, ENV_PREFIX)
    }

    fn load_from(path: Option<&Path>, env_prefix: &str) -> Result<Self, ScreeningError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!("Reading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| ScreeningError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject rates and timeouts the analyzers cannot work with
    pub fn validate(&self) -> Result<(), ScreeningError> {
        if !(self.tremor_sample_rate_hz.is_finite() && self.tremor_sample_rate_hz > 0.0) {
            return Err(ScreeningError::Config(format!(
                "tremor_sample_rate_hz must be positive, got {}",
                self.tremor_sample_rate_hz
            )));
        }
        if self.voice_sample_rate_hz == 0 {
            return Err(ScreeningError::Config(
                "voice_sample_rate_hz must be positive".to_string(),
            ));
        }
        if self.inference_timeout_ms == 0 {
            return Err(ScreeningError::Config(
                "inference_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = ScreeningConfig::load_from(None, "BIOSCREEN_TEST_DEFAULTS").unwrap();
        assert_eq!(config, ScreeningConfig::default());
        assert_eq!(config.tremor_sample_rate_hz, 50.0);
        assert_eq!(config.voice_sample_rate_hz, 16000);
        assert_eq!(config.inference_timeout_ms, 2000);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screening.toml");
        fs::write(
            &path,
            "voice_sample_rate_hz = 8000\nmodel_path = \"/models/pd.onnx\"\nlog_json = true\n",
        )
        .unwrap();

        let config = ScreeningConfig::load_from(Some(&path), "BIOSCREEN_TEST_FILE").unwrap();
        assert_eq!(config.voice_sample_rate_hz, 8000);
        assert_eq!(config.model_path, Some(PathBuf::from("/models/pd.onnx")));
        assert!(config.log_json);
        assert_eq!(config.tremor_sample_rate_hz, 50.0);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screening.json");
        fs::write(&path, r#"{"log_level": "warn", "inference_timeout_ms": 500}"#).unwrap();

        std::env::set_var("BIOSCREEN_TEST_ENV_LOG_LEVEL", "debug");
        let config = ScreeningConfig::load_from(Some(&path), "BIOSCREEN_TEST_ENV").unwrap();
        std::env::remove_var("BIOSCREEN_TEST_ENV_LOG_LEVEL");

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.inference_timeout_ms, 500);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ScreeningConfig::load_from(
            Some(Path::new("/nonexistent/screening.toml")),
            "BIOSCREEN_TEST_MISSING",
        );
        assert!(matches!(result, Err(ScreeningError::Config(_))));
    }

    #[test]
    fn test_validation() {
        let config = ScreeningConfig {
            tremor_sample_rate_hz: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ScreeningConfig {
            inference_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(ScreeningConfig::default().validate().is_ok());
    }
}
