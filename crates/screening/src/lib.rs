//! Biosignal Screening
//!
//! Wires captures through feature extraction, the classifier gateway and
//! the result store.

pub mod capture;
pub mod config;
pub mod session;

pub use capture::{load_capture, Capture};
pub use config::ScreeningConfig;
pub use session::{ResultStore, ScreeningOutcome, ScreeningSession};

use storage::StorageError;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Screening errors
#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Capture error: {0}")]
    Capture(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Initialize logging; output goes to stderr so reports stay on stdout
pub fn init_logging(level: &str, json: bool) -> Result<(), ScreeningError> {
    let level: Level = level
        .parse()
        .map_err(|_| ScreeningError::Logging(format!("unknown log level '{}'", level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    result.map_err(|e| ScreeningError::Logging(e.to_string()))
}
