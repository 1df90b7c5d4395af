//! Storage Layer
//!
//! Persists one record per screening run: when it ran, which test, the
//! classifier score and a diagnostic feature summary.

mod record;
mod repository;
mod sqlite;

pub use record::{ResultRecord, TestKind};
pub use repository::Repository;
pub use sqlite::SqliteRepository;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            other => StorageError::DatabaseError(other.to_string()),
        }
    }
}
