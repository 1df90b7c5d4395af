//! SQLite Repository (sqlx)

use crate::{ResultRecord, StorageError, TestKind};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

const CREATE_RESULTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp_ms INTEGER NOT NULL,
    test_kind TEXT NOT NULL,
    score REAL NOT NULL,
    feature_summary TEXT NOT NULL
)";

const SELECT_COLUMNS: &str =
    "SELECT id, timestamp_ms, test_kind, score, feature_summary FROM results";

const INSERT_RESULT: &str =
    "INSERT INTO results (timestamp_ms, test_kind, score, feature_summary) VALUES (?, ?, ?, ?)";

type ResultRow = (i64, i64, String, f64, String);

fn into_record(
    (id, timestamp_ms, test_kind, score, feature_summary): ResultRow,
) -> Result<ResultRecord, StorageError> {
    Ok(ResultRecord {
        id,
        timestamp_ms,
        test_kind: test_kind.parse()?,
        score: score as f32,
        feature_summary,
    })
}

/// Result repository backed by a SQLite database
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    ///
    /// `url` is a sqlx SQLite URL such as `sqlite://results.db` or
    /// `sqlite::memory:`.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        info!("Opening SQLite result store at {}", url);

        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // One connection keeps `sqlite::memory:` databases alive and shared
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_RESULTS_TABLE).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Insert a result and return its assigned ID
    pub async fn insert_result(&self, record: &ResultRecord) -> Result<i64, StorageError> {
        let id = sqlx::query(INSERT_RESULT)
            .bind(record.timestamp_ms)
            .bind(record.test_kind.as_str())
            .bind(record.score as f64)
            .bind(record.feature_summary.as_str())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        debug!("Inserted result with ID {}", id);
        Ok(id)
    }

    /// Get a result by ID
    pub async fn get_result(&self, id: i64) -> Result<ResultRecord, StorageError> {
        let row = sqlx::query_as::<_, ResultRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;
        into_record(row)
    }

    /// Newest results first, optionally restricted to one test kind
    pub async fn get_results(
        &self,
        kind: Option<TestKind>,
        limit: usize,
    ) -> Result<Vec<ResultRecord>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = match kind {
            Some(kind) => {
                sqlx::query_as::<_, ResultRow>(&format!(
                    "{} WHERE test_kind = ? ORDER BY timestamp_ms DESC, id DESC LIMIT ?",
                    SELECT_COLUMNS
                ))
                .bind(kind.as_str())
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ResultRow>(&format!(
                    "{} ORDER BY timestamp_ms DESC, id DESC LIMIT ?",
                    SELECT_COLUMNS
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(into_record).collect()
    }

    /// Get total result count
    pub async fn result_count(&self) -> Result<i64, StorageError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM results")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Close the pool, flushing pending writes
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
