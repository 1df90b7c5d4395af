//! In-Memory Repository

use crate::{ResultRecord, StorageError, TestKind};
use std::sync::Mutex;
use tracing::{debug, info};

/// Result repository held in memory
pub struct Repository {
    /// Stored results, oldest first
    results: Mutex<Vec<ResultRecord>>,
    /// Max records kept before the oldest is dropped
    max_records: usize,
    /// Next record ID
    next_id: Mutex<i64>,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    /// Create a repository keeping at most `max_records` results
    pub fn with_capacity(max_records: usize) -> Self {
        info!("Creating in-memory result repository (max {} records)", max_records);
        Self {
            results: Mutex::new(Vec::new()),
            max_records: max_records.max(1),
            next_id: Mutex::new(1),
        }
    }

    /// Insert a result; its `id` is replaced by the assigned one
    pub fn insert_result(&self, mut record: ResultRecord) -> Result<i64, StorageError> {
        let mut results = self
            .results
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;
        let mut id = self
            .next_id
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        record.id = *id;
        *id += 1;

        // Enforce retention
        if results.len() >= self.max_records {
            results.remove(0);
        }

        let returned_id = record.id;
        results.push(record);
        debug!("Inserted result with ID {}", returned_id);

        Ok(returned_id)
    }

    /// Get a result by ID
    pub fn get_result(&self, id: i64) -> Result<ResultRecord, StorageError> {
        let results = self
            .results
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        results
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Newest results first, optionally restricted to one test kind
    pub fn get_results(
        &self,
        kind: Option<TestKind>,
        limit: usize,
    ) -> Result<Vec<ResultRecord>, StorageError> {
        let results = self
            .results
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        let mut filtered: Vec<_> = results
            .iter()
            .filter(|r| kind.map_or(true, |k| r.test_kind == k))
            .cloned()
            .collect();
        filtered.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms).then(b.id.cmp(&a.id)));
        filtered.truncate(limit);

        Ok(filtered)
    }

    /// Get total result count
    pub fn result_count(&self) -> usize {
        self.results.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Clear all data
    pub fn clear(&self) {
        if let Ok(mut results) = self.results.lock() {
            results.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
