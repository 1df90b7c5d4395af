//! Screening Session
//!
//! One session scores captures: extract the feature groups, assemble the
//! vector, ask the classifier, persist the result.

use crate::capture::{magnitude_trace, Capture};
use crate::config::ScreeningConfig;
use crate::ScreeningError;
use feature_engine::{
    analyze_tapping, FeatureSet, FeatureVector, TremorAnalyzer, VoiceAnalyzer,
};
use inference_engine::{InferenceEngine, InferenceResult};
use serde_json::json;
use std::time::Duration;
use storage::{Repository, ResultRecord, SqliteRepository, TestKind};
use tracing::{info, warn};

/// Where results are persisted
pub enum ResultStore {
    /// Kept for the life of the process
    Memory(Repository),
    /// Persisted through sqlx
    Sqlite(SqliteRepository),
}

impl ResultStore {
    /// SQLite store when a URL is given, in-memory otherwise
    pub async fn open(database_url: Option<&str>) -> Result<Self, ScreeningError> {
        match database_url {
            Some(url) => Ok(ResultStore::Sqlite(SqliteRepository::connect(url).await?)),
            None => Ok(ResultStore::Memory(Repository::new())),
        }
    }

    /// Persist a record, returning its assigned ID
    pub async fn insert(&self, record: &ResultRecord) -> Result<i64, ScreeningError> {
        let id = match self {
            ResultStore::Memory(repo) => repo.insert_result(record.clone())?,
            ResultStore::Sqlite(repo) => repo.insert_result(record).await?,
        };
        Ok(id)
    }

    /// Newest results first
    pub async fn recent(
        &self,
        kind: Option<TestKind>,
        limit: usize,
    ) -> Result<Vec<ResultRecord>, ScreeningError> {
        let records = match self {
            ResultStore::Memory(repo) => repo.get_results(kind, limit)?,
            ResultStore::Sqlite(repo) => repo.get_results(kind, limit).await?,
        };
        Ok(records)
    }
}

/// Everything produced by one scored run
#[derive(Debug, Clone)]
pub struct ScreeningOutcome {
    /// The persisted record (with its assigned ID)
    pub record: ResultRecord,
    /// Classifier input
    pub vector: FeatureVector,
    /// Classifier output
    pub inference: InferenceResult,
    /// Groups that went into the vector
    pub features: FeatureSet,
}

impl ScreeningOutcome {
    /// JSON report for display
    pub fn to_report(&self) -> serde_json::Value {
        json!({
            "id": self.record.id,
            "timestamp_ms": self.record.timestamp_ms,
            "test_kind": self.record.test_kind,
            "score": self.record.score,
            "inference": {
                "succeeded": self.inference.succeeded(),
                "latency_ms": self.inference.latency_ms,
                "failure": self.inference.failure.as_ref().map(|e| e.to_string()),
            },
            "groups": {
                "tapping": self.features.tapping.is_some(),
                "tremor": self.features.tremor.is_some(),
                "voice": self.features.voice.is_some(),
            },
            "features": self
                .vector
                .named()
                .map(|(name, value)| (name.to_string(), json!(value)))
                .collect::<serde_json::Map<_, _>>(),
        })
    }
}

/// Screening session
pub struct ScreeningSession {
    config: ScreeningConfig,
    tremor: TremorAnalyzer,
    voice: VoiceAnalyzer,
    engine: InferenceEngine,
    store: ResultStore,
}

impl ScreeningSession {
    /// Create a session from its parts
    pub fn new(config: ScreeningConfig, engine: InferenceEngine, store: ResultStore) -> Self {
        Self {
            config,
            tremor: TremorAnalyzer::new(),
            voice: VoiceAnalyzer::new(),
            engine,
            store,
        }
    }

    /// Build the engine and store described by `config`
    pub async fn from_config(config: ScreeningConfig) -> Result<Self, ScreeningError> {
        let engine = InferenceEngine::from_model_path(
            config.model_path.as_deref(),
            Duration::from_millis(config.inference_timeout_ms),
        );
        let store = ResultStore::open(config.database_url.as_deref()).await?;
        info!(
            "Screening session ready: gateway={}, store={}",
            engine.gateway_name(),
            match store {
                ResultStore::Memory(_) => "memory",
                ResultStore::Sqlite(_) => "sqlite",
            }
        );
        Ok(Self::new(config, engine, store))
    }

    /// Result store
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Fill the group `capture` belongs to; other groups stay untouched.
    pub fn extract(&mut self, capture: &Capture, features: &mut FeatureSet) {
        match capture {
            Capture::Tapping { timestamps_ms } => {
                features.tapping = analyze_tapping(timestamps_ms);
                if features.tapping.is_none() {
                    warn!(
                        "Tapping capture has {} taps, group left neutral",
                        timestamps_ms.len()
                    );
                }
            }
            Capture::Tremor {
                magnitudes,
                axes,
                sample_rate_hz,
            } => {
                let trace = magnitude_trace(magnitudes, axes);
                let fs = sample_rate_hz.unwrap_or(self.config.tremor_sample_rate_hz);
                features.tremor = self.tremor.analyze(&trace, fs);
                if features.tremor.is_none() {
                    warn!(
                        "Tremor capture has {} samples at {} Hz, group left neutral",
                        trace.len(),
                        fs
                    );
                }
            }
            Capture::Voice {
                samples,
                sample_rate_hz,
            } => {
                let sr = sample_rate_hz.unwrap_or(self.config.voice_sample_rate_hz);
                features.voice = self.voice.analyze(samples, sr);
                if features.voice.is_none() {
                    warn!(
                        "Voice capture has {} samples at {} Hz, group left neutral",
                        samples.len(),
                        sr
                    );
                }
            }
        }
    }

    /// Score a single capture on its own
    pub async fn run(&mut self, capture: &Capture) -> Result<ScreeningOutcome, ScreeningError> {
        let mut features = FeatureSet::default();
        self.extract(capture, &mut features);
        self.score(capture.test_kind(), features).await
    }

    /// Tapping test
    pub async fn run_tapping(
        &mut self,
        timestamps_ms: &[f64],
    ) -> Result<ScreeningOutcome, ScreeningError> {
        self.run(&Capture::Tapping {
            timestamps_ms: timestamps_ms.to_vec(),
        })
        .await
    }

    /// Tremor test on a magnitude trace; `None` uses the configured rate
    pub async fn run_tremor(
        &mut self,
        magnitudes: &[f64],
        sample_rate_hz: Option<f64>,
    ) -> Result<ScreeningOutcome, ScreeningError> {
        self.run(&Capture::Tremor {
            magnitudes: magnitudes.to_vec(),
            axes: Vec::new(),
            sample_rate_hz,
        })
        .await
    }

    /// Voice test; `None` uses the configured rate
    pub async fn run_voice(
        &mut self,
        samples: &[f32],
        sample_rate_hz: Option<u32>,
    ) -> Result<ScreeningOutcome, ScreeningError> {
        self.run(&Capture::Voice {
            samples: samples.to_vec(),
            sample_rate_hz,
        })
        .await
    }

    /// Score every available capture together; a later capture of the same
    /// kind replaces an earlier one.
    pub async fn run_combined(
        &mut self,
        captures: &[Capture],
    ) -> Result<ScreeningOutcome, ScreeningError> {
        let mut features = FeatureSet::default();
        for capture in captures {
            self.extract(capture, &mut features);
        }
        self.score(TestKind::Combined, features).await
    }

    async fn score(
        &mut self,
        test_kind: TestKind,
        features: FeatureSet,
    ) -> Result<ScreeningOutcome, ScreeningError> {
        let vector = features.assemble();
        let inference = self.engine.predict(&vector).await;

        let feature_summary = serde_json::to_string(&features)
            .map_err(|e| ScreeningError::Serialization(e.to_string()))?;
        let mut record = ResultRecord {
            id: 0,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            test_kind,
            score: inference.score,
            feature_summary,
        };
        record.id = self.store.insert(&record).await?;

        info!(
            "{} screening #{}: score={:.4} ({})",
            test_kind,
            record.id,
            record.score,
            if inference.succeeded() { "ok" } else { "sentinel" }
        );

        Ok(ScreeningOutcome {
            record,
            vector,
            inference,
            features,
        })
    }
}
