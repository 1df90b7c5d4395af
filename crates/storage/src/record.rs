//! Screening Result Record

use crate::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which capture produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestKind {
    /// Finger-tapping test
    Tapping,
    /// Accelerometer tremor test
    Tremor,
    /// Sustained voice test
    Voice,
    /// All available captures scored together
    Combined,
}

impl TestKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TestKind::Tapping => "TAPPING",
            TestKind::Tremor => "TREMOR",
            TestKind::Voice => "VOICE",
            TestKind::Combined => "COMBINED",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TAPPING" => Ok(TestKind::Tapping),
            "TREMOR" => Ok(TestKind::Tremor),
            "VOICE" => Ok(TestKind::Voice),
            "COMBINED" => Ok(TestKind::Combined),
            other => Err(StorageError::SerializationError(format!(
                "unknown test kind '{}'",
                other
            ))),
        }
    }
}

/// One persisted screening result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Assigned by the repository on insert
    pub id: i64,
    /// Unix time of the run (ms)
    pub timestamp_ms: i64,
    /// Which test produced the score
    pub test_kind: TestKind,
    /// Classifier probability, 0.0 if inference failed
    pub score: f32,
    /// Diagnostic only
    pub feature_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [TestKind::Tapping, TestKind::Tremor, TestKind::Voice, TestKind::Combined] {
            assert_eq!(kind.as_str().parse::<TestKind>().unwrap(), kind);
        }
        assert!("BALANCE".parse::<TestKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&TestKind::Tremor).unwrap(), "\"TREMOR\"");
    }
}
