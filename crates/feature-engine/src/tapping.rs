//! Finger-Tapping Interval Features

use crate::statistics::SignalStats;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Minimum number of taps needed to get two inter-tap intervals
pub const MIN_TAPS: usize = 3;

/// Tapping feature group (5 values)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TappingFeatures {
    /// Mean inter-tap interval (s)
    pub iti_mean: f64,
    /// Population std of inter-tap intervals (s)
    pub iti_std: f64,
    /// Coefficient of variation of inter-tap intervals
    pub iti_cv: f64,
    /// Number of taps recorded
    pub num_taps: f64,
    /// Fatigue slope: regression slope of ITI over interval index
    pub iti_slope: f64,
}

impl TappingFeatures {
    /// Values in assembly order
    pub fn to_array(&self) -> [f64; 5] {
        [
            self.iti_mean,
            self.iti_std,
            self.iti_cv,
            self.num_taps,
            self.iti_slope,
        ]
    }
}

/// Inter-tap intervals in seconds from absolute timestamps in milliseconds
pub fn inter_tap_intervals(timestamps_ms: &[f64]) -> Vec<f64> {
    timestamps_ms
        .windows(2)
        .map(|w| (w[1] - w[0]) / 1000.0)
        .collect()
}

/// Extract tapping features from tap timestamps (ms).
///
/// Returns `None` with fewer than [`MIN_TAPS`] taps, or when any timestamp
/// or resulting feature is not finite.
pub fn analyze_tapping(timestamps_ms: &[f64]) -> Option<TappingFeatures> {
    if timestamps_ms.len() < MIN_TAPS {
        debug!("Tapping: {} taps, need {}", timestamps_ms.len(), MIN_TAPS);
        return None;
    }
    if timestamps_ms.iter().any(|t| !t.is_finite()) {
        warn!("Tapping: non-finite timestamp, group left neutral");
        return None;
    }

    let itis = inter_tap_intervals(timestamps_ms);
    let stats = SignalStats::compute(&itis);
    let slope = SignalStats::slope(&itis);

    debug!(
        "Tapping: {} taps, iti_mean={:.4}s, iti_std={:.4}s, slope={:.6}",
        timestamps_ms.len(),
        stats.mean,
        stats.std_dev,
        slope
    );

    let features = TappingFeatures {
        iti_mean: stats.mean,
        iti_std: stats.std_dev,
        iti_cv: stats.cv,
        num_taps: timestamps_ms.len() as f64,
        iti_slope: slope,
    };
    if features.to_array().iter().any(|v| !v.is_finite()) {
        warn!("Tapping: features overflowed, group left neutral");
        return None;
    }

    Some(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_tapping() {
        let features = analyze_tapping(&[0.0, 500.0, 1000.0, 1500.0, 2000.0]).unwrap();
        assert!((features.iti_mean - 0.5).abs() < 1e-12);
        assert_eq!(features.iti_std, 0.0);
        assert_eq!(features.iti_cv, 0.0);
        assert_eq!(features.num_taps, 5.0);
        assert_eq!(features.iti_slope, 0.0);
    }

    #[test]
    fn test_slowing_tapping_has_positive_slope() {
        // Intervals 0.2, 0.3, 0.4, 0.5 s
        let features = analyze_tapping(&[0.0, 200.0, 500.0, 900.0, 1400.0]).unwrap();
        assert!((features.iti_slope - 0.1).abs() < 1e-9);
        assert!(features.iti_cv > 0.0);
    }

    #[test]
    fn test_too_few_taps() {
        assert!(analyze_tapping(&[]).is_none());
        assert!(analyze_tapping(&[100.0]).is_none());
        assert!(analyze_tapping(&[100.0, 400.0]).is_none());
    }

    #[test]
    fn test_non_finite_timestamps_are_neutral() {
        assert!(analyze_tapping(&[f64::NAN, 1.0, 2.0]).is_none());
        assert!(analyze_tapping(&[0.0, 500.0, f64::INFINITY]).is_none());
        assert!(analyze_tapping(&[0.0, f64::MAX, -f64::MAX]).is_none());
    }

    #[test]
    fn test_intervals_in_seconds() {
        assert_eq!(inter_tap_intervals(&[1000.0, 1250.0, 2000.0]), vec![0.25, 0.75]);
        assert!(inter_tap_intervals(&[5.0]).is_empty());
    }
}
