//! Elementary Signal Statistics

use serde::{Deserialize, Serialize};

/// Denominators below this magnitude are treated as degenerate
const DEGENERATE_DENOMINATOR: f64 = 1e-9;

/// Summary statistics for a numeric sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation (divides by N)
    pub std_dev: f64,
    /// Coefficient of variation, 0 unless the mean is positive
    pub cv: f64,
}

impl SignalStats {
    /// Compute mean, population std and CV. An empty slice yields all zeros.
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;

        let variance = values
            .iter()
            .map(|&v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();

        let cv = if mean > 0.0 { std_dev / mean } else { 0.0 };

        Self { mean, std_dev, cv }
    }

    /// Least-squares slope of `values` against their index (0..N-1).
    ///
    /// Returns 0 for fewer than two points or a degenerate regression.
    pub fn slope(values: &[f64]) -> f64 {
        let n = values.len();
        if n < 2 {
            return 0.0;
        }

        let nf = n as f64;
        let sum_x = (n * (n - 1)) as f64 / 2.0;
        let sum_y: f64 = values.iter().sum();
        let sum_xy: f64 = values.iter().enumerate().map(|(i, &y)| i as f64 * y).sum();
        let sum_x2: f64 = (0..n).map(|i| (i * i) as f64).sum();

        let numerator = nf * sum_xy - sum_x * sum_y;
        let denominator = nf * sum_x2 - sum_x * sum_x;

        if denominator.abs() < DEGENERATE_DENOMINATOR {
            0.0
        } else {
            numerator / denominator
        }
    }

    /// Root mean square. An empty slice yields 0.
    pub fn rms(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
    }
}
