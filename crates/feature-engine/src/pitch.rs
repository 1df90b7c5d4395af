//! YIN Pitch Estimation and Harmonic-to-Noise Ratio

use serde::{Deserialize, Serialize};

/// Default absolute threshold on the normalized difference function
pub const DEFAULT_THRESHOLD: f64 = 0.20;

/// Periodicity is clamped away from 0 and 1 so the HNR stays finite
const PERIODICITY_EPSILON: f64 = 1e-6;

/// Pitch estimate for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchEstimate {
    /// Fundamental frequency (Hz), `None` for unvoiced frames
    pub frequency_hz: Option<f64>,
    /// `1 - d'(tau)` at the chosen period, 0 for unvoiced frames
    pub periodicity: f64,
}

impl PitchEstimate {
    /// Whether a period was detected
    pub fn is_voiced(&self) -> bool {
        self.frequency_hz.is_some()
    }

    /// Harmonic-to-noise ratio in dB, 0 for unvoiced frames
    pub fn hnr_db(&self) -> f64 {
        if !self.is_voiced() {
            return 0.0;
        }
        let r = self
            .periodicity
            .clamp(PERIODICITY_EPSILON, 1.0 - PERIODICITY_EPSILON);
        10.0 * (r / (1.0 - r)).log10()
    }
}

/// YIN fundamental frequency estimator.
///
/// Uses half the frame as the integration window, so the longest detectable
/// period is `frame_size / 2` samples.
pub struct Yin {
    sample_rate: f64,
    threshold: f64,
    /// Scratch buffer for the difference function
    buffer: Vec<f64>,
}

impl Yin {
    /// Create an estimator for frames of `frame_size` samples
    pub fn new(sample_rate: f64, frame_size: usize) -> Self {
        Self::with_threshold(sample_rate, frame_size, DEFAULT_THRESHOLD)
    }

    /// Create an estimator with a custom absolute threshold
    pub fn with_threshold(sample_rate: f64, frame_size: usize, threshold: f64) -> Self {
        Self {
            sample_rate,
            threshold,
            buffer: vec![0.0; frame_size / 2],
        }
    }

    /// Squared difference d(tau) for each lag in the buffer
    fn difference(&mut self, frame: &[f64]) {
        let window = self.buffer.len();
        for tau in 0..window {
            self.buffer[tau] = (0..window)
                .map(|i| {
                    let delta = frame[i] - frame[i + tau];
                    delta * delta
                })
                .sum();
        }
    }

    /// Cumulative mean normalized difference d'(tau)
    fn cumulative_mean_normalized_difference(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        self.buffer[0] = 1.0;
        let mut running_sum = 0.0;
        for tau in 1..self.buffer.len() {
            running_sum += self.buffer[tau];
            self.buffer[tau] = if running_sum > 0.0 {
                self.buffer[tau] * tau as f64 / running_sum
            } else {
                1.0
            };
        }
    }

    /// First dip below threshold, walked down to its local minimum
    fn absolute_threshold(&self) -> Option<usize> {
        let len = self.buffer.len();
        let mut tau = 2;
        while tau < len {
            if self.buffer[tau] < self.threshold {
                while tau + 1 < len && self.buffer[tau + 1] < self.buffer[tau] {
                    tau += 1;
                }
                return Some(tau);
            }
            tau += 1;
        }
        None
    }

    /// Refine the period with a parabola through the neighbouring lags
    fn parabolic_interpolation(&self, tau: usize) -> f64 {
        if tau == 0 || tau + 1 >= self.buffer.len() {
            return tau as f64;
        }
        let (s0, s1, s2) = (self.buffer[tau - 1], self.buffer[tau], self.buffer[tau + 1]);
        let denominator = 2.0 * (2.0 * s1 - s2 - s0);
        if denominator.abs() < 1e-12 {
            tau as f64
        } else {
            tau as f64 + (s2 - s0) / denominator
        }
    }

    /// Estimate pitch for one frame
    pub fn estimate(&mut self, frame: &[f64]) -> PitchEstimate {
        if self.buffer.len() < 3 || frame.len() < 2 * self.buffer.len() {
            return PitchEstimate::default();
        }

        self.difference(frame);
        self.cumulative_mean_normalized_difference();

        match self.absolute_threshold() {
            Some(tau) => {
                let period = self.parabolic_interpolation(tau);
                PitchEstimate {
                    frequency_hz: (period > 0.0).then(|| self.sample_rate / period),
                    periodicity: 1.0 - self.buffer[tau],
                }
            }
            None => PitchEstimate::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn voiced_frame(f0: f64, sr: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / sr;
                0.6 * (2.0 * PI * f0 * t).sin() + 0.3 * (2.0 * PI * 2.0 * f0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_detects_fundamental() {
        let sr = 16000.0;
        let mut yin = Yin::new(sr, 400);
        let estimate = yin.estimate(&voiced_frame(200.0, sr, 400));

        let f0 = estimate.frequency_hz.unwrap();
        assert!((f0 - 200.0).abs() < 5.0, "f0 = {}", f0);
        assert!(estimate.periodicity > 0.9);
        assert!(estimate.hnr_db() > 10.0);
    }

    #[test]
    fn test_silence_is_unvoiced() {
        let mut yin = Yin::new(16000.0, 400);
        let estimate = yin.estimate(&vec![0.0; 400]);
        assert!(!estimate.is_voiced());
        assert_eq!(estimate.hnr_db(), 0.0);
    }

    #[test]
    fn test_short_frame() {
        let mut yin = Yin::new(16000.0, 400);
        assert_eq!(yin.estimate(&[0.1; 10]), PitchEstimate::default());

        let mut tiny = Yin::new(16000.0, 4);
        assert_eq!(tiny.estimate(&[0.1; 4]), PitchEstimate::default());
    }

    #[test]
    fn test_hnr_is_finite_for_perfect_periodicity() {
        let estimate = PitchEstimate {
            frequency_hz: Some(100.0),
            periodicity: 1.0,
        };
        assert!(estimate.hnr_db().is_finite());
        assert!((estimate.hnr_db() - 60.0).abs() < 1e-3);
    }
}
