//! Accelerometer Tremor Features

use crate::fft::SpectralAnalyzer;
use crate::filter::bandpass;
use crate::statistics::SignalStats;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Largest transform length used for the tremor spectrum
pub const MAX_NFFT: usize = 1024;

/// Frequency band definitions (Hz)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TremorBands {
    /// Band-pass applied before spectral analysis
    pub passband: (f64, f64),
    /// Rest-tremor band
    pub low: (f64, f64),
    /// Action/physiological tremor band
    pub high: (f64, f64),
}

impl Default for TremorBands {
    fn default() -> Self {
        Self {
            passband: (3.0, 12.0),
            low: (3.0, 7.0),
            high: (7.0, 12.0),
        }
    }
}

/// Tremor feature group (5 values)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TremorFeatures {
    /// Frequency of the strongest spectral bin (Hz)
    pub peak_freq: f64,
    /// Power of the strongest spectral bin
    pub peak_power: f64,
    /// Integrated power over 3-7 Hz
    pub power_3_7: f64,
    /// Integrated power over 7-12 Hz
    pub power_7_12: f64,
    /// RMS of the band-passed signal
    pub rms: f64,
}

impl TremorFeatures {
    /// Values in assembly order
    pub fn to_array(&self) -> [f64; 5] {
        [
            self.peak_freq,
            self.peak_power,
            self.power_3_7,
            self.power_7_12,
            self.rms,
        ]
    }
}

/// Tremor analyzer for accelerometer magnitude traces
pub struct TremorAnalyzer {
    /// Spectral analyzer
    spectral: SpectralAnalyzer,
    /// Frequency bands
    bands: TremorBands,
}

impl TremorAnalyzer {
    /// Create a new tremor analyzer with default bands
    pub fn new() -> Self {
        Self::with_bands(TremorBands::default())
    }

    /// Create a tremor analyzer with custom bands
    pub fn with_bands(bands: TremorBands) -> Self {
        Self {
            spectral: SpectralAnalyzer::new(),
            bands,
        }
    }

    /// Extract tremor features from a magnitude trace sampled at `fs` Hz.
    ///
    /// Needs at least one second of finite data; returns `None` otherwise.
    pub fn analyze(&mut self, magnitudes: &[f64], fs: f64) -> Option<TremorFeatures> {
        if !(fs > 0.0) || (magnitudes.len() as f64) < fs {
            debug!(
                "Tremor: {} samples at {} Hz is under one second",
                magnitudes.len(),
                fs
            );
            return None;
        }
        if magnitudes.iter().any(|m| !m.is_finite()) {
            warn!("Tremor: non-finite sample, group left neutral");
            return None;
        }

        let mean = SignalStats::compute(magnitudes).mean;
        let centered: Vec<f64> = magnitudes.iter().map(|&v| v - mean).collect();

        let (low, high) = self.bands.passband;
        let filtered = bandpass(&centered, fs, low, high);

        let nfft = MAX_NFFT.min(filtered.len());
        let spectrum = self.spectral.power_spectrum(&filtered, fs, nfft);
        let idx = spectrum.peak_index()?;

        let features = TremorFeatures {
            peak_freq: spectrum.frequencies[idx],
            peak_power: spectrum.power[idx],
            power_3_7: spectrum.band_power(self.bands.low.0, self.bands.low.1),
            power_7_12: spectrum.band_power(self.bands.high.0, self.bands.high.1),
            rms: SignalStats::rms(&filtered),
        };

        if features.to_array().iter().any(|v| !v.is_finite()) {
            warn!("Tremor: features overflowed, group left neutral");
            return None;
        }

        debug!(
            "Tremor: nfft={}, peak={:.2}Hz, power_3_7={:.6}, power_7_12={:.6}, rms={:.4}",
            nfft, features.peak_freq, features.power_3_7, features.power_7_12, features.rms
        );

        Some(features)
    }
}

impl Default for TremorAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const GRAVITY: f64 = 9.81;

    fn tremor_trace(freq: f64, fs: f64, samples: usize) -> Vec<f64> {
        (0..samples)
            .map(|i| GRAVITY + 0.5 * (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_five_hz_tremor() {
        let fs = 50.0;
        let mut analyzer = TremorAnalyzer::new();
        let features = analyzer.analyze(&tremor_trace(5.0, fs, 500), fs).unwrap();

        // nfft = 500 gives 0.1 Hz bins
        let resolution = fs / 500.0;
        assert!((features.peak_freq - 5.0).abs() <= resolution);
        assert!(features.peak_power > 0.0);
        assert!(features.power_3_7 > features.power_7_12);
        assert!(features.rms > 0.0);
    }

    #[test]
    fn test_ten_hz_tremor_lands_in_high_band() {
        let fs = 50.0;
        let mut analyzer = TremorAnalyzer::new();
        let features = analyzer.analyze(&tremor_trace(10.0, fs, 750), fs).unwrap();

        assert!((features.peak_freq - 10.0).abs() <= fs / 750.0);
        assert!(features.power_7_12 > features.power_3_7);
    }

    #[test]
    fn test_long_trace_uses_capped_nfft() {
        let fs = 50.0;
        let mut analyzer = TremorAnalyzer::new();
        // 30 s of data, transform capped at 1024 points
        let features = analyzer.analyze(&tremor_trace(5.0, fs, 1500), fs).unwrap();
        assert!((features.peak_freq - 5.0).abs() <= fs / MAX_NFFT as f64);
    }

    #[test]
    fn test_non_finite_samples_are_neutral() {
        let mut analyzer = TremorAnalyzer::new();
        let mut trace = tremor_trace(5.0, 50.0, 100);
        trace[40] = f64::INFINITY;
        assert!(analyzer.analyze(&trace, 50.0).is_none());

        trace[40] = f64::NAN;
        assert!(analyzer.analyze(&trace, 50.0).is_none());

        let huge = vec![f64::MAX; 100];
        if let Some(features) = analyzer.analyze(&huge, 50.0) {
            assert!(features.to_array().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_under_one_second() {
        let mut analyzer = TremorAnalyzer::new();
        assert!(analyzer.analyze(&tremor_trace(5.0, 50.0, 49), 50.0).is_none());
        assert!(analyzer.analyze(&[], 50.0).is_none());
        assert!(analyzer.analyze(&[1.0; 100], 0.0).is_none());
    }

    #[test]
    fn test_still_device() {
        let mut analyzer = TremorAnalyzer::new();
        let features = analyzer.analyze(&vec![GRAVITY; 100], 50.0).unwrap();
        assert!(features.rms.abs() < 1e-9);
        assert!(features.power_3_7.abs() < 1e-12);
        assert!(features.power_7_12.abs() < 1e-12);
    }
}
