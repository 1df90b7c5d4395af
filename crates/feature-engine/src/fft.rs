//! FFT-based Spectral Analysis

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

/// One-sided power spectrum with its frequency axis.
///
/// `frequencies` and `power` always have the same length and the axis is
/// non-decreasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerSpectrum {
    /// Bin frequencies (Hz)
    pub frequencies: Vec<f64>,
    /// Power spectral density per bin
    pub power: Vec<f64>,
}

impl PowerSpectrum {
    /// Number of bins
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the spectrum has no bins
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Index of the strongest bin, first occurrence on ties
    pub fn peak_index(&self) -> Option<usize> {
        if self.power.is_empty() {
            return None;
        }
        let mut best = 0;
        for (i, &p) in self.power.iter().enumerate().skip(1) {
            if p > self.power[best] {
                best = i;
            }
        }
        Some(best)
    }

    /// Trapezoidal power in `[low, high]` (inclusive)
    pub fn band_power(&self, low: f64, high: f64) -> f64 {
        band_power(&self.frequencies, &self.power, low, high)
    }
}

/// Integrate `power` over the inclusive band `[low, high]` with the
/// trapezoidal rule.
///
/// Points are integrated in ascending frequency order, so pairs shuffled
/// consistently integrate to the same value. Fewer than two points in the
/// band yields 0.
pub fn band_power(frequencies: &[f64], power: &[f64], low: f64, high: f64) -> f64 {
    let mut band: Vec<(f64, f64)> = frequencies
        .iter()
        .zip(power)
        .filter(|(&f, _)| f >= low && f <= high)
        .map(|(&f, &p)| (f, p))
        .collect();

    if band.len() < 2 {
        return 0.0;
    }

    band.sort_by(|a, b| a.0.total_cmp(&b.0));

    band.windows(2)
        .map(|w| (w[0].1 + w[1].1) / 2.0 * (w[1].0 - w[0].0))
        .sum()
}

/// Spectral analyzer caching FFT plans between calls
pub struct SpectralAnalyzer {
    /// FFT planner for efficient computation
    planner: FftPlanner<f64>,
}

impl SpectralAnalyzer {
    /// Create a new spectral analyzer
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Forward transform of `signal` zero-padded or truncated to `nfft`
    fn transform(&mut self, signal: &[f64], nfft: usize) -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> = signal
            .iter()
            .take(nfft)
            .map(|&v| Complex::new(v, 0.0))
            .collect();
        buffer.resize(nfft, Complex::new(0.0, 0.0));

        let fft = self.planner.plan_fft_forward(nfft);
        fft.process(&mut buffer);
        buffer
    }

    /// One-sided power spectrum of `signal` sampled at `fs` Hz.
    ///
    /// Power is normalized by `fs * signal.len()`, the un-padded length, not
    /// by `nfft`. Bins cover `[0, nfft / 2)`.
    pub fn power_spectrum(&mut self, signal: &[f64], fs: f64, nfft: usize) -> PowerSpectrum {
        if signal.is_empty() || nfft == 0 || !(fs > 0.0) {
            return PowerSpectrum::default();
        }

        let n = signal.len() as f64;
        let spectrum = self.transform(signal, nfft);
        let half = nfft / 2;

        let power = spectrum
            .iter()
            .take(half)
            .map(|c| c.norm_sqr() / (fs * n))
            .collect();
        let frequencies = (0..half).map(|i| i as f64 * fs / nfft as f64).collect();

        PowerSpectrum { frequencies, power }
    }

    /// Magnitudes of the first `frame.len() / 2 + 1` bins of `frame`
    pub fn magnitude_spectrum(&mut self, frame: &[f64]) -> Vec<f64> {
        if frame.is_empty() {
            return Vec::new();
        }
        let n = frame.len();
        self.transform(frame, n)
            .iter()
            .take(n / 2 + 1)
            .map(|c| c.norm())
            .collect()
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
