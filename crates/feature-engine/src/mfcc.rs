//! Mel-Frequency Cepstral Coefficients

use serde::{Deserialize, Serialize};

/// Floor applied to log filter-bank energies (silent bands)
const LOG_FLOOR: f64 = -50.0;

/// MFCC analysis parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MfccParams {
    /// Number of cepstral coefficients kept
    pub num_coefficients: usize,
    /// Number of triangular mel filters
    pub num_mel_bands: usize,
    /// Lower edge of the filter bank (Hz)
    pub low_freq_hz: f64,
    /// Upper edge of the filter bank (Hz)
    pub high_freq_hz: f64,
}

impl Default for MfccParams {
    fn default() -> Self {
        Self {
            num_coefficients: 13,
            num_mel_bands: 20,
            low_freq_hz: 150.0,
            high_freq_hz: 6800.0,
        }
    }
}

/// Hz to mel (HTK formula)
pub fn hz_to_mel(freq: f64) -> f64 {
    2595.0 * (1.0 + freq / 700.0).log10()
}

/// Mel to Hz (HTK formula)
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filter bank over a fixed frame size, with DCT-II output
#[derive(Debug, Clone)]
pub struct MelFilterBank {
    params: MfccParams,
    /// Filter edge/centre bins: `num_mel_bands + 2` entries
    centers: Vec<usize>,
}

impl MelFilterBank {
    /// Build the filter bank for frames of `frame_size` samples at `sample_rate` Hz
    pub fn new(frame_size: usize, sample_rate: f64, params: MfccParams) -> Self {
        let nyquist_bin = frame_size / 2;
        let to_bin = |freq: f64| -> usize {
            let bin = (freq / sample_rate * frame_size as f64).round();
            (bin.max(0.0) as usize).min(nyquist_bin)
        };

        let mel_low = hz_to_mel(params.low_freq_hz);
        let mel_high = hz_to_mel(params.high_freq_hz);
        let step = (mel_high - mel_low) / (params.num_mel_bands + 1) as f64;

        let centers = (0..params.num_mel_bands + 2)
            .map(|i| to_bin(mel_to_hz(mel_low + step * i as f64)))
            .collect();

        Self { params, centers }
    }

    /// Filter-bank edge bins, lowest first
    pub fn center_bins(&self) -> &[usize] {
        &self.centers
    }

    /// Apply the triangular filters to a magnitude spectrum
    pub fn filter(&self, magnitudes: &[f64]) -> Vec<f64> {
        let bin = |i: usize| magnitudes.get(i).copied().unwrap_or(0.0);

        (1..=self.params.num_mel_bands)
            .map(|k| {
                let (left, center, right) =
                    (self.centers[k - 1], self.centers[k], self.centers[k + 1]);

                // Rising edge, inclusive of both ends
                let rise_width = (center - left + 1) as f64;
                let rising: f64 = (left..=center)
                    .map(|i| bin(i) * (i - left + 1) as f64)
                    .sum::<f64>()
                    / rise_width;

                // Falling edge, excluding the centre bin
                let fall_width = (right - center + 1) as f64;
                let falling: f64 = (center + 1..=right)
                    .map(|i| bin(i) * (1.0 - (i - center) as f64 / fall_width))
                    .sum();

                rising + falling
            })
            .collect()
    }

    /// Natural log of filter energies, floored
    fn log_energies(energies: &[f64]) -> Vec<f64> {
        energies
            .iter()
            .map(|&e| {
                let l = e.ln();
                if l.is_nan() || l < LOG_FLOOR {
                    LOG_FLOOR
                } else {
                    l
                }
            })
            .collect()
    }

    /// Unnormalized DCT-II of the log energies, first `num_coefficients` terms
    fn cepstrum(&self, log_energies: &[f64]) -> Vec<f64> {
        let m = log_energies.len() as f64;
        (0..self.params.num_coefficients)
            .map(|i| {
                log_energies
                    .iter()
                    .enumerate()
                    .map(|(j, &f)| {
                        f * (std::f64::consts::PI * i as f64 / m * (j as f64 + 0.5)).cos()
                    })
                    .sum()
            })
            .collect()
    }

    /// MFCC vector (coefficient 0 first) for one frame's magnitude spectrum
    pub fn mfcc(&self, magnitudes: &[f64]) -> Vec<f64> {
        let energies = self.filter(magnitudes);
        self.cepstrum(&Self::log_energies(&energies))
    }

    /// Number of coefficients produced per frame
    pub fn num_coefficients(&self) -> usize {
        self.params.num_coefficients
    }
}
