//! Single-pass IIR Filters
//!
//! Filters run forward once over the whole buffer with zero initial state.
//! The band-pass is therefore not zero-phase: it shifts phase relative to a
//! forward-backward design. Downstream feature distributions were calibrated
//! against this single-pass output, so it must stay single-pass.

use std::f64::consts::PI;

/// Decay constant used by the four-pole low-pass design
const LOW_PASS_DECAY: f64 = 14.445;

/// First-order high-pass filter with cutoff `cutoff_hz`.
///
/// `y[n] = (1+x)/2 * (s[n] - s[n-1]) + x * y[n-1]` with `x = exp(-2π fc/fs)`.
pub fn high_pass(signal: &[f64], fs: f64, cutoff_hz: f64) -> Vec<f64> {
    let x = (-2.0 * PI * cutoff_hz / fs).exp();
    let gain = (1.0 + x) / 2.0;

    let mut out = Vec::with_capacity(signal.len());
    let mut prev_in = 0.0;
    let mut prev_out = 0.0;
    for &s in signal {
        let y = gain * s - gain * prev_in + x * prev_out;
        prev_in = s;
        prev_out = y;
        out.push(y);
    }
    out
}

/// Four-pole recursive low-pass filter with cutoff `cutoff_hz`.
///
/// `y[n] = (1-x)^4 s[n] + 4x y[n-1] - 6x² y[n-2] + 4x³ y[n-3] - x⁴ y[n-4]`
/// with `x = exp(-14.445 fc/fs)`.
pub fn low_pass(signal: &[f64], fs: f64, cutoff_hz: f64) -> Vec<f64> {
    let x = (-LOW_PASS_DECAY * cutoff_hz / fs).exp();
    let a0 = (1.0 - x).powi(4);
    let feedback = [4.0 * x, -6.0 * x * x, 4.0 * x.powi(3), -x.powi(4)];

    let mut out = Vec::with_capacity(signal.len());
    // history[0] is y[n-1]
    let mut history = [0.0f64; 4];
    for &s in signal {
        let y = a0 * s
            + feedback
                .iter()
                .zip(history.iter())
                .map(|(b, h)| b * h)
                .sum::<f64>();
        history.rotate_right(1);
        history[0] = y;
        out.push(y);
    }
    out
}

/// Cascaded high-pass then low-pass, passing roughly `[low_hz, high_hz]`.
///
/// Returns the input unchanged when `fs` is not positive.
pub fn bandpass(signal: &[f64], fs: f64, low_hz: f64, high_hz: f64) -> Vec<f64> {
    if signal.is_empty() || !(fs > 0.0) {
        return signal.to_vec();
    }
    let hp = high_pass(signal, fs, low_hz);
    low_pass(&hp, fs, high_hz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::SignalStats;

    fn sine(freq: f64, fs: f64, seconds: f64) -> Vec<f64> {
        let n = (fs * seconds) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_high_pass_blocks_dc() {
        let out = high_pass(&vec![5.0; 500], 50.0, 3.0);
        assert!(out.last().unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_low_pass_passes_dc() {
        let out = low_pass(&vec![2.0; 200], 50.0, 12.0);
        assert!((out.last().unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_bandpass_attenuates_out_of_band() {
        let fs = 200.0;
        let in_band = bandpass(&sine(6.0, fs, 5.0), fs, 3.0, 12.0);
        let above = bandpass(&sine(60.0, fs, 5.0), fs, 3.0, 12.0);

        // Skip the start-up transient
        let rms_in = SignalStats::rms(&in_band[200..]);
        let rms_above = SignalStats::rms(&above[200..]);
        assert!(rms_in > 4.0 * rms_above);
    }

    #[test]
    fn test_single_pass_is_causal() {
        // An impulse at index 10 must not leak into earlier output samples
        let mut signal = vec![0.0; 64];
        signal[10] = 1.0;
        let out = bandpass(&signal, 50.0, 3.0, 12.0);
        assert!(out[..10].iter().all(|&v| v == 0.0));
        assert!(out[10] != 0.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(bandpass(&[], 50.0, 3.0, 12.0).is_empty());
        assert_eq!(bandpass(&[1.0, 2.0], 0.0, 3.0, 12.0), vec![1.0, 2.0]);
    }
}
