//! Voice Spectral and Cepstral Features

use crate::fft::SpectralAnalyzer;
use crate::mfcc::{MelFilterBank, MfccParams};
use crate::pitch::Yin;
use crate::statistics::SignalStats;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Number of MFCC coefficients per frame
pub const N_MFCC: usize = 13;
/// Frame length (s)
pub const FRAME_DURATION: f64 = 0.025;
/// Hop between frame starts (s)
pub const HOP_DURATION: f64 = 0.010;
/// Pre-emphasis coefficient
pub const PRE_EMPHASIS: f64 = 0.97;

/// Magnitude sums below this are treated as silence for the centroid
const SILENT_MAGNITUDE: f64 = 1e-9;

/// Voice feature group (28 values)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceFeatures {
    /// Per-coefficient MFCC mean across frames
    pub mfcc_mean: [f64; N_MFCC],
    /// Per-coefficient MFCC population std across frames
    pub mfcc_std: [f64; N_MFCC],
    /// Mean spectral centroid (Hz)
    pub spectral_centroid_mean: f64,
    /// Mean harmonic-to-noise ratio (dB)
    pub hnr_mean: f64,
}

/// First-order pre-emphasis: `y[0] = x[0]`, `y[i] = x[i] - 0.97 x[i-1]`
pub fn pre_emphasis(signal: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(signal.len());
    if let Some(&first) = signal.first() {
        out.push(first);
    }
    out.extend(signal.windows(2).map(|w| w[1] - PRE_EMPHASIS * w[0]));
    out
}

/// Rectangular frames of `frame_size` every `hop` samples; the trailing
/// partial frame is dropped.
pub fn frames(signal: &[f64], frame_size: usize, hop: usize) -> impl Iterator<Item = &[f64]> {
    let hop = hop.max(1);
    let count = if frame_size == 0 || signal.len() < frame_size {
        0
    } else {
        (signal.len() - frame_size) / hop + 1
    };
    (0..count).map(move |i| &signal[i * hop..i * hop + frame_size])
}

/// Magnitude-weighted mean frequency over bins `[0, n/2)`
pub fn spectral_centroid(magnitudes: &[f64], sample_rate: f64, frame_size: usize) -> f64 {
    let half = frame_size / 2;
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (i, &m) in magnitudes.iter().take(half).enumerate() {
        weighted += m * i as f64 * sample_rate / frame_size as f64;
        total += m;
    }
    if total < SILENT_MAGNITUDE {
        0.0
    } else {
        weighted / total
    }
}

/// Voice analyzer for short normalized recordings
pub struct VoiceAnalyzer {
    /// Spectral analyzer shared by MFCC and centroid
    spectral: SpectralAnalyzer,
    /// MFCC parameters
    params: MfccParams,
}

impl VoiceAnalyzer {
    /// Create a voice analyzer with the default 13-coefficient, 20-band setup
    pub fn new() -> Self {
        Self {
            spectral: SpectralAnalyzer::new(),
            params: MfccParams {
                num_coefficients: N_MFCC,
                ..MfccParams::default()
            },
        }
    }

    /// Extract voice features from `samples` at `sample_rate` Hz.
    ///
    /// Returns `None` when the recording is shorter than one frame or holds a
    /// non-finite sample.
    pub fn analyze(&mut self, samples: &[f32], sample_rate: u32) -> Option<VoiceFeatures> {
        let sr = sample_rate as f64;
        if sample_rate == 0 || (samples.len() as f64) < sr * FRAME_DURATION {
            debug!(
                "Voice: {} samples at {} Hz is shorter than one frame",
                samples.len(),
                sample_rate
            );
            return None;
        }

        if samples.iter().any(|s| !s.is_finite()) {
            warn!("Voice: non-finite sample, group left neutral");
            return None;
        }

        let signal: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        let emphasized = pre_emphasis(&signal);

        let frame_size = (sr * FRAME_DURATION) as usize;
        let hop = (sr * HOP_DURATION) as usize;
        if frame_size == 0 {
            return None;
        }

        let bank = MelFilterBank::new(frame_size, sr, self.params);
        let mut yin = Yin::new(sr, frame_size);

        let mut mfcc_frames: Vec<Vec<f64>> = Vec::new();
        let mut centroids = Vec::new();
        let mut hnrs = Vec::new();

        for frame in frames(&emphasized, frame_size, hop) {
            let magnitudes = self.spectral.magnitude_spectrum(frame);
            mfcc_frames.push(bank.mfcc(&magnitudes));
            centroids.push(spectral_centroid(&magnitudes, sr, frame_size));
            hnrs.push(yin.estimate(frame).hnr_db());
        }

        if mfcc_frames.is_empty() {
            return None;
        }

        let mut features = VoiceFeatures::default();
        for k in 0..N_MFCC {
            let column: Vec<f64> = mfcc_frames
                .iter()
                .map(|c| c.get(k).copied().unwrap_or(0.0))
                .collect();
            let stats = SignalStats::compute(&column);
            features.mfcc_mean[k] = stats.mean;
            features.mfcc_std[k] = stats.std_dev;
        }
        features.spectral_centroid_mean = SignalStats::compute(&centroids).mean;
        features.hnr_mean = SignalStats::compute(&hnrs).mean;

        let finite = features
            .mfcc_mean
            .iter()
            .chain(&features.mfcc_std)
            .chain([&features.spectral_centroid_mean, &features.hnr_mean])
            .all(|v| v.is_finite());
        if !finite {
            warn!("Voice: features overflowed, group left neutral");
            return None;
        }

        debug!(
            "Voice: {} frames, centroid={:.1}Hz, hnr={:.2}dB",
            mfcc_frames.len(),
            features.spectral_centroid_mean,
            features.hnr_mean
        );

        Some(features)
    }
}

impl Default for VoiceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
