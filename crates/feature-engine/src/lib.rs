//! Feature Engineering Engine
//!
//! Turns raw biosignal captures (tap timestamps, accelerometer magnitude,
//! voice waveform) into the fixed 38-dimensional classifier input.
//!
//! Every analyzer degrades instead of failing: too little data yields `None`
//! for that group, and the assembler zero-fills any missing group.

mod features;
mod fft;
mod filter;
mod mfcc;
mod pitch;
mod statistics;
mod tapping;
mod tremor;
mod voice;

pub use features::{
    FeatureAssembler, FeatureSet, FeatureVector, FEATURE_DIMENSION, FEATURE_NAMES,
    TAPPING_DIMENSION, TREMOR_DIMENSION, VOICE_DIMENSION,
};
pub use fft::{band_power, PowerSpectrum, SpectralAnalyzer};
pub use filter::{bandpass, high_pass, low_pass};
pub use mfcc::{MelFilterBank, MfccParams};
pub use pitch::{PitchEstimate, Yin};
pub use statistics::SignalStats;
pub use tapping::{analyze_tapping, inter_tap_intervals, TappingFeatures, MIN_TAPS};
pub use tremor::{TremorAnalyzer, TremorBands, TremorFeatures};
pub use voice::{pre_emphasis, VoiceAnalyzer, VoiceFeatures, N_MFCC};
