//! Feature Vector Assembly

use crate::tapping::TappingFeatures;
use crate::tremor::TremorFeatures;
use crate::voice::{VoiceFeatures, N_MFCC};
use serde::{Deserialize, Serialize, Serializer};
use std::ops::Range;
use tracing::{debug, warn};

/// Number of tapping features
pub const TAPPING_DIMENSION: usize = 5;
/// Number of tremor features
pub const TREMOR_DIMENSION: usize = 5;
/// Number of voice features (13 means, 13 stds, centroid, HNR)
pub const VOICE_DIMENSION: usize = 2 * N_MFCC + 2;
/// Number of features in the vector
pub const FEATURE_DIMENSION: usize = TAPPING_DIMENSION + TREMOR_DIMENSION + VOICE_DIMENSION;

/// Canonical feature names in vector order
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = [
    "iti_mean",
    "iti_std",
    "iti_cv",
    "num_taps",
    "iti_slope",
    "tremor_peak_freq",
    "tremor_peak_power",
    "power_3_7",
    "power_7_12",
    "tremor_rms",
    "mfcc_mean_0",
    "mfcc_mean_1",
    "mfcc_mean_2",
    "mfcc_mean_3",
    "mfcc_mean_4",
    "mfcc_mean_5",
    "mfcc_mean_6",
    "mfcc_mean_7",
    "mfcc_mean_8",
    "mfcc_mean_9",
    "mfcc_mean_10",
    "mfcc_mean_11",
    "mfcc_mean_12",
    "mfcc_std_0",
    "mfcc_std_1",
    "mfcc_std_2",
    "mfcc_std_3",
    "mfcc_std_4",
    "mfcc_std_5",
    "mfcc_std_6",
    "mfcc_std_7",
    "mfcc_std_8",
    "mfcc_std_9",
    "mfcc_std_10",
    "mfcc_std_11",
    "mfcc_std_12",
    "spectral_centroid_mean",
    "hnr_mean",
];

/// Fixed-size classifier input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f32; FEATURE_DIMENSION],
}

impl FeatureVector {
    /// Raw feature values
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Feature values as an owned array
    pub fn to_array(&self) -> [f32; FEATURE_DIMENSION] {
        self.values
    }

    /// Look up a feature by its canonical name
    pub fn get(&self, name: &str) -> Option<f32> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.values[i])
    }

    /// Name/value pairs in vector order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.values.iter())
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            values: [0.0; FEATURE_DIMENSION],
        }
    }
}

/// Feature groups collected in one screening run; `None` means skipped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Finger-tapping group
    pub tapping: Option<TappingFeatures>,
    /// Accelerometer tremor group
    pub tremor: Option<TremorFeatures>,
    /// Sustained voice group
    pub voice: Option<VoiceFeatures>,
}

impl FeatureSet {
    /// Assemble into the classifier input
    pub fn assemble(&self) -> FeatureVector {
        FeatureAssembler::assemble(
            self.tapping.as_ref(),
            self.tremor.as_ref(),
            self.voice.as_ref(),
        )
    }
}

/// Builds the fixed-order feature vector from optional groups
pub struct FeatureAssembler;

impl FeatureAssembler {
    /// Concatenate tapping, tremor and voice groups, zero-filling absent ones
    /// and any group holding a non-finite value.
    pub fn assemble(
        tapping: Option<&TappingFeatures>,
        tremor: Option<&TremorFeatures>,
        voice: Option<&VoiceFeatures>,
    ) -> FeatureVector {
        let tapping = tapping.copied().unwrap_or_default();
        let tremor = tremor.copied().unwrap_or_default();
        let voice = voice.copied().unwrap_or_default();

        let mut values = [0.0f32; FEATURE_DIMENSION];
        let source = tapping
            .to_array()
            .into_iter()
            .chain(tremor.to_array())
            .chain(voice.mfcc_mean)
            .chain(voice.mfcc_std)
            .chain([voice.spectral_centroid_mean, voice.hnr_mean]);

        for (slot, value) in values.iter_mut().zip(source) {
            *slot = value as f32;
        }

        // A group that does not fit in f32 falls back to its neutral encoding
        let groups: [(&str, Range<usize>); 3] = [
            ("tapping", 0..TAPPING_DIMENSION),
            ("tremor", TAPPING_DIMENSION..TAPPING_DIMENSION + TREMOR_DIMENSION),
            ("voice", TAPPING_DIMENSION + TREMOR_DIMENSION..FEATURE_DIMENSION),
        ];
        for (name, range) in groups {
            let group = &mut values[range];
            if group.iter().any(|v| !v.is_finite()) {
                warn!("Non-finite {} features, using neutral values", name);
                group.fill(0.0);
            }
        }

        debug!("Built feature vector of size {}", values.len());
        FeatureVector { values }
    }
}
