//! Capture Loading
//!
//! Captures arrive as frozen sample sequences. JSON files carry any test
//! kind; voice can also come from a WAV file.

use crate::ScreeningError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use storage::TestKind;
use tracing::{debug, info};

/// One completed capture handed over by the acquisition side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Capture {
    /// Absolute tap times (ms)
    Tapping { timestamps_ms: Vec<f64> },
    /// Accelerometer trace, either magnitudes or raw x/y/z samples
    Tremor {
        #[serde(default)]
        magnitudes: Vec<f64>,
        #[serde(default)]
        axes: Vec<[f64; 3]>,
        #[serde(default)]
        sample_rate_hz: Option<f64>,
    },
    /// Normalized waveform in [-1, 1]
    Voice {
        samples: Vec<f32>,
        #[serde(default)]
        sample_rate_hz: Option<u32>,
    },
}

impl Capture {
    /// Result kind this capture is scored as on its own
    pub fn test_kind(&self) -> TestKind {
        match self {
            Capture::Tapping { .. } => TestKind::Tapping,
            Capture::Tremor { .. } => TestKind::Tremor,
            Capture::Voice { .. } => TestKind::Voice,
        }
    }
}

/// Acceleration magnitude per tick; raw axes are used when no magnitudes
/// were recorded.
pub fn magnitude_trace(magnitudes: &[f64], axes: &[[f64; 3]]) -> Vec<f64> {
    if !magnitudes.is_empty() {
        return magnitudes.to_vec();
    }
    axes.iter()
        .map(|[x, y, z]| (x * x + y * y + z * z).sqrt())
        .collect()
}

/// Load a capture from a `.wav` file (voice) or a JSON file (any kind)
pub fn load_capture(path: &Path) -> Result<Capture, ScreeningError> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("wav"));

    if is_wav {
        load_wav(path)
    } else {
        load_json(path)
    }
}

fn load_json(path: &Path) -> Result<Capture, ScreeningError> {
    let text = fs::read_to_string(path)
        .map_err(|e| ScreeningError::Capture(format!("{}: {}", path.display(), e)))?;
    let capture: Capture = serde_json::from_str(&text)
        .map_err(|e| ScreeningError::Capture(format!("{}: {}", path.display(), e)))?;
    debug!("Loaded {} capture from {}", capture.test_kind(), path.display());
    Ok(capture)
}

/// Read a WAV file, downmixed to mono and scaled to [-1, 1]
fn load_wav(path: &Path) -> Result<Capture, ScreeningError> {
    let wav_error = |e: hound::Error| ScreeningError::Capture(format!("{}: {}", path.display(), e));

    let mut reader = hound::WavReader::open(path).map_err(wav_error)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(wav_error)?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(wav_error)?
        }
    };

    let samples: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    info!(
        "Loaded voice capture {}: {} samples at {} Hz ({} channel(s))",
        path.display(),
        samples.len(),
        spec.sample_rate,
        channels
    );

    Ok(Capture::Voice {
        samples,
        sample_rate_hz: Some(spec.sample_rate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tapping_json() {
        let capture: Capture =
            serde_json::from_str(r#"{"kind":"tapping","timestamps_ms":[0,500,1000]}"#).unwrap();
        assert_eq!(
            capture,
            Capture::Tapping {
                timestamps_ms: vec![0.0, 500.0, 1000.0]
            }
        );
        assert_eq!(capture.test_kind(), TestKind::Tapping);
    }

    #[test]
    fn test_parse_tremor_axes() {
        let capture: Capture = serde_json::from_str(
            r#"{"kind":"tremor","axes":[[3,4,0],[0,0,9.81]],"sample_rate_hz":50}"#,
        )
        .unwrap();
        match capture {
            Capture::Tremor {
                magnitudes,
                axes,
                sample_rate_hz,
            } => {
                assert!(magnitudes.is_empty());
                assert_eq!(sample_rate_hz, Some(50.0));
                assert_eq!(magnitude_trace(&magnitudes, &axes), vec![5.0, 9.81]);
            }
            other => panic!("unexpected capture {:?}", other),
        }
    }

    #[test]
    fn test_magnitudes_take_precedence() {
        assert_eq!(magnitude_trace(&[1.0, 2.0], &[[3.0, 4.0, 0.0]]), vec![1.0, 2.0]);
        assert!(magnitude_trace(&[], &[]).is_empty());
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.json");
        fs::write(&path, r#"{"kind":"voice","samples":[0.0,0.5,-0.5]}"#).unwrap();

        let capture = load_capture(&path).unwrap();
        assert_eq!(
            capture,
            Capture::Voice {
                samples: vec![0.0, 0.5, -0.5],
                sample_rate_hz: None
            }
        );
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"kind\":\"balance\"}").unwrap();
        assert!(matches!(load_capture(&path), Err(ScreeningError::Capture(_))));
        assert!(load_capture(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_load_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        match load_capture(&path).unwrap() {
            Capture::Voice {
                samples,
                sample_rate_hz,
            } => {
                assert_eq!(sample_rate_hz, Some(16000));
                assert_eq!(samples.len(), 100);
                assert!(samples.iter().all(|&s| (s - 0.25).abs() < 1e-6));
            }
            other => panic!("unexpected capture {:?}", other),
        }
    }
}
