//! Voice activity classification.
//!
//! The metrics estimator only needs a yes/no answer per frame, so every
//! backend sits behind [`VoiceClassifier`]. Classifiers keep no state that
//! outlives one signal and are built fresh per channel.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "webrtc")]
use super::frame::ANALYSIS_SAMPLE_RATE;

#[derive(Debug, Error)]
pub enum VadError {
    #[error("{backend} VAD does not support {frame_ms} ms frames (expected 10, 20 or 30)")]
    UnsupportedFrame { backend: &'static str, frame_ms: u32 },
    #[error("{backend} VAD does not support {sample_rate} Hz audio")]
    UnsupportedSampleRate { backend: &'static str, sample_rate: u32 },
    #[error("VAD rejected frame {index} ({len} samples)")]
    Classification { index: usize, len: usize },
    #[error("VAD backend '{0}' is not compiled into this build")]
    Unavailable(&'static str),
}

/// Speech/non-speech decision for one frame.
pub trait VoiceClassifier {
    fn classify(&mut self, index: usize, frame: &[i16]) -> Result<bool, VadError>;
}

impl<C: VoiceClassifier + ?Sized> VoiceClassifier for Box<C> {
    fn classify(&mut self, index: usize, frame: &[i16]) -> Result<bool, VadError> {
        (**self).classify(index, frame)
    }
}

/// How strict the classifier is about calling a frame speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VadSensitivity {
    Quality,
    LowBitrate,
    #[default]
    Moderate,
    Aggressive,
}

impl VadSensitivity {
    /// WebRTC-style mode number, 0 (permissive) to 3 (strict).
    pub fn level(self) -> u8 {
        match self {
            VadSensitivity::Quality => 0,
            VadSensitivity::LowBitrate => 1,
            VadSensitivity::Moderate => 2,
            VadSensitivity::Aggressive => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VadBackend {
    Webrtc,
    Energy,
}

impl Default for VadBackend {
    fn default() -> Self {
        if cfg!(feature = "webrtc") {
            VadBackend::Webrtc
        } else {
            VadBackend::Energy
        }
    }
}

/// Everything needed to build a classifier for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadSettings {
    pub backend: VadBackend,
    pub sensitivity: VadSensitivity,
    pub frame_ms: u32,
}

impl VadSettings {
    pub fn build(&self) -> Result<Box<dyn VoiceClassifier>, VadError> {
        match self.backend {
            VadBackend::Energy => Ok(Box::new(EnergyClassifier::new(self.sensitivity))),
            VadBackend::Webrtc => build_webrtc(self),
        }
    }
}

#[cfg(feature = "webrtc")]
fn build_webrtc(settings: &VadSettings) -> Result<Box<dyn VoiceClassifier>, VadError> {
    Ok(Box::new(WebRtcClassifier::new(
        settings.sensitivity,
        ANALYSIS_SAMPLE_RATE,
        settings.frame_ms,
    )?))
}

#[cfg(not(feature = "webrtc"))]
fn build_webrtc(_settings: &VadSettings) -> Result<Box<dyn VoiceClassifier>, VadError> {
    Err(VadError::Unavailable("webrtc"))
}

/// Fixed RMS threshold per sensitivity, in raw 16-bit units.
const ENERGY_THRESHOLDS: [f64; 4] = [150.0, 300.0, 500.0, 800.0];

/// Energy-threshold heuristic. The threshold never adapts to the signal.
#[derive(Debug, Clone)]
pub struct EnergyClassifier {
    threshold: f64,
}

impl EnergyClassifier {
    pub fn new(sensitivity: VadSensitivity) -> Self {
        Self::with_threshold(ENERGY_THRESHOLDS[sensitivity.level() as usize])
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl VoiceClassifier for EnergyClassifier {
    fn classify(&mut self, _index: usize, frame: &[i16]) -> Result<bool, VadError> {
        if frame.is_empty() {
            return Ok(false);
        }
        let sum: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
        let rms = (sum / frame.len() as f64).sqrt();
        Ok(rms > self.threshold)
    }
}

#[cfg(feature = "webrtc")]
pub use webrtc::WebRtcClassifier;

#[cfg(feature = "webrtc")]
mod webrtc {
    use webrtc_vad::{SampleRate, Vad, VadMode};

    use super::{VadError, VadSensitivity, VoiceClassifier};

    /// WebRTC VAD over 10/20/30 ms frames.
    pub struct WebRtcClassifier {
        vad: Vad,
    }

    impl WebRtcClassifier {
        pub fn new(
            sensitivity: VadSensitivity,
            sample_rate: u32,
            frame_ms: u32,
        ) -> Result<Self, VadError> {
            if ![10, 20, 30].contains(&frame_ms) {
                return Err(VadError::UnsupportedFrame {
                    backend: "webrtc",
                    frame_ms,
                });
            }
            let rate = match sample_rate {
                8_000 => SampleRate::Rate8kHz,
                16_000 => SampleRate::Rate16kHz,
                32_000 => SampleRate::Rate32kHz,
                48_000 => SampleRate::Rate48kHz,
                other => {
                    return Err(VadError::UnsupportedSampleRate {
                        backend: "webrtc",
                        sample_rate: other,
                    })
                }
            };
            let mode = match sensitivity {
                VadSensitivity::Quality => VadMode::Quality,
                VadSensitivity::LowBitrate => VadMode::LowBitrate,
                VadSensitivity::Moderate => VadMode::Aggressive,
                VadSensitivity::Aggressive => VadMode::VeryAggressive,
            };
            Ok(Self {
                vad: Vad::new_with_rate_and_mode(rate, mode),
            })
        }
    }

    impl VoiceClassifier for WebRtcClassifier {
        fn classify(&mut self, index: usize, frame: &[i16]) -> Result<bool, VadError> {
            self.vad
                .is_voice_segment(frame)
                .map_err(|_| VadError::Classification {
                    index,
                    len: frame.len(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderate_is_default_sensitivity() {
        assert_eq!(VadSensitivity::default(), VadSensitivity::Moderate);
        assert_eq!(VadSensitivity::Moderate.level(), 2);
    }

    #[test]
    fn energy_threshold_rises_with_sensitivity() {
        // RMS of a constant frame equals its amplitude.
        let frame = vec![400i16; 320];
        let mut permissive = EnergyClassifier::new(VadSensitivity::Quality);
        let mut strict = EnergyClassifier::new(VadSensitivity::Aggressive);
        assert!(permissive.classify(0, &frame).unwrap());
        assert!(!strict.classify(0, &frame).unwrap());
    }

    #[test]
    fn custom_threshold_is_strictly_exceeded() {
        let mut vad = EnergyClassifier::with_threshold(1000.0);
        assert!(!vad.classify(0, &[999i16; 160]).unwrap());
        assert!(!vad.classify(1, &[1000i16; 160]).unwrap());
        assert!(vad.classify(2, &[1001i16; 160]).unwrap());
        assert!(vad.classify(3, &[-1001i16; 160]).unwrap());
    }

    #[test]
    fn energy_silence_is_never_speech() {
        let mut vad = EnergyClassifier::new(VadSensitivity::Quality);
        assert!(!vad.classify(0, &[0i16; 320]).unwrap());
        assert!(!vad.classify(1, &[]).unwrap());
    }

    #[test]
    fn settings_build_energy_backend() {
        let settings = VadSettings {
            backend: VadBackend::Energy,
            sensitivity: VadSensitivity::Moderate,
            frame_ms: 20,
        };
        let mut vad = settings.build().unwrap();
        assert!(vad.classify(0, &vec![2000i16; 320]).unwrap());
    }

    #[test]
    fn sensitivity_parses_snake_case() {
        let parsed: VadSensitivity = serde_json::from_str("\"low_bitrate\"").unwrap();
        assert_eq!(parsed, VadSensitivity::LowBitrate);
    }

    #[cfg(feature = "webrtc")]
    #[test]
    fn webrtc_rejects_odd_frame_duration() {
        let err = WebRtcClassifier::new(VadSensitivity::Moderate, ANALYSIS_SAMPLE_RATE, 25)
            .err()
            .unwrap();
        assert!(matches!(err, VadError::UnsupportedFrame { frame_ms: 25, .. }));
    }

    #[cfg(feature = "webrtc")]
    #[test]
    fn webrtc_classifies_silence_as_non_speech() {
        let mut vad =
            WebRtcClassifier::new(VadSensitivity::Moderate, ANALYSIS_SAMPLE_RATE, 20).unwrap();
        for i in 0..10 {
            assert!(!vad.classify(i, &[0i16; 320]).unwrap());
        }
    }
}
