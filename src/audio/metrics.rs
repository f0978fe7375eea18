use serde::Serialize;

use super::frame::{FrameError, Frames};
use super::vad::{VadError, VoiceClassifier};

/// Floor for every RMS field when nothing was measured.
pub const RMS_FLOOR: f64 = 1e-9;
/// Added under the square root so all-zero frames stay finite.
pub const RMS_STABILIZER: f64 = 1e-12;
/// SNR reported for a channel with no usable frames.
pub const SNR_FLOOR_DB: f64 = -120.0;

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Vad(#[from] VadError),
}

/// Speech quality summary for one channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelMetrics {
    /// Fraction of frames classified as speech (0.0-1.0)
    pub speech_ratio: f64,
    /// 20·log10(speech_rms / noise_rms)
    pub snr_db: f64,
    /// Mean RMS of speech frames
    pub speech_rms: f64,
    /// Mean RMS of non-speech frames
    pub noise_rms: f64,
    /// RMS over all frame-aligned samples
    pub overall_rms: f64,
    pub frames: usize,
    pub speech_frames: usize,
}

impl ChannelMetrics {
    /// Metrics for a channel too short to hold a single frame.
    pub fn degenerate() -> Self {
        Self {
            speech_ratio: 0.0,
            snr_db: SNR_FLOOR_DB,
            speech_rms: RMS_FLOOR,
            noise_rms: RMS_FLOOR,
            overall_rms: RMS_FLOOR,
            frames: 0,
            speech_frames: 0,
        }
    }
}

pub fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return RMS_STABILIZER.sqrt();
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64 + RMS_STABILIZER).sqrt()
}

pub fn snr_db(speech_rms: f64, noise_rms: f64) -> f64 {
    20.0 * (speech_rms.max(RMS_FLOOR) / noise_rms.max(RMS_FLOOR)).log10()
}

fn mean_or_floor(values: &[f64]) -> f64 {
    if values.is_empty() {
        RMS_FLOOR
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Score one mono 16-bit signal.
///
/// Frames are classified in order; the first classifier failure aborts the
/// whole channel.
pub fn estimate<C>(
    signal: &[i16],
    sample_rate: u32,
    frame_ms: u32,
    classifier: &mut C,
) -> Result<ChannelMetrics, MetricsError>
where
    C: VoiceClassifier + ?Sized,
{
    let frames = Frames::new(signal, sample_rate, frame_ms)?;
    if frames.is_empty() {
        return Ok(ChannelMetrics::degenerate());
    }

    let mut speech = Vec::new();
    let mut noise = Vec::new();
    for (index, frame) in frames.iter().enumerate() {
        let energy = rms(frame);
        if classifier.classify(index, frame)? {
            speech.push(energy);
        } else {
            noise.push(energy);
        }
    }

    let total = frames.count();
    let speech_rms = mean_or_floor(&speech);
    let noise_rms = mean_or_floor(&noise);

    Ok(ChannelMetrics {
        speech_ratio: speech.len() as f64 / total as f64,
        snr_db: snr_db(speech_rms, noise_rms),
        speech_rms,
        noise_rms,
        overall_rms: rms(frames.covered()),
        frames: total,
        speech_frames: speech.len(),
    })
}
