use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: SymphoniaError,
    },
    #[error("no audio track in {}", .0.display())]
    NoTrack(PathBuf),
    #[error("{}: unknown sample rate", .0.display())]
    UnknownSampleRate(PathBuf),
    #[error("{}: sample rate {found} Hz, expected {expected} Hz", .path.display())]
    UnexpectedSampleRate {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

/// A decoded mono 16-bit signal.
pub struct Pcm16 {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl Pcm16 {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Read the first channel of an audio file as 16-bit samples.
///
/// Fails unless the file's sample rate is exactly `expected_rate`.
pub fn read_pcm16_mono(path: &Path, expected_rate: u32) -> Result<Pcm16, DecodeError> {
    let format_err = |source: SymphoniaError| DecodeError::Format {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(format_err)?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoTrack(path.to_path_buf()))?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count()).max(1);
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::UnknownSampleRate(path.to_path_buf()))?;

    if sample_rate != expected_rate {
        return Err(DecodeError::UnexpectedSampleRate {
            path: path.to_path_buf(),
            found: sample_rate,
            expected: expected_rate,
        });
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(format_err)?;

    let mut samples: Vec<i16> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(format_err(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("{}: skipping undecodable packet: {}", path.display(), msg);
                continue;
            }
            Err(e) => return Err(format_err(e)),
        };

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<i16>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        // Keep the first channel only
        samples.extend(sample_buf.samples().iter().step_by(channels));
    }

    let pcm = Pcm16 {
        samples,
        sample_rate,
    };

    log::debug!(
        "Decoded {}: {} samples, {}Hz, {:.1}s",
        path.display(),
        pcm.samples.len(),
        pcm.sample_rate,
        pcm.duration_secs()
    );

    Ok(pcm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn reads_mono_samples_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let samples: Vec<i16> = (0..4000).map(|i| (i % 200) as i16 * 100 - 10_000).collect();
        write_wav(&path, 16_000, 1, &samples);

        let pcm = read_pcm16_mono(&path, 16_000).unwrap();
        assert_eq!(pcm.sample_rate, 16_000);
        assert_eq!(pcm.samples, samples);
        assert!((pcm.duration_secs() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn keeps_first_channel_of_interleaved_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let interleaved: Vec<i16> = (0..1000).flat_map(|i| [i as i16, -1]).collect();
        write_wav(&path, 16_000, 2, &interleaved);

        let pcm = read_pcm16_mono(&path, 16_000).unwrap();
        assert_eq!(pcm.samples.len(), 1000);
        assert_eq!(pcm.samples[10], 10);
        assert!(pcm.samples.iter().all(|&s| s >= 0));
    }

    #[test]
    fn rejects_other_sample_rates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cd.wav");
        write_wav(&path, 44_100, 1, &[0i16; 441]);

        let err = read_pcm16_mono(&path, 16_000).err().unwrap();
        assert!(matches!(
            err,
            DecodeError::UnexpectedSampleRate {
                found: 44_100,
                expected: 16_000,
                ..
            }
        ));
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_pcm16_mono(&dir.path().join("nope.wav"), 16_000).err().unwrap();
        assert!(matches!(err, DecodeError::Open { .. }));
    }
}
