use thiserror::Error;

/// Sample rate every analysis signal is expected to carry.
pub const ANALYSIS_SAMPLE_RATE: u32 = 16_000;

pub const DEFAULT_FRAME_MS: u32 = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame duration must be positive, got {0} ms")]
    NonPositiveDuration(u32),
    #[error("{ms} ms at {sample_rate} Hz yields an empty frame")]
    EmptyFrame { ms: u32, sample_rate: u32 },
}

/// Number of samples in one frame of `frame_ms` at `sample_rate`.
pub fn frame_len(sample_rate: u32, frame_ms: u32) -> Result<usize, FrameError> {
    if frame_ms == 0 {
        return Err(FrameError::NonPositiveDuration(frame_ms));
    }
    let len = (sample_rate as u64 * frame_ms as u64 / 1000) as usize;
    if len == 0 {
        return Err(FrameError::EmptyFrame {
            ms: frame_ms,
            sample_rate,
        });
    }
    Ok(len)
}

/// Fixed-length, non-overlapping view over a mono signal.
///
/// The trailing partial frame is dropped, never padded.
#[derive(Clone, Copy, Debug)]
pub struct Frames<'a> {
    signal: &'a [i16],
    len: usize,
}

impl<'a> Frames<'a> {
    pub fn new(signal: &'a [i16], sample_rate: u32, frame_ms: u32) -> Result<Self, FrameError> {
        let len = frame_len(sample_rate, frame_ms)?;
        Ok(Self { signal, len })
    }

    pub fn count(&self) -> usize {
        self.signal.len() / self.len
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Samples covered by whole frames.
    pub fn covered(&self) -> &'a [i16] {
        &self.signal[..self.count() * self.len]
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'a, i16> {
        self.signal.chunks_exact(self.len)
    }
}
