use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;

use crate::audio::frame::ANALYSIS_SAMPLE_RATE;
use crate::audio::select::Side;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{program} is not available. Please install ffmpeg and retry")]
    Missing {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to run {program} for {step}")]
    Spawn {
        program: String,
        step: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{step} failed with {status}:\n{stderr}")]
    Failed {
        step: &'static str,
        status: ExitStatus,
        stderr: String,
    },
}

/// Output codec settings for the dual-mono render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    pub codec: String,
    pub bitrate: String,
}

impl Default for Encoding {
    fn default() -> Self {
        Self {
            codec: "libmp3lame".into(),
            bitrate: "192k".into(),
        }
    }
}

/// The media operations the pipeline delegates to an external tool.
pub trait MediaTool {
    fn ensure_available(&self) -> Result<(), ToolError>;

    /// Bounded-duration 16 kHz stereo copy of `source`, used for analysis only.
    fn trim_preview(&self, source: &Path, seconds: f64, dest: &Path) -> Result<PathBuf, ToolError>;

    /// One side of `source` as 16 kHz mono 16-bit PCM.
    fn extract_mono(&self, source: &Path, side: Side, dest: &Path) -> Result<PathBuf, ToolError>;

    /// `side` of `source` duplicated onto both output channels.
    fn synthesize_dual_mono(
        &self,
        source: &Path,
        side: Side,
        encoding: &Encoding,
        dest: &Path,
    ) -> Result<PathBuf, ToolError>;
}

pub fn mono_pan(side: Side) -> &'static str {
    match side {
        Side::Left => "pan=mono|c0=c0",
        Side::Right => "pan=mono|c0=c1",
    }
}

pub fn dual_mono_pan(side: Side) -> &'static str {
    match side {
        Side::Left => "pan=stereo|c0=c0|c1=c0",
        Side::Right => "pan=stereo|c0=c1|c1=c1",
    }
}

fn args<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    items.into_iter().map(Into::into).collect()
}

pub fn preview_args(source: &Path, seconds: f64, dest: &Path) -> Vec<OsString> {
    let mut a = args(["-hide_banner", "-y", "-t"]);
    a.push(seconds.to_string().into());
    a.push("-i".into());
    a.push(source.into());
    a.extend(args(["-ac", "2", "-ar"]));
    a.push(ANALYSIS_SAMPLE_RATE.to_string().into());
    a.extend(args(["-c:a", "pcm_s16le"]));
    a.push(dest.into());
    a
}

pub fn extract_args(source: &Path, side: Side, dest: &Path) -> Vec<OsString> {
    let mut a = args(["-hide_banner", "-y", "-i"]);
    a.push(source.into());
    a.extend(args(["-af", mono_pan(side), "-ac", "1", "-ar"]));
    a.push(ANALYSIS_SAMPLE_RATE.to_string().into());
    a.extend(args(["-c:a", "pcm_s16le"]));
    a.push(dest.into());
    a
}

pub fn dual_mono_args(source: &Path, side: Side, encoding: &Encoding, dest: &Path) -> Vec<OsString> {
    let mut a = args(["-hide_banner", "-y", "-i"]);
    a.push(source.into());
    a.extend(args(["-af", dual_mono_pan(side), "-c:a"]));
    a.push(encoding.codec.as_str().into());
    a.push("-b:a".into());
    a.push(encoding.bitrate.as_str().into());
    a.push(dest.into());
    a
}

/// Runs the `ffmpeg` binary as a blocking subprocess per operation.
pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, step: &'static str, args: &[OsString]) -> Result<(), ToolError> {
        log::debug!(
            "{} {}",
            self.program.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ToolError::Spawn {
                program: self.program.display().to_string(),
                step,
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                step,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl MediaTool for Ffmpeg {
    fn ensure_available(&self) -> Result<(), ToolError> {
        let status = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| ToolError::Missing {
                program: self.program.display().to_string(),
                source,
            })?;
        if !status.success() {
            return Err(ToolError::Failed {
                step: "version check",
                status,
                stderr: String::new(),
            });
        }
        Ok(())
    }

    fn trim_preview(&self, source: &Path, seconds: f64, dest: &Path) -> Result<PathBuf, ToolError> {
        self.run("preview trim", &preview_args(source, seconds, dest))?;
        Ok(dest.to_path_buf())
    }

    fn extract_mono(&self, source: &Path, side: Side, dest: &Path) -> Result<PathBuf, ToolError> {
        let step = match side {
            Side::Left => "left channel extraction",
            Side::Right => "right channel extraction",
        };
        self.run(step, &extract_args(source, side, dest))?;
        Ok(dest.to_path_buf())
    }

    fn synthesize_dual_mono(
        &self,
        source: &Path,
        side: Side,
        encoding: &Encoding,
        dest: &Path,
    ) -> Result<PathBuf, ToolError> {
        self.run("dual-mono synthesis", &dual_mono_args(source, side, encoding, dest))?;
        log::info!("FFmpeg dual-mono render complete");
        Ok(dest.to_path_buf())
    }
}
