use clap::Parser;
use std::path::PathBuf;

use crate::audio::select::Preference;
use crate::audio::vad::{VadBackend, VadSensitivity};

#[derive(Parser, Debug)]
#[command(
    name = "bestchan",
    about = "Pick the cleaner speech channel (L/R) of a stereo recording and render it as dual mono"
)]
pub struct Cli {
    /// Input audio or video file with a stereo track
    pub input: PathBuf,

    /// Output dual-mono file [default: <input>.dualmono.mp3]
    #[arg(short, long, conflicts_with = "analyze_only")]
    pub output: Option<PathBuf>,

    // Flags below stay `None` unless given, so the config file can fill them.

    /// Force a channel or auto-pick [default: auto]
    #[arg(long, value_enum)]
    pub prefer: Option<Preference>,

    /// Analyze only the first N seconds, 0 = full file [default: 0]
    #[arg(long = "analyze-seconds")]
    pub analyze_seconds: Option<f64>,

    /// Output audio bitrate, passed through to the encoder [default: 192k]
    #[arg(short, long)]
    pub bitrate: Option<String>,

    /// FFmpeg audio codec for the output [default: libmp3lame]
    #[arg(long)]
    pub codec: Option<String>,

    /// Analysis frame length in milliseconds [default: 20]
    #[arg(long = "frame-ms")]
    pub frame_ms: Option<u32>,

    /// Voice activity detector strictness [default: moderate]
    #[arg(long, value_enum)]
    pub vad_sensitivity: Option<VadSensitivity>,

    /// Voice activity detector implementation [default: webrtc when built in]
    #[arg(long, value_enum)]
    pub vad_backend: Option<VadBackend>,

    /// Path to the ffmpeg binary [default: ffmpeg]
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Keep extracted analysis files in this directory
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Write the channel metrics and decision as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Only report the decision, do not render
    #[arg(long)]
    pub analyze_only: bool,

    /// Config file [default: ./bestchan.toml or ~/.config/bestchan/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,
}
