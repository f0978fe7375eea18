use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use serde::Serialize;
use tempfile::TempDir;

use crate::audio::decode::read_pcm16_mono;
use crate::audio::frame::{frame_len, ANALYSIS_SAMPLE_RATE};
use crate::audio::metrics::{estimate, ChannelMetrics};
use crate::audio::select::{select, ChannelSelection, Preference, Side};
use crate::audio::vad::VadSettings;
use crate::encode::ffmpeg::{Encoding, MediaTool};

pub struct Options {
    pub preference: Preference,
    /// Analyze only the first N seconds; 0 analyzes the whole file.
    pub analysis_seconds: f64,
    pub vad: VadSettings,
    pub encoding: Encoding,
    /// Where to write the dual-mono render. `None` stops after selection.
    pub output: Option<PathBuf>,
    /// Keep analysis artifacts here instead of a throwaway temp dir.
    pub work_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub source: PathBuf,
    pub analysis_seconds: Option<f64>,
    pub left: ChannelMetrics,
    pub right: ChannelMetrics,
    pub selection: ChannelSelection,
    pub output: Option<PathBuf>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Channel metrics:")?;
        for (label, m) in [("left ", &self.left), ("right", &self.right)] {
            writeln!(
                f,
                "  {}: speech_ratio={:.2} snr={:.1}dB rms_s={:.5} rms_n={:.5} rms={:.5}",
                label, m.speech_ratio, m.snr_db, m.speech_rms, m.noise_rms, m.overall_rms
            )?;
        }
        write!(
            f,
            "Chosen channel: {} ({})",
            self.selection.side, self.selection.reason
        )?;
        if let Some(ref out) = self.output {
            write!(f, "\nDual-mono written: {}", out.display())?;
        }
        Ok(())
    }
}

/// Per-run home for preview and extracted channel files.
enum Scratch {
    Temp(TempDir),
    Kept(PathBuf),
}

impl Scratch {
    fn new(work_dir: Option<&Path>) -> Result<Self> {
        match work_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create work dir: {}", dir.display()))?;
                Ok(Scratch::Kept(dir.to_path_buf()))
            }
            None => {
                let dir = tempfile::Builder::new()
                    .prefix("bestchan-")
                    .tempdir()
                    .context("Failed to create temporary analysis directory")?;
                Ok(Scratch::Temp(dir))
            }
        }
    }

    fn path(&self) -> &Path {
        match self {
            Scratch::Temp(dir) => dir.path(),
            Scratch::Kept(dir) => dir,
        }
    }

    /// Drop temporary artifacts. A failed removal is logged, not fatal.
    fn release(self) {
        match self {
            Scratch::Temp(dir) => {
                let path = dir.path().to_path_buf();
                if let Err(err) = dir.close() {
                    log::warn!("Failed to remove {}: {}", path.display(), err);
                }
            }
            Scratch::Kept(dir) => log::info!("Analysis artifacts kept in {}", dir.display()),
        }
    }
}

/// Default render path: `<dir>/<stem>.dualmono.mp3`.
pub fn default_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    source.with_file_name(format!("{}.dualmono.mp3", stem))
}

/// Analyze both channels of `source`, pick one, and render it as dual mono.
pub fn run(tool: &dyn MediaTool, source: &Path, opts: &Options, progress: &ProgressBar) -> Result<Report> {
    tool.ensure_available()?;

    if !source.is_file() {
        anyhow::bail!("Input file not found: {}", source.display());
    }
    if !(opts.analysis_seconds >= 0.0 && opts.analysis_seconds.is_finite()) {
        anyhow::bail!(
            "Analysis duration must be a non-negative number of seconds, got {}",
            opts.analysis_seconds
        );
    }
    frame_len(ANALYSIS_SAMPLE_RATE, opts.vad.frame_ms).context("Invalid frame duration")?;
    opts.vad.build().context("Invalid VAD configuration")?;

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".into());

    let scratch = Scratch::new(opts.work_dir.as_deref())?;

    let analyzed = if opts.analysis_seconds > 0.0 {
        progress.set_message(format!("Trimming first {}s for analysis", opts.analysis_seconds));
        let dest = scratch.path().join(format!("{}.sample.wav", stem));
        tool.trim_preview(source, opts.analysis_seconds, &dest)?
    } else {
        source.to_path_buf()
    };

    progress.set_message("Extracting channels");
    let left_wav = tool.extract_mono(
        &analyzed,
        Side::Left,
        &scratch.path().join(format!("{}.left.wav", stem)),
    )?;
    let right_wav = tool.extract_mono(
        &analyzed,
        Side::Right,
        &scratch.path().join(format!("{}.right.wav", stem)),
    )?;

    progress.set_message("Scoring channels");
    let (left, right) = rayon::join(
        || analyze_channel(&left_wav, Side::Left, &opts.vad),
        || analyze_channel(&right_wav, Side::Right, &opts.vad),
    );
    let (left, right) = (left?, right?);

    let selection = select(&left, &right, opts.preference);
    log::info!("Chosen channel: {} ({})", selection.side, selection.reason);

    scratch.release();

    let output = match opts.output {
        Some(ref out) => {
            progress.set_message(format!("Rendering {} channel as dual mono", selection.side));
            let written = tool.synthesize_dual_mono(source, selection.side, &opts.encoding, out)?;
            log::info!("Dual-mono written: {}", written.display());
            Some(written)
        }
        None => None,
    };

    Ok(Report {
        source: source.to_path_buf(),
        analysis_seconds: (opts.analysis_seconds > 0.0).then_some(opts.analysis_seconds),
        left,
        right,
        selection,
        output,
    })
}

fn analyze_channel(path: &Path, side: Side, settings: &VadSettings) -> Result<ChannelMetrics> {
    let pcm = read_pcm16_mono(path, ANALYSIS_SAMPLE_RATE)
        .with_context(|| format!("Failed to read {} channel", side))?;
    let mut classifier = settings.build()?;
    let metrics = estimate(&pcm.samples, pcm.sample_rate, settings.frame_ms, &mut *classifier)
        .with_context(|| format!("Failed to analyze {} channel", side))?;

    if metrics.frames == 0 {
        log::warn!("{} channel is shorter than one frame; no usable signal", side);
    }
    log::info!(
        "{:<5}: speech_ratio={:.2} snr={:.1}dB rms_s={:.5} rms_n={:.5} frames={}",
        side,
        metrics.speech_ratio,
        metrics.snr_db,
        metrics.speech_rms,
        metrics.noise_rms,
        metrics.frames
    );
    Ok(metrics)
}
