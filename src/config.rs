use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::frame::DEFAULT_FRAME_MS;
use crate::audio::select::Preference;
use crate::audio::vad::{VadBackend, VadSensitivity};
use crate::cli::Cli;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub vad: VadConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub prefer: Preference,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct VadConfig {
    #[serde(default)]
    pub sensitivity: VadSensitivity,
    #[serde(default)]
    pub backend: VadBackend,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
    #[serde(default = "default_codec")]
    pub codec: String,
}

#[derive(Debug, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            prefer: Preference::default(),
            duration_seconds: 0.0,
            frame_ms: default_frame_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            bitrate: default_bitrate(),
            codec: default_codec(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
        }
    }
}

fn default_frame_ms() -> u32 { DEFAULT_FRAME_MS }
fn default_bitrate() -> String { "192k".into() }
fn default_codec() -> String { "libmp3lame".into() }
fn default_ffmpeg() -> PathBuf { PathBuf::from("ffmpeg") }

impl Config {
    /// Flags given on the command line win over file values.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(prefer) = cli.prefer { self.analysis.prefer = prefer; }
        if let Some(seconds) = cli.analyze_seconds { self.analysis.duration_seconds = seconds; }
        if let Some(ms) = cli.frame_ms { self.analysis.frame_ms = ms; }
        if let Some(sensitivity) = cli.vad_sensitivity { self.vad.sensitivity = sensitivity; }
        if let Some(backend) = cli.vad_backend { self.vad.backend = backend; }
        if let Some(ref bitrate) = cli.bitrate { self.output.bitrate = bitrate.clone(); }
        if let Some(ref codec) = cli.codec { self.output.codec = codec.clone(); }
        if let Some(ref ffmpeg) = cli.ffmpeg { self.tools.ffmpeg = ffmpeg.clone(); }
        self
    }
}

/// `./bestchan.toml`, then the per-user config locations.
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("bestchan.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("bestchan").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("bestchan").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.analysis.prefer, Preference::Auto);
        assert_eq!(cfg.analysis.duration_seconds, 0.0);
        assert_eq!(cfg.analysis.frame_ms, 20);
        assert_eq!(cfg.vad.sensitivity, VadSensitivity::Moderate);
        assert_eq!(cfg.output.bitrate, "192k");
        assert_eq!(cfg.output.codec, "libmp3lame");
        assert_eq!(cfg.tools.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn parses_all_sections() {
        let cfg: Config = toml::from_str(
            r#"
            [analysis]
            prefer = "left"
            duration_seconds = 60.0
            frame_ms = 30

            [vad]
            sensitivity = "aggressive"
            backend = "energy"

            [output]
            bitrate = "128k"

            [tools]
            ffmpeg = "/opt/ffmpeg/bin/ffmpeg"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.prefer, Preference::Left);
        assert_eq!(cfg.analysis.duration_seconds, 60.0);
        assert_eq!(cfg.analysis.frame_ms, 30);
        assert_eq!(cfg.vad.sensitivity, VadSensitivity::Aggressive);
        assert_eq!(cfg.vad.backend, VadBackend::Energy);
        assert_eq!(cfg.output.bitrate, "128k");
        assert_eq!(cfg.output.codec, "libmp3lame");
        assert_eq!(cfg.tools.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
    }

    #[test]
    fn rejects_unknown_sensitivity() {
        assert!(toml::from_str::<Config>("[vad]\nsensitivity = \"extreme\"").is_err());
    }

    fn file_config() -> Config {
        toml::from_str(
            r#"
            [analysis]
            prefer = "left"
            frame_ms = 30

            [output]
            bitrate = "128k"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn explicit_flags_beat_config_even_at_default_values() {
        use clap::Parser;

        let cli = Cli::try_parse_from([
            "bestchan", "in.m4a", "--prefer", "auto", "--bitrate", "192k", "--frame-ms", "20",
        ])
        .unwrap();
        let cfg = file_config().with_overrides(&cli);
        assert_eq!(cfg.analysis.prefer, Preference::Auto);
        assert_eq!(cfg.output.bitrate, "192k");
        assert_eq!(cfg.analysis.frame_ms, 20);
    }

    #[test]
    fn unset_flags_fall_back_to_config() {
        use clap::Parser;

        let cli = Cli::try_parse_from(["bestchan", "in.m4a", "--codec", "aac"]).unwrap();
        let cfg = file_config().with_overrides(&cli);
        assert_eq!(cfg.analysis.prefer, Preference::Left);
        assert_eq!(cfg.analysis.frame_ms, 30);
        assert_eq!(cfg.output.bitrate, "128k");
        assert_eq!(cfg.output.codec, "aac");

        let bare = Config::default().with_overrides(&cli);
        assert_eq!(bare.analysis.prefer, Preference::Auto);
        assert_eq!(bare.output.bitrate, "192k");
        assert_eq!(bare.tools.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bestchan.toml");
        std::fs::write(&path, "[output]\ncodec = \"aac\"\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.output.codec, "aac");
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
