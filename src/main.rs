mod audio;
mod cli;
mod config;
mod encode;
mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use audio::vad::VadSettings;
use cli::Cli;
use encode::ffmpeg::{Encoding, Ffmpeg};
use pipeline::Options;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect bestchan.toml / user config
    let mut cfg = config::Config::default();
    let config_path = cli.config.clone().or_else(config::find_config);
    if let Some(ref path) = config_path {
        match config::load_config(path) {
            Ok(loaded) => {
                log::info!("Loaded config from {}", path.display());
                cfg = loaded;
            }
            Err(err) if cli.config.is_some() => {
                return Err(err.context(format!("Failed to load config from {}", path.display())));
            }
            Err(err) => log::warn!("Failed to load config from {}: {:#}", path.display(), err),
        }
    }
    let cfg = cfg.with_overrides(&cli);

    let input = cli
        .input
        .canonicalize()
        .with_context(|| format!("Input file not found: {}", cli.input.display()))?;

    let output = if cli.analyze_only {
        None
    } else {
        Some(cli.output.clone().unwrap_or_else(|| pipeline::default_output_path(&input)))
    };

    log::info!("bestchan - speech channel picker");
    log::info!("Input: {}", input.display());
    if let Some(ref out) = output {
        log::info!("Output: {}", out.display());
    }
    log::info!(
        "Prefer: {:?}, VAD: {:?}/{:?}, frame: {}ms, analyze: {}",
        cfg.analysis.prefer,
        cfg.vad.backend,
        cfg.vad.sensitivity,
        cfg.analysis.frame_ms,
        if cfg.analysis.duration_seconds > 0.0 {
            format!("first {}s", cfg.analysis.duration_seconds)
        } else {
            "full file".to_string()
        }
    );

    let opts = Options {
        preference: cfg.analysis.prefer,
        analysis_seconds: cfg.analysis.duration_seconds,
        vad: VadSettings {
            backend: cfg.vad.backend,
            sensitivity: cfg.vad.sensitivity,
            frame_ms: cfg.analysis.frame_ms,
        },
        encoding: Encoding {
            codec: cfg.output.codec,
            bitrate: cfg.output.bitrate,
        },
        output,
        work_dir: cli.work_dir.clone(),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} [{elapsed_precise}] {msg}")
            .context("Invalid progress template")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let tool = Ffmpeg::new(cfg.tools.ffmpeg);
    let result = pipeline::run(&tool, &input, &opts, &pb);
    pb.finish_and_clear();
    let report = result?;

    println!("{}", report);

    if let Some(ref path) = cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        log::info!("Report written: {}", path.display());
    }

    log::info!("Done!");
    Ok(())
}
