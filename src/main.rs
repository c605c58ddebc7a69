//! Command-line entry point.
//!
//! `tracksync <audio1> <audio2> <video_duration_seconds> [mode]`
//!
//! Validates inputs, runs the search engine, and prints one
//! pretty-printed JSON result object after the progress output. All
//! fatal errors go to stderr and exit with status 1; no partial JSON is
//! ever emitted.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use tracksync::{
    load_track, logging, probe_duration, SpectralExtractor, SyncConfig, SyncEngine, SyncMode,
};

#[derive(Parser)]
#[command(
    name = "tracksync",
    version,
    about = "Locate the audio offset between two recordings of the same event"
)]
struct Cli {
    /// Reference audio or video file
    audio1: PathBuf,

    /// Comparison audio or video file
    audio2: PathBuf,

    /// Event timeline duration in seconds (typically the video duration)
    video_duration: String,

    /// Search mode
    #[arg(value_enum, default_value_t = Mode::Simple)]
    mode: Mode,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Single fine-step sweep anchored at the track start
    Simple,
    /// Coarse multi-position scan with checkpoint verification
    #[value(name = "multi_checkpoint")]
    MultiCheckpoint,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Simple => write!(f, "simple"),
            Mode::MultiCheckpoint => write!(f, "multi_checkpoint"),
        }
    }
}

impl From<Mode> for SyncMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Simple => SyncMode::Simple,
            Mode::MultiCheckpoint => SyncMode::MultiCheckpoint,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    for path in [&cli.audio1, &cli.audio2] {
        if !path.exists() {
            bail!("audio file not found: {}", path.display());
        }
    }

    let timeline_secs: f64 = cli
        .video_duration
        .parse()
        .with_context(|| format!("invalid video duration '{}'", cli.video_duration))?;
    if !(timeline_secs > 0.0) {
        bail!(
            "video duration must be a positive number, got '{}'",
            cli.video_duration
        );
    }

    let config = SyncConfig::default();

    let reference = load_track(&cli.audio1, config.sample_rate)
        .with_context(|| format!("decoding {}", cli.audio1.display()))?;
    let comparison = load_track(&cli.audio2, config.sample_rate)
        .with_context(|| format!("decoding {}", cli.audio2.display()))?;

    tracing::info!(
        "reference {:.2}s, comparison {:.2}s, timeline {:.2}s, mode {}",
        reference.duration_secs(),
        comparison.duration_secs(),
        timeline_secs,
        cli.mode
    );

    match probe_duration(&cli.audio1) {
        Ok(container_secs) if (container_secs - timeline_secs).abs() > 1.0 => {
            tracing::warn!(
                "given timeline {:.2}s differs from container duration {:.2}s",
                timeline_secs,
                container_secs
            );
        }
        Ok(_) => {}
        Err(err) => tracing::debug!("container duration unavailable: {}", err),
    }

    let extractor = SpectralExtractor::new();
    let engine = SyncEngine::new(&config, &extractor);
    let report = engine.synchronize(&reference, &comparison, timeline_secs, cli.mode.into())?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
