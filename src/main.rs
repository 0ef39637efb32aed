use std::{fs, path::PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info, Level};
use tracing_subscriber;

use clip_signals::{
    config::Config,
    features::FeatureMap,
    pipeline::{ClipSources, ExtractionPipeline},
    sources::{DirectoryFrameSource, FileWaveformSource, FixtureOcrSource, FixtureSceneSource},
};

#[derive(Parser)]
#[command(
    name = "clip-signals",
    version,
    about = "Reduce a short video clip into a flat numeric feature vector",
    long_about = "Clip-Signals reads a clip's sampled frames, audio track, and optional OCR and scene fixtures, reduces each modality to a fixed set of named floats, and writes the merged vector as a JSON report for downstream ranking models."
)]
struct Cli {
    /// Identifier for the clip, recorded in the report
    clip_id: String,

    /// Directory containing numbered frame images (PNG, JPEG)
    #[arg(short, long)]
    frames: PathBuf,

    /// Audio file path (WAV, MP3, FLAC, OGG)
    #[arg(short, long)]
    audio: PathBuf,

    /// JSON fixture with recognized text tokens per frame
    #[arg(long)]
    ocr: Option<PathBuf>,

    /// JSON fixture with detected scene boundaries
    #[arg(long)]
    scenes: Option<PathBuf>,

    /// Output path for the JSON feature report
    #[arg(short, long, default_value = "features.json")]
    output: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Envelope written to disk for one extracted clip.
#[derive(Serialize)]
struct FeatureReport {
    clip_id: String,
    extracted_at: DateTime<Utc>,
    features: FeatureMap,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Clip-Signals v{}", env!("CARGO_PKG_VERSION"));
    info!("Clip: {}", cli.clip_id);
    info!("Frames: {:?}", cli.frames);
    info!("Audio: {:?}", cli.audio);

    // Load configuration
    let config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    let frames = DirectoryFrameSource::new(&cli.frames);
    let waveform = FileWaveformSource::new(&cli.audio);
    let ocr = match &cli.ocr {
        Some(path) => FixtureOcrSource::new(path),
        None => FixtureOcrSource::empty(),
    };
    let scenes = match &cli.scenes {
        Some(path) => FixtureSceneSource::new(path),
        None => FixtureSceneSource::empty(),
    };

    // Create and run the extraction pipeline
    let pipeline = ExtractionPipeline::new(config);
    let sources = ClipSources {
        frames: &frames,
        waveform: &waveform,
        ocr: &ocr,
        scenes: &scenes,
    };

    let features = match pipeline.extract(&cli.clip_id, &sources).await {
        Ok(features) => features,
        Err(err) => {
            error!("{}", err.user_message());
            return Err(err.into());
        }
    };

    let report = FeatureReport {
        clip_id: cli.clip_id,
        extracted_at: Utc::now(),
        features,
    };
    let content = serde_json::to_string_pretty(&report)?;
    fs::write(&cli.output, content)?;

    info!("Feature report saved to {:?}", cli.output);
    Ok(())
}
