//! # Clip-Signals
//!
//! Reduce short-form video clips into flat numeric feature vectors for content ranking.
//!
//! This library turns the raw ingredients of a clip - decoded audio, sampled frames,
//! recognized on-screen text, and scene boundaries - into a single map of named,
//! finite floats. Every reducer publishes a fixed key set, so downstream rankers see
//! the same vector shape for every clip: when an input is missing or degenerate the
//! affected keys read `0.0` instead of disappearing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clip_signals::{
//!     config::Config,
//!     pipeline::{ClipSources, ExtractionPipeline},
//!     sources::{DirectoryFrameSource, FileWaveformSource, FixtureOcrSource, FixtureSceneSource},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let pipeline = ExtractionPipeline::new(Config::default());
//!
//! let frames = DirectoryFrameSource::new("clip_frames/");
//! let waveform = FileWaveformSource::new("clip_audio.wav");
//! let ocr = FixtureOcrSource::empty();
//! let scenes = FixtureSceneSource::empty();
//!
//! let features = pipeline
//!     .extract(
//!         "clip-0001",
//!         &ClipSources {
//!             frames: &frames,
//!             waveform: &waveform,
//!             ocr: &ocr,
//!             scenes: &scenes,
//!         },
//!     )
//!     .await?;
//!
//! println!("extracted {} features", features.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`audio`] - Waveform decoding and spectral feature reduction
//! - [`text`] - OCR token batches reduced to on-screen text signals
//! - [`visual`] - Scene, motion, quality, subject, and composition reducers
//! - [`sources`] - Input traits plus the bundled file-backed implementations
//! - [`pipeline`] - The extraction engine and feature aggregation
//! - [`config`] - Configuration management
//!
//! ## Supplying Your Own Inputs
//!
//! The pipeline reads everything through the traits in [`sources`], so any capture
//! or decode stack can feed it by implementing the matching trait:
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use clip_signals::{error::Result, sources::FrameSource, visual::Frame};
//!
//! struct SyntheticClip;
//!
//! #[async_trait]
//! impl FrameSource for SyntheticClip {
//!     async fn frames(&self) -> Result<Vec<Frame>> {
//!         Ok((0..8usize).map(|i| Frame::uniform(i, 64, 64, 128.0)).collect())
//!     }
//! }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod sources;
pub mod stats;
pub mod text;
pub mod visual;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, SignalError},
    features::{FeatureMap, FeatureValue},
    pipeline::{ClipSources, ExtractionPipeline},
};
