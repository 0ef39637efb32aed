//! Input source contracts and file-based implementations
//!
//! The reducers are pure functions over decoded input; everything that
//! touches the filesystem or an external recognizer sits behind one of the
//! four source traits here, so tests and other frontends can substitute
//! their own. The bundled implementations cover the layout the CLI works
//! with: a numbered image directory per clip, one audio file, and JSON
//! fixtures standing in for OCR and scene detection.

pub mod frames;
pub mod ocr;
pub mod scenes;
pub mod waveform;

pub use frames::DirectoryFrameSource;
pub use ocr::FixtureOcrSource;
pub use scenes::FixtureSceneSource;
pub use waveform::FileWaveformSource;

use async_trait::async_trait;

use crate::audio::Waveform;
use crate::error::Result;
use crate::features::FeatureMap;
use crate::text::FrameTokens;
use crate::visual::{Frame, SceneBoundary};

/// Supplies a clip's decoded frames.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Ordered, index-stamped frames for the clip.
    ///
    /// Order is chronological and indices are contiguous from zero; how
    /// order is established (filename suffixes, container timestamps) is
    /// the source's business. A clip that cannot be located at all is the
    /// distinct fatal not-found error.
    async fn frames(&self) -> Result<Vec<Frame>>;

    /// Clip metadata the source can observe, as `meta_`-prefixed features.
    ///
    /// Defaults to an empty map for sources with nothing to report.
    async fn metadata(&self) -> Result<FeatureMap> {
        Ok(FeatureMap::new())
    }
}

/// Supplies a clip's decoded audio.
#[async_trait]
pub trait WaveformSource: Send + Sync {
    /// The clip's waveform.
    ///
    /// A silent or truncated track may legitimately decode to an empty
    /// waveform; only a missing input is the distinct fatal not-found
    /// error.
    async fn waveform(&self) -> Result<Waveform>;
}

/// Recognizes on-screen text for a clip's frames.
#[async_trait]
pub trait OcrSource: Send + Sync {
    /// Token batches for the given frames, in frame order.
    ///
    /// A frame with no text still yields its (empty) batch. A frame whose
    /// recognition fails is skipped and produces no batch. An engine that
    /// cannot run at all fails the whole call with the distinct
    /// engine-unavailable error.
    async fn recognize(&self, frames: &[Frame]) -> Result<Vec<FrameTokens>>;
}

/// Supplies a clip's scene boundaries.
#[async_trait]
pub trait SceneSource: Send + Sync {
    /// Scene boundaries for the clip, ordered by start time.
    ///
    /// `threshold` is the detector sensitivity: boundaries scored below it
    /// are not reported.
    async fn scenes(&self, threshold: f64) -> Result<Vec<SceneBoundary>>;
}
