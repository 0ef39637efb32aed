use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{OcrError, Result};
use crate::sources::OcrSource;
use crate::text::FrameTokens;
use crate::visual::Frame;

/// OCR source backed by a JSON fixture file
///
/// The fixture is an array of [`FrameTokens`] objects keyed by
/// `frame_index` (counting frames in clip order from zero). It stands in
/// for a native recognition engine: a fixture that cannot be read at all
/// is the engine-unavailable error, while a single malformed entry only
/// loses that one frame. Frames without an entry read as "no text".
pub struct FixtureOcrSource {
    path: Option<PathBuf>,
}

impl FixtureOcrSource {
    /// Create a source reading from the given fixture file.
    ///
    /// The file must exist by the time tokens are requested; a missing
    /// fixture is indistinguishable from a missing engine.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Create a source with no fixture at all.
    ///
    /// Every frame reads as "no text"; useful when a clip simply has no
    /// recognition data.
    pub fn empty() -> Self {
        Self { path: None }
    }

    fn load(&self) -> Result<LoadedFixture> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(LoadedFixture::default()),
        };

        let content =
            std::fs::read_to_string(path).map_err(|e| OcrError::EngineUnavailable {
                reason: format!("{}: {}", path.display(), e),
            })?;
        let entries: Vec<serde_json::Value> =
            serde_json::from_str(&content).map_err(|e| OcrError::EngineUnavailable {
                reason: format!("{}: {}", path.display(), e),
            })?;

        let mut fixture = LoadedFixture::default();
        for (position, entry) in entries.into_iter().enumerate() {
            // Pull the frame index out first so a malformed entry can
            // still be pinned to its frame and skipped.
            let frame_index = entry.get("frame_index").and_then(|v| v.as_u64());
            match serde_json::from_value::<FrameTokens>(entry) {
                Ok(batch) => {
                    fixture.batches.insert(batch.frame_index, batch);
                }
                Err(e) => match frame_index {
                    Some(index) => {
                        let failure = OcrError::FrameFailed {
                            frame_index: index as usize,
                            reason: e.to_string(),
                        };
                        warn!("Dropping frame from recognition: {}", failure);
                        fixture.failed.insert(index as usize);
                    }
                    None => {
                        warn!(
                            "Fixture entry {} has no frame_index and was ignored: {}",
                            position, e
                        );
                    }
                },
            }
        }
        Ok(fixture)
    }
}

#[derive(Default)]
struct LoadedFixture {
    batches: HashMap<usize, FrameTokens>,
    failed: HashSet<usize>,
}

#[async_trait]
impl OcrSource for FixtureOcrSource {
    async fn recognize(&self, frames: &[Frame]) -> Result<Vec<FrameTokens>> {
        let fixture = self.load()?;

        let mut batches = Vec::with_capacity(frames.len());
        for frame in frames {
            if fixture.failed.contains(&frame.index()) {
                continue;
            }
            match fixture.batches.get(&frame.index()) {
                Some(batch) => batches.push(batch.clone()),
                None => batches.push(FrameTokens::new(
                    frame.index(),
                    frame.width(),
                    frame.height(),
                )),
            }
        }
        Ok(batches)
    }
}
