use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{Result, SourceError};
use crate::features::{FeatureMap, FeatureValue};
use crate::sources::FrameSource;
use crate::visual::Frame;

/// Frame source backed by a directory of numbered images
///
/// Expects one image per frame, named with a numeric suffix in the file
/// stem (`frame_0001.png`, `shot-12.jpg`). Order is the numeric value of
/// the suffix, not the lexical filename, so unpadded numbering still sorts
/// chronologically. Hidden files and files without a suffix are ignored;
/// an image that fails to decode is skipped with a warning and the
/// remaining frames close ranks, so indices stay contiguous.
pub struct DirectoryFrameSource {
    directory: PathBuf,
}

impl DirectoryFrameSource {
    /// Create a source reading from the given directory.
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Candidate files with their numeric suffixes, in playback order.
    fn ordered_entries(&self) -> Result<Vec<(u64, PathBuf)>> {
        if !self.directory.is_dir() {
            return Err(SourceError::NotFound(self.directory.clone()).into());
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry
                .map_err(|e| SourceError::UnreadableEntry {
                    path: self.directory.display().to_string(),
                    reason: e.to_string(),
                })?
                .path();

            if !path.is_file() || is_hidden(&path) || !is_supported_image(&path) {
                continue;
            }

            match sequence_suffix(&path) {
                Some(sequence) => entries.push((sequence, path)),
                None => warn!("Skipping frame without a numeric suffix: {:?}", path),
            }
        }

        entries.sort();
        Ok(entries)
    }
}

#[async_trait]
impl FrameSource for DirectoryFrameSource {
    async fn frames(&self) -> Result<Vec<Frame>> {
        let entries = self.ordered_entries()?;

        let mut frames = Vec::with_capacity(entries.len());
        for (sequence, path) in &entries {
            match image::open(path) {
                Ok(decoded) => {
                    let gray = decoded.to_luma8();
                    frames.push(Frame::from_luma(frames.len(), &gray));
                }
                Err(e) => {
                    warn!("Skipping undecodable frame {:?} (suffix {}): {}", path, sequence, e);
                }
            }
        }

        info!(
            "Loaded {} of {} frames from {:?}",
            frames.len(),
            entries.len(),
            self.directory
        );
        Ok(frames)
    }

    async fn metadata(&self) -> Result<FeatureMap> {
        let entries = self.ordered_entries()?;

        let mut metadata = FeatureMap::new();
        metadata.insert(
            "meta_frame_count",
            FeatureValue::computed(entries.len() as f64),
        );

        // Dimensions come from the first decodable frame only.
        if let Some((_, path)) = entries.first() {
            match image::open(path) {
                Ok(decoded) => {
                    let width = decoded.width() as f64;
                    let height = decoded.height() as f64;
                    metadata.insert("meta_width", FeatureValue::computed(width));
                    metadata.insert("meta_height", FeatureValue::computed(height));
                    metadata.insert("meta_aspect_ratio", FeatureValue::computed(width / height));
                }
                Err(e) => debug!("First frame unreadable, omitting dimensions: {}", e),
            }
        }

        Ok(metadata)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "png" | "jpg" | "jpeg"),
        None => false,
    }
}

/// Trailing digit run of the file stem, parsed as the sequence number.
fn sequence_suffix(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let digits = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    stem[stem.len() - digits..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use tempfile::tempdir;

    fn write_frame(dir: &Path, name: &str, level: u8) {
        GrayImage::from_pixel(6, 3, Luma([level]))
            .save(dir.join(name))
            .unwrap();
    }

    #[tokio::test]
    async fn frames_sort_by_numeric_suffix() {
        let dir = tempdir().unwrap();
        // Lexical order would put 10 before 9.
        write_frame(dir.path(), "frame_10.png", 30);
        write_frame(dir.path(), "frame_9.png", 20);
        write_frame(dir.path(), "frame_0001.png", 10);

        let frames = DirectoryFrameSource::new(dir.path()).frames().await.unwrap();
        assert_eq!(frames.len(), 3);
        let levels: Vec<f32> = frames.iter().map(|f| f.get(0, 0)).collect();
        assert_eq!(levels, vec![10.0, 20.0, 30.0]);
        let indices: Vec<usize> = frames.iter().map(|f| f.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn hidden_and_unnumbered_files_are_ignored() {
        let dir = tempdir().unwrap();
        write_frame(dir.path(), "frame_0001.png", 50);
        write_frame(dir.path(), ".preview_0002.png", 60);
        write_frame(dir.path(), "cover.png", 70);
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let frames = DirectoryFrameSource::new(dir.path()).frames().await.unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].get(0, 0), 50.0);
    }

    #[tokio::test]
    async fn undecodable_frame_is_skipped_and_indices_close_ranks() {
        let dir = tempdir().unwrap();
        write_frame(dir.path(), "frame_0001.png", 10);
        std::fs::write(dir.path().join("frame_0002.png"), b"not an image").unwrap();
        write_frame(dir.path(), "frame_0003.png", 30);

        let frames = DirectoryFrameSource::new(dir.path()).frames().await.unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].index(), 1);
        assert_eq!(frames[1].get(0, 0), 30.0);
    }

    #[tokio::test]
    async fn missing_directory_is_a_fatal_not_found() {
        let source = DirectoryFrameSource::new("does/not/exist");
        let err = source.frames().await.unwrap_err();
        assert!(!err.is_recoverable());
        assert!(matches!(
            err,
            crate::error::SignalError::Source(SourceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn metadata_reports_count_and_dimensions() {
        let dir = tempdir().unwrap();
        write_frame(dir.path(), "frame_0001.png", 10);
        write_frame(dir.path(), "frame_0002.png", 20);

        let metadata = DirectoryFrameSource::new(dir.path())
            .metadata()
            .await
            .unwrap();
        assert_eq!(metadata.get("meta_frame_count"), Some(2.0));
        assert_eq!(metadata.get("meta_width"), Some(6.0));
        assert_eq!(metadata.get("meta_height"), Some(3.0));
        assert_eq!(metadata.get("meta_aspect_ratio"), Some(2.0));
    }
}
