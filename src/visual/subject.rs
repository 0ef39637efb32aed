//! Subject presence signals
//!
//! Counts the fraction of frames with at least one detected face. Detection
//! itself lives behind the [`FaceDetector`] trait; the bundled SeetaFace
//! implementation is compiled in with the `face-detection` feature and
//! loaded from a model file. Without a usable detector the ratio falls back
//! to zero rather than failing the clip.

use tracing::debug;

use crate::features::{FeatureMap, FeatureValue};
use crate::visual::types::Frame;

/// Feature keys produced by the subject reducer.
pub const SUBJECT_FEATURE_KEYS: [&str; 1] = ["face_ratio"];

/// Finds faces in a decoded frame.
pub trait FaceDetector {
    /// Number of faces found in the frame.
    fn detect(&self, frame: &Frame) -> usize;
}

/// Reduce a frame sequence to subject features.
pub fn reduce(frames: &[Frame], detector: Option<&dyn FaceDetector>) -> FeatureMap {
    let mut features = FeatureMap::new();

    let ratio = match detector {
        Some(detector) if !frames.is_empty() => {
            let with_faces = frames
                .iter()
                .filter(|frame| detector.detect(frame) > 0)
                .count();
            debug!("Faces detected in {} of {} frames", with_faces, frames.len());
            FeatureValue::computed(with_faces as f64 / frames.len() as f64)
        }
        Some(_) => FeatureValue::Fallback,
        None => {
            debug!("No face detector loaded; face_ratio falls back to zero");
            FeatureValue::Fallback
        }
    };

    features.insert("face_ratio", ratio);
    features
}

#[cfg(feature = "face-detection")]
pub use seeta::SeetaFaceDetector;

#[cfg(feature = "face-detection")]
mod seeta {
    use std::path::Path;
    use std::sync::Mutex;

    use tracing::warn;

    use super::FaceDetector;
    use crate::error::{Result, VisualError};
    use crate::visual::types::Frame;

    /// Frontal face detector backed by a SeetaFace model file.
    ///
    /// The underlying detector mutates internal buffers during detection,
    /// so it sits behind a mutex and frames are scanned one at a time.
    pub struct SeetaFaceDetector {
        inner: Mutex<Box<dyn rustface::Detector>>,
    }

    impl SeetaFaceDetector {
        /// Load a detection model from disk.
        pub fn from_model<P: AsRef<Path>>(path: P) -> Result<Self> {
            let path = path.as_ref().to_str().ok_or_else(|| {
                VisualError::DetectorUnavailable {
                    reason: "model path is not valid UTF-8".to_string(),
                }
            })?;
            let mut detector = rustface::create_detector(path).map_err(|e| {
                VisualError::DetectorUnavailable {
                    reason: e.to_string(),
                }
            })?;

            detector.set_min_face_size(20);
            detector.set_score_thresh(2.0);
            detector.set_pyramid_scale_factor(0.8);
            detector.set_slide_window_step(4, 4);

            Ok(Self {
                inner: Mutex::new(detector),
            })
        }
    }

    impl FaceDetector for SeetaFaceDetector {
        fn detect(&self, frame: &Frame) -> usize {
            let luma: Vec<u8> = frame
                .intensities()
                .iter()
                .map(|&v| v.clamp(0.0, 255.0) as u8)
                .collect();
            let mut image = rustface::ImageData::new(&luma, frame.width(), frame.height());

            match self.inner.lock() {
                Ok(mut detector) => detector.detect(&mut image).len(),
                Err(_) => {
                    warn!("Face detector lock poisoned, treating frame as faceless");
                    0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports a face on even-indexed frames only.
    struct EveryOther;

    impl FaceDetector for EveryOther {
        fn detect(&self, frame: &Frame) -> usize {
            usize::from(frame.index() % 2 == 0)
        }
    }

    struct Always;

    impl FaceDetector for Always {
        fn detect(&self, _frame: &Frame) -> usize {
            1
        }
    }

    fn gray_frames(count: usize) -> Vec<Frame> {
        (0..count).map(|i| Frame::uniform(i, 8, 8, 128.0)).collect()
    }

    #[test]
    fn ratio_counts_frames_with_faces() {
        let features = reduce(&gray_frames(4), Some(&EveryOther));
        assert_eq!(features.get("face_ratio"), Some(0.5));
    }

    #[test]
    fn ratio_stays_in_unit_range() {
        let features = reduce(&gray_frames(3), Some(&Always));
        assert_eq!(features.get("face_ratio"), Some(1.0));
    }

    #[test]
    fn missing_detector_falls_back_to_zero() {
        let features = reduce(&gray_frames(3), None);
        assert_eq!(features.get("face_ratio"), Some(0.0));
    }

    #[test]
    fn empty_input_falls_back_to_zero() {
        let features = reduce(&[], Some(&Always));
        assert_eq!(features.get("face_ratio"), Some(0.0));
    }
}
