use rayon::ThreadPoolBuilder;
use tracing::{info, warn};

use crate::config::VisualConfig;
use crate::error::{Result, VisualError};
use crate::features::FeatureMap;
use crate::visual::subject::{self, FaceDetector};
use crate::visual::types::{Frame, SceneBoundary};
use crate::visual::{composition, motion, quality, scene};

/// Feature keys produced by the visual reducer, across all sub-reducers.
pub const VISUAL_FEATURE_KEYS: [&str; 9] = [
    "cut_frequency",
    "avg_scene_duration",
    "pace_variance",
    "motion_intensity",
    "brightness_mean",
    "contrast_mean",
    "blur_score",
    "face_ratio",
    "center_focus_score",
];

/// Reduces frames and scene boundaries to the visual feature set
///
/// The five sub-reducers are independent: each owns a disjoint slice of the
/// key set and falls back to zeros on its own, so a clip with no usable
/// frames still reports every key. Per-frame statistics run on a thread
/// pool sized by `processing_threads`.
pub struct VisualAnalyzer {
    config: VisualConfig,
    detector: Option<Box<dyn FaceDetector>>,
}

impl VisualAnalyzer {
    /// Create a new analyzer with default configuration
    pub fn new() -> Self {
        Self::with_config(VisualConfig::default())
    }

    /// Create a new analyzer with custom configuration.
    ///
    /// When the configuration names a face model, the detector is loaded
    /// here; a model that fails to load downgrades `face_ratio` to its
    /// fallback instead of failing construction.
    pub fn with_config(config: VisualConfig) -> Self {
        let detector = load_detector(&config);
        Self { config, detector }
    }

    /// Replace the face detector with a caller-supplied implementation.
    pub fn with_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Reduce a clip's frames and scene list to the nine visual features.
    pub fn reduce(&self, frames: &[Frame], scenes: &[SceneBoundary]) -> Result<FeatureMap> {
        self.config.validate()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.processing_threads)
            .build()
            .map_err(|e| VisualError::InvalidParameters {
                details: e.to_string(),
            })?;

        let mut features = scene::reduce(scenes);

        let config = &self.config;
        let (motion, quality, composition) = pool.install(|| {
            (
                motion::reduce(frames, config),
                quality::reduce(frames),
                composition::reduce(frames),
            )
        });
        features.merge(motion);
        features.merge(quality);
        features.merge(composition);

        // Subject detection mutates detector state and runs outside the
        // pool, one frame at a time.
        features.merge(subject::reduce(frames, self.detector.as_deref()));

        info!(
            "Visual reduction complete: {} frames, {} scenes, {} features",
            frames.len(),
            scenes.len(),
            features.len()
        );
        Ok(features)
    }
}

impl Default for VisualAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "face-detection")]
fn load_detector(config: &VisualConfig) -> Option<Box<dyn FaceDetector>> {
    let path = config.face_model_path.as_deref()?;
    match subject::SeetaFaceDetector::from_model(path) {
        Ok(detector) => Some(Box::new(detector)),
        Err(e) => {
            warn!(
                "Face detector unavailable ({}); face_ratio will fall back to zero",
                e
            );
            None
        }
    }
}

#[cfg(not(feature = "face-detection"))]
fn load_detector(config: &VisualConfig) -> Option<Box<dyn FaceDetector>> {
    if config.face_model_path.is_some() {
        warn!("Face model configured but the face-detection feature is compiled out");
    }
    None
}
