//! Visual feature reduction
//!
//! Turns decoded frames and scene boundaries into the visual slice of the
//! feature vector. The work is split across five independent sub-reducers,
//! each owning a disjoint set of keys:
//!
//! - [`scene`]: cut frequency and pacing from scene boundaries
//! - [`motion`]: motion intensity from dense optical flow
//! - [`quality`]: brightness, contrast, and focus sharpness
//! - [`subject`]: fraction of frames with a detected face
//! - [`composition`]: brightness concentration in the frame center
//!
//! [`VisualAnalyzer`] merges their outputs; a sub-reducer that cannot work
//! with the given input contributes its fallback zeros without disturbing
//! the others.

pub mod analyzer;
pub mod composition;
pub mod motion;
pub mod quality;
pub mod scene;
pub mod subject;
pub mod types;

pub use analyzer::{VisualAnalyzer, VISUAL_FEATURE_KEYS};
pub use subject::FaceDetector;
#[cfg(feature = "face-detection")]
pub use subject::SeetaFaceDetector;
pub use types::{Frame, SceneBoundary};
