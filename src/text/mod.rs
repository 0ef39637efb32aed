//! # On-Screen Text Feature Reduction
//!
//! Reduces per-frame OCR token lists to text-prominence features: how
//! often text appears, how much of it, how large it runs relative to the
//! frame, and whether it shows up in the opening hook.
//!
//! Token detection itself is a collaborator concern (see
//! [`crate::sources::OcrSource`]); this module only consumes token lists.

pub mod analyzer;
pub mod types;

pub use analyzer::{TextAnalyzer, TEXT_FEATURE_KEYS};
pub use types::{FrameTokens, OcrToken};
