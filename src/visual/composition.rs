//! Framing and composition signals
//!
//! Scores how much of each frame's brightness sits in its center region.
//! The center is the middle half of each axis, computed with integer
//! division; frames too small to have one are scored on the whole frame.

use rayon::prelude::*;

use crate::features::{FeatureMap, FeatureValue};
use crate::stats;
use crate::visual::types::Frame;

/// Feature keys produced by the composition reducer.
pub const COMPOSITION_FEATURE_KEYS: [&str; 1] = ["center_focus_score"];

/// Reduce a frame sequence to composition features.
pub fn reduce(frames: &[Frame]) -> FeatureMap {
    let mut features = FeatureMap::new();
    if frames.is_empty() {
        features.insert("center_focus_score", FeatureValue::Fallback);
        return features;
    }

    let center_means: Vec<f64> = frames.par_iter().map(frame_center_mean).collect();
    features.insert(
        "center_focus_score",
        FeatureValue::from_option(stats::mean(&center_means)),
    );
    features
}

fn frame_center_mean(frame: &Frame) -> f64 {
    let width = frame.width();
    let height = frame.height();

    let mut region = frame.region(width / 4, height / 4, 3 * width / 4, 3 * height / 4);
    if region.is_empty() {
        region = frame.region(0, 0, width, height);
    }

    let values: Vec<f64> = region.iter().map(|&v| v as f64).collect();
    stats::mean(&values).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_gray_scores_its_exact_level() {
        let features = reduce(&[Frame::uniform(0, 128, 128, 127.0)]);
        assert_eq!(features.get("center_focus_score"), Some(127.0));
    }

    #[test]
    fn bright_center_scores_the_center_level() {
        let size = 32u32;
        let mut data = Vec::with_capacity((size * size) as usize);
        for y in 0..size {
            for x in 0..size {
                let in_center = (8..24).contains(&x) && (8..24).contains(&y);
                data.push(if in_center { 200.0 } else { 20.0 });
            }
        }
        let frame = Frame::from_intensities(0, size, size, data).unwrap();

        // The center crop of a 32px frame is exactly 8..24 on both axes.
        let features = reduce(&[frame]);
        assert_eq!(features.get("center_focus_score"), Some(200.0));
    }

    #[test]
    fn degenerate_frame_falls_back_to_whole_frame() {
        let features = reduce(&[Frame::uniform(0, 1, 1, 42.0)]);
        assert_eq!(features.get("center_focus_score"), Some(42.0));
    }

    #[test]
    fn empty_input_zeroes_the_key() {
        let features = reduce(&[]);
        assert_eq!(features.get("center_focus_score"), Some(0.0));
    }
}
