//! Frame quality statistics
//!
//! Per-frame brightness, contrast, and focus sharpness, averaged over the
//! clip. Sharpness is the variance of the Laplacian response; blurry frames
//! have little high-frequency content and score low.

use rayon::prelude::*;

use crate::features::{FeatureMap, FeatureValue};
use crate::stats;
use crate::visual::types::Frame;

/// Feature keys produced by the quality reducer.
pub const QUALITY_FEATURE_KEYS: [&str; 3] = ["brightness_mean", "contrast_mean", "blur_score"];

/// Reduce a frame sequence to quality features.
pub fn reduce(frames: &[Frame]) -> FeatureMap {
    let mut features = FeatureMap::new();
    if frames.is_empty() {
        for key in QUALITY_FEATURE_KEYS {
            features.insert(key, FeatureValue::Fallback);
        }
        return features;
    }

    let per_frame: Vec<FrameQuality> = frames.par_iter().map(frame_quality).collect();
    let brightness: Vec<f64> = per_frame.iter().map(|q| q.brightness).collect();
    let contrast: Vec<f64> = per_frame.iter().map(|q| q.contrast).collect();
    let sharpness: Vec<f64> = per_frame.iter().map(|q| q.sharpness).collect();

    features.insert(
        "brightness_mean",
        FeatureValue::from_option(stats::mean(&brightness)),
    );
    features.insert(
        "contrast_mean",
        FeatureValue::from_option(stats::mean(&contrast)),
    );
    features.insert(
        "blur_score",
        FeatureValue::from_option(stats::mean(&sharpness)),
    );
    features
}

struct FrameQuality {
    brightness: f64,
    contrast: f64,
    sharpness: f64,
}

fn frame_quality(frame: &Frame) -> FrameQuality {
    let values: Vec<f64> = frame.intensities().iter().map(|&v| v as f64).collect();
    FrameQuality {
        brightness: stats::mean(&values).unwrap_or_default(),
        contrast: stats::population_std(&values).unwrap_or_default(),
        sharpness: stats::population_variance(&laplacian(frame)).unwrap_or_default(),
    }
}

/// 4-connected Laplacian response with replicated borders.
fn laplacian(frame: &Frame) -> Vec<f64> {
    let width = frame.width();
    let height = frame.height();
    let mut out = Vec::with_capacity((width as usize) * (height as usize));
    for y in 0..height {
        for x in 0..width {
            let up = frame.get(x, y.saturating_sub(1));
            let down = frame.get(x, (y + 1).min(height - 1));
            let left = frame.get(x.saturating_sub(1), y);
            let right = frame.get((x + 1).min(width - 1), y);
            let center = frame.get(x, y);
            out.push((up + down + left + right - 4.0 * center) as f64);
        }
    }
    out
}
