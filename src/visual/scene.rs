//! Scene and editing rhythm signals
//!
//! Reduces a scene-boundary list to cut frequency and pacing statistics.
//! The boundary list may arrive in any order; total duration is taken from
//! the boundary with the latest start time.

use crate::features::{FeatureMap, FeatureValue};
use crate::stats;
use crate::visual::types::SceneBoundary;

/// Feature keys produced by the scene reducer.
pub const SCENE_FEATURE_KEYS: [&str; 3] =
    ["cut_frequency", "avg_scene_duration", "pace_variance"];

/// Reduce a scene list to editing-rhythm features.
pub fn reduce(scenes: &[SceneBoundary]) -> FeatureMap {
    if scenes.is_empty() {
        return zero_features();
    }

    let durations: Vec<f64> = scenes.iter().map(SceneBoundary::duration).collect();

    let mut sorted = scenes.to_vec();
    sorted.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));

    // Total duration is the end of the latest-starting scene. A value of
    // zero or less falls back to 1.0; this historical quirk makes
    // cut_frequency read "cuts per unit" for such lists instead of
    // rejecting them.
    let mut total_duration = sorted
        .last()
        .map(|scene| scene.end_seconds)
        .unwrap_or_default();
    if total_duration <= 0.0 {
        total_duration = 1.0;
    }

    let mut features = FeatureMap::new();
    features.insert(
        "cut_frequency",
        FeatureValue::computed(scenes.len() as f64 / total_duration),
    );
    features.insert(
        "avg_scene_duration",
        FeatureValue::from_option(stats::mean(&durations)),
    );
    features.insert(
        "pace_variance",
        FeatureValue::from_option(stats::population_variance(&durations)),
    );
    features
}

fn zero_features() -> FeatureMap {
    let mut features = FeatureMap::new();
    for key in SCENE_FEATURE_KEYS {
        features.insert(key, FeatureValue::Fallback);
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundaries(pairs: &[(f64, f64)]) -> Vec<SceneBoundary> {
        pairs
            .iter()
            .map(|&(start, end)| SceneBoundary::new(start, end))
            .collect()
    }

    #[test]
    fn empty_scene_list_zeroes_every_key() {
        let features = reduce(&[]);
        for key in SCENE_FEATURE_KEYS {
            assert_eq!(features.get(key), Some(0.0), "key {}", key);
        }
    }

    #[test]
    fn three_scene_clip_matches_reference_values() {
        let features = reduce(&boundaries(&[(0.0, 2.0), (2.0, 5.0), (5.0, 9.0)]));

        let cut_frequency = features.get("cut_frequency").unwrap();
        assert!((cut_frequency - 3.0 / 9.0).abs() < 1e-12);

        assert_eq!(features.get("avg_scene_duration"), Some(3.0));

        let pace_variance = features.get("pace_variance").unwrap();
        assert!((pace_variance - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn unsorted_scene_list_finds_the_true_end() {
        let shuffled = boundaries(&[(5.0, 9.0), (0.0, 2.0), (2.0, 5.0)]);
        let features = reduce(&shuffled);
        let cut_frequency = features.get("cut_frequency").unwrap();
        assert!((cut_frequency - 3.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn zero_duration_quirk_uses_unit_total() {
        // Known quirk kept for compatibility: a list whose latest scene
        // ends at or before 0 divides by 1.0 instead of failing, so
        // cut_frequency silently equals the scene count.
        let features = reduce(&boundaries(&[(0.0, 0.0)]));
        assert_eq!(features.get("cut_frequency"), Some(1.0));
        assert_eq!(features.get("avg_scene_duration"), Some(0.0));
        assert_eq!(features.get("pace_variance"), Some(0.0));
    }

    #[test]
    fn single_scene_has_zero_variance() {
        let features = reduce(&boundaries(&[(0.0, 4.0)]));
        assert_eq!(features.get("pace_variance"), Some(0.0));
        assert_eq!(features.get("avg_scene_duration"), Some(4.0));
        assert_eq!(features.get("cut_frequency"), Some(0.25));
    }
}
