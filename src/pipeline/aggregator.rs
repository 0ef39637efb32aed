use crate::features::FeatureMap;

/// Assembles the final feature vector
///
/// A pure merge of the three modality outputs plus optional clip metadata.
/// Nothing is renamed or transformed on the way through; the reducers own
/// their key sets and keep them disjoint.
pub struct FeatureAggregator;

impl FeatureAggregator {
    /// Merge the modality maps and optional metadata into one vector.
    pub fn aggregate(
        audio: FeatureMap,
        text: FeatureMap,
        visual: FeatureMap,
        metadata: Option<FeatureMap>,
    ) -> FeatureMap {
        let mut vector = FeatureMap::new();
        vector.merge(audio);
        vector.merge(text);
        vector.merge(visual);
        if let Some(metadata) = metadata {
            vector.merge(metadata);
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureValue;

    fn map_of(entries: &[(&str, f64)]) -> FeatureMap {
        let mut map = FeatureMap::new();
        for &(name, value) in entries {
            map.insert(name, FeatureValue::computed(value));
        }
        map
    }

    #[test]
    fn merge_is_a_pure_union() {
        let audio = map_of(&[("audio_energy", 0.4), ("tempo_bpm", 120.0)]);
        let text = map_of(&[("text_density", 12.0)]);
        let visual = map_of(&[("face_ratio", 0.5)]);

        let vector = FeatureAggregator::aggregate(audio, text, visual, None);
        assert_eq!(vector.len(), 4);
        assert_eq!(vector.get("audio_energy"), Some(0.4));
        assert_eq!(vector.get("tempo_bpm"), Some(120.0));
        assert_eq!(vector.get("text_density"), Some(12.0));
        assert_eq!(vector.get("face_ratio"), Some(0.5));
    }

    #[test]
    fn metadata_is_optional() {
        let metadata = map_of(&[("meta_frame_count", 30.0)]);
        let with = FeatureAggregator::aggregate(
            FeatureMap::new(),
            FeatureMap::new(),
            FeatureMap::new(),
            Some(metadata),
        );
        assert_eq!(with.get("meta_frame_count"), Some(30.0));

        let without = FeatureAggregator::aggregate(
            FeatureMap::new(),
            FeatureMap::new(),
            FeatureMap::new(),
            None,
        );
        assert!(without.is_empty());
    }
}
