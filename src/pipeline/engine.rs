use tracing::{info, warn};

use crate::audio::{AudioAnalyzer, Waveform};
use crate::config::Config;
use crate::error::Result;
use crate::features::FeatureMap;
use crate::pipeline::FeatureAggregator;
use crate::sources::{FrameSource, OcrSource, SceneSource, WaveformSource};
use crate::text::TextAnalyzer;
use crate::visual::{Frame, VisualAnalyzer};

/// The four collaborators one extraction reads from.
pub struct ClipSources<'a> {
    pub frames: &'a dyn FrameSource,
    pub waveform: &'a dyn WaveformSource,
    pub ocr: &'a dyn OcrSource,
    pub scenes: &'a dyn SceneSource,
}

/// Orchestrates a clip's full feature extraction
///
/// The pipeline runs in clear steps:
/// 1. Audio Reduction - decode the waveform, reduce to audio features
/// 2. Frame Loading - gather the ordered frame sequence
/// 3. Text Reduction - recognize on-screen tokens, reduce to text features
/// 4. Visual Reduction - scenes, motion, quality, subject, composition
/// 5. Aggregation - merge all maps (plus optional metadata) into the vector
///
/// Recoverable source failures degrade to empty input, so their features
/// come out zeroed; fatal ones (missing input, no OCR engine) abort the
/// clip and propagate unchanged.
pub struct ExtractionPipeline {
    config: Config,
    audio: AudioAnalyzer,
    text: TextAnalyzer,
    visual: VisualAnalyzer,
}

impl ExtractionPipeline {
    /// Create a pipeline with the given configuration.
    pub fn new(config: Config) -> Self {
        let audio = AudioAnalyzer::with_config(config.audio.clone());
        let text = TextAnalyzer::with_config(config.text.clone());
        let visual = VisualAnalyzer::with_config(config.visual.clone());
        Self {
            config,
            audio,
            text,
            visual,
        }
    }

    /// Run the full extraction for one clip.
    pub async fn extract(&self, clip_id: &str, sources: &ClipSources<'_>) -> Result<FeatureMap> {
        self.config.validate()?;

        info!("🎞️  Starting feature extraction");
        info!("   Clip: {}", clip_id);

        let audio_features = self.reduce_audio(sources.waveform).await?;
        let frames = self.load_frames(sources.frames).await?;
        let text_features = self.reduce_text(sources.ocr, &frames).await?;
        let visual_features = self.reduce_visual(sources.scenes, &frames).await?;

        let vector = self
            .assemble(sources.frames, audio_features, text_features, visual_features)
            .await?;

        info!(
            "🎉 Extraction complete for '{}': {} features",
            clip_id,
            vector.len()
        );
        Ok(vector)
    }

    /// Pipeline step 1: the audio slice of the vector.
    async fn reduce_audio(&self, source: &dyn WaveformSource) -> Result<FeatureMap> {
        info!("🎵 Step 1: Reducing audio...");

        let waveform = recover_with(
            source.waveform().await,
            Waveform::from_mono(Vec::new(), 0),
            "Audio input",
        )?;
        let features = self.audio.reduce(&waveform)?;

        info!("   ✅ Audio reduced: {} features", features.len());
        Ok(features)
    }

    /// Pipeline step 2: the ordered frame sequence.
    async fn load_frames(&self, source: &dyn FrameSource) -> Result<Vec<Frame>> {
        info!("📹 Step 2: Loading frames...");

        let frames = recover_with(source.frames().await, Vec::new(), "Frame input")?;

        info!("   ✅ Frames ready: {}", frames.len());
        Ok(frames)
    }

    /// Pipeline step 3: the on-screen-text slice of the vector.
    async fn reduce_text(&self, source: &dyn OcrSource, frames: &[Frame]) -> Result<FeatureMap> {
        info!("📝 Step 3: Reducing on-screen text...");

        let batches = recover_with(
            source.recognize(frames).await,
            Vec::new(),
            "Token recognition",
        )?;
        let features = self.text.reduce(&batches)?;

        info!("   ✅ Text reduced from {} token batches", batches.len());
        Ok(features)
    }

    /// Pipeline step 4: the visual slice of the vector.
    async fn reduce_visual(
        &self,
        source: &dyn SceneSource,
        frames: &[Frame],
    ) -> Result<FeatureMap> {
        info!("🎨 Step 4: Reducing visuals...");

        let scenes = recover_with(
            source.scenes(self.config.visual.scene_threshold).await,
            Vec::new(),
            "Scene boundaries",
        )?;
        let features = self.visual.reduce(frames, &scenes)?;

        info!("   ✅ Visuals reduced over {} scenes", scenes.len());
        Ok(features)
    }

    /// Pipeline step 5: the final merged vector.
    async fn assemble(
        &self,
        source: &dyn FrameSource,
        audio: FeatureMap,
        text: FeatureMap,
        visual: FeatureMap,
    ) -> Result<FeatureMap> {
        info!("🧮 Step 5: Aggregating feature vector...");

        let metadata = if self.config.pipeline.include_metadata {
            Some(recover_with(
                source.metadata().await,
                FeatureMap::new(),
                "Clip metadata",
            )?)
        } else {
            None
        };
        let vector = FeatureAggregator::aggregate(audio, text, visual, metadata);

        info!("   ✅ Vector assembled: {} features", vector.len());
        Ok(vector)
    }
}

/// Absorb a recoverable failure into its documented default; let fatal
/// ones through.
fn recover_with<T>(result: Result<T>, fallback: T, what: &str) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_recoverable() => {
            warn!("{} degraded, continuing with empty input: {}", what, err);
            Ok(fallback)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;

    use crate::audio::AUDIO_FEATURE_KEYS;
    use crate::error::{AudioError, OcrError, SourceError};
    use crate::features::FeatureValue;
    use crate::text::{FrameTokens, OcrToken, TEXT_FEATURE_KEYS};
    use crate::visual::{SceneBoundary, VISUAL_FEATURE_KEYS};

    struct MemFrames(Vec<Frame>);

    #[async_trait]
    impl FrameSource for MemFrames {
        async fn frames(&self) -> Result<Vec<Frame>> {
            Ok(self.0.clone())
        }

        async fn metadata(&self) -> Result<FeatureMap> {
            let mut metadata = FeatureMap::new();
            metadata.insert(
                "meta_frame_count",
                FeatureValue::computed(self.0.len() as f64),
            );
            Ok(metadata)
        }
    }

    struct MemAudio(Waveform);

    #[async_trait]
    impl WaveformSource for MemAudio {
        async fn waveform(&self) -> Result<Waveform> {
            Ok(self.0.clone())
        }
    }

    struct BrokenAudio;

    #[async_trait]
    impl WaveformSource for BrokenAudio {
        async fn waveform(&self) -> Result<Waveform> {
            Err(AudioError::DecodeFailed {
                path: "clip.mp3".to_string(),
            }
            .into())
        }
    }

    struct MissingAudio;

    #[async_trait]
    impl WaveformSource for MissingAudio {
        async fn waveform(&self) -> Result<Waveform> {
            Err(SourceError::NotFound(PathBuf::from("clip.wav")).into())
        }
    }

    struct MemOcr(Vec<FrameTokens>);

    #[async_trait]
    impl OcrSource for MemOcr {
        async fn recognize(&self, _frames: &[Frame]) -> Result<Vec<FrameTokens>> {
            Ok(self.0.clone())
        }
    }

    struct NoEngine;

    #[async_trait]
    impl OcrSource for NoEngine {
        async fn recognize(&self, _frames: &[Frame]) -> Result<Vec<FrameTokens>> {
            Err(OcrError::EngineUnavailable {
                reason: "engine binary missing".to_string(),
            }
            .into())
        }
    }

    struct MemScenes(Vec<SceneBoundary>);

    #[async_trait]
    impl SceneSource for MemScenes {
        async fn scenes(&self, _threshold: f64) -> Result<Vec<SceneBoundary>> {
            Ok(self.0.clone())
        }
    }

    fn textured_frame(index: usize) -> Frame {
        let size = 64u32;
        let mut data = Vec::with_capacity((size * size) as usize);
        for y in 0..size {
            for x in 0..size {
                data.push(((x * 7 + y * 3) % 256) as f32);
            }
        }
        Frame::from_intensities(index, size, size, data).unwrap()
    }

    fn tone(seconds: f32) -> Waveform {
        let sample_rate = 22050u32;
        let samples: Vec<f32> = (0..(sample_rate as f32 * seconds) as usize)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
            })
            .collect();
        Waveform::from_mono(samples, sample_rate)
    }

    fn batch_with_text(frame_index: usize) -> FrameTokens {
        FrameTokens::with_tokens(
            frame_index,
            64,
            64,
            vec![OcrToken::new("WAIT FOR IT", 4, 4, 32, 8)],
        )
    }

    #[tokio::test]
    async fn extraction_produces_the_full_vector() {
        let pipeline = ExtractionPipeline::new(Config::default());
        let frames = MemFrames((0..3).map(textured_frame).collect());
        let audio = MemAudio(tone(1.0));
        let ocr = MemOcr(vec![batch_with_text(0)]);
        let scenes = MemScenes(vec![
            SceneBoundary::new(0.0, 2.0),
            SceneBoundary::new(2.0, 5.0),
            SceneBoundary::new(5.0, 9.0),
        ]);

        let vector = pipeline
            .extract(
                "clip-001",
                &ClipSources {
                    frames: &frames,
                    waveform: &audio,
                    ocr: &ocr,
                    scenes: &scenes,
                },
            )
            .await
            .unwrap();

        // Nine audio + five text + nine visual + one metadata feature.
        let expected =
            AUDIO_FEATURE_KEYS.len() + TEXT_FEATURE_KEYS.len() + VISUAL_FEATURE_KEYS.len() + 1;
        assert_eq!(vector.len(), expected);
        assert!(vector.all_finite());

        for key in AUDIO_FEATURE_KEYS
            .iter()
            .chain(TEXT_FEATURE_KEYS.iter())
            .chain(VISUAL_FEATURE_KEYS.iter())
        {
            assert!(vector.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(vector.get("meta_frame_count"), Some(3.0));

        let cut_frequency = vector.get("cut_frequency").unwrap();
        assert!((cut_frequency - 3.0 / 9.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn recoverable_audio_failure_zeroes_the_audio_slice() {
        let pipeline = ExtractionPipeline::new(Config::default());
        let frames = MemFrames(vec![textured_frame(0)]);
        let ocr = MemOcr(Vec::new());
        let scenes = MemScenes(Vec::new());

        let vector = pipeline
            .extract(
                "clip-002",
                &ClipSources {
                    frames: &frames,
                    waveform: &BrokenAudio,
                    ocr: &ocr,
                    scenes: &scenes,
                },
            )
            .await
            .unwrap();

        for key in AUDIO_FEATURE_KEYS {
            assert_eq!(vector.get(key), Some(0.0), "key {}", key);
        }
        // The other modalities are untouched by the audio failure.
        assert!(vector.get("brightness_mean").unwrap() > 0.0);
    }

    #[tokio::test]
    async fn missing_input_aborts_the_clip() {
        let pipeline = ExtractionPipeline::new(Config::default());
        let frames = MemFrames(Vec::new());
        let ocr = MemOcr(Vec::new());
        let scenes = MemScenes(Vec::new());

        let err = pipeline
            .extract(
                "clip-003",
                &ClipSources {
                    frames: &frames,
                    waveform: &MissingAudio,
                    ocr: &ocr,
                    scenes: &scenes,
                },
            )
            .await
            .unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn unavailable_ocr_engine_aborts_the_clip() {
        let pipeline = ExtractionPipeline::new(Config::default());
        let frames = MemFrames(vec![textured_frame(0)]);
        let audio = MemAudio(Waveform::from_mono(Vec::new(), 22050));
        let scenes = MemScenes(Vec::new());

        let err = pipeline
            .extract(
                "clip-004",
                &ClipSources {
                    frames: &frames,
                    waveform: &audio,
                    ocr: &NoEngine,
                    scenes: &scenes,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::SignalError::Ocr(OcrError::EngineUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn metadata_can_be_switched_off() {
        let mut config = Config::default();
        config.pipeline.include_metadata = false;
        let pipeline = ExtractionPipeline::new(config);

        let frames = MemFrames(vec![textured_frame(0)]);
        let audio = MemAudio(Waveform::from_mono(Vec::new(), 22050));
        let ocr = MemOcr(Vec::new());
        let scenes = MemScenes(Vec::new());

        let vector = pipeline
            .extract(
                "clip-005",
                &ClipSources {
                    frames: &frames,
                    waveform: &audio,
                    ocr: &ocr,
                    scenes: &scenes,
                },
            )
            .await
            .unwrap();
        assert_eq!(vector.get("meta_frame_count"), None);
    }
}
