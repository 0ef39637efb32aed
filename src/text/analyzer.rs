use crate::config::TextConfig;
use crate::error::Result;
use crate::features::{FeatureMap, FeatureValue};
use crate::text::types::FrameTokens;

/// Feature keys produced by the text reducer.
pub const TEXT_FEATURE_KEYS: [&str; 5] = [
    "text_presence_ratio",
    "text_density",
    "font_size_score",
    "context_clarity",
    "hook_text_ratio",
];

/// Reduces per-frame OCR tokens to the on-screen-text feature set
///
/// Works on the stride-sampled sub-sequence of frames. The denominators
/// differ by feature on purpose: presence and density are per sampled
/// frame, font size and clarity are per token, and the hook ratio divides
/// by the hook window clamped to the sample count.
pub struct TextAnalyzer {
    config: TextConfig,
}

impl TextAnalyzer {
    /// Create a new analyzer with default configuration
    pub fn new() -> Self {
        Self::with_config(TextConfig::default())
    }

    /// Create a new analyzer with custom configuration
    pub fn with_config(config: TextConfig) -> Self {
        Self { config }
    }

    /// Reduce an ordered token sequence to the five text features.
    pub fn reduce(&self, frames: &[FrameTokens]) -> Result<FeatureMap> {
        self.config.validate()?;

        if frames.is_empty() {
            tracing::info!("No frames for text reduction, returning zeroed features");
            return Ok(zero_features());
        }

        let sampled: Vec<&FrameTokens> = frames.iter().step_by(self.config.sample_stride).collect();
        let num_sampled = sampled.len();
        tracing::debug!(
            "Text reduction over {} sampled frames (stride {})",
            num_sampled,
            self.config.sample_stride
        );

        let mut frames_with_text = 0usize;
        let mut total_characters = 0usize;
        let mut total_relative_area = 0.0f64;
        let mut token_count = 0usize;
        let mut clear_tokens = 0usize;
        let mut hook_frames_with_text = 0usize;

        for (idx, frame) in sampled.iter().enumerate() {
            let frame_area = frame.frame_area();
            // A degenerate frame stays in the sample count but cannot
            // contribute: relative areas would divide by zero.
            if frame_area == 0.0 {
                continue;
            }

            let mut frame_has_text = false;
            for token in &frame.tokens {
                let text = token.text.trim();
                if text.is_empty() {
                    continue;
                }

                frame_has_text = true;
                total_characters += text.chars().filter(|&c| c != ' ').count();
                total_relative_area += token.box_area() / frame_area;
                token_count += 1;

                if text.chars().count() >= self.config.min_word_length {
                    clear_tokens += 1;
                }
            }

            if frame_has_text {
                frames_with_text += 1;
                if idx < self.config.hook_frame_limit {
                    hook_frames_with_text += 1;
                }
            }
        }

        let presence = FeatureValue::computed(frames_with_text as f64 / num_sampled as f64);
        let density = FeatureValue::computed(total_characters as f64 / num_sampled as f64);

        let font_size = if token_count > 0 {
            FeatureValue::computed(total_relative_area / token_count as f64)
        } else {
            FeatureValue::Fallback
        };

        let clarity = if token_count > 0 {
            FeatureValue::computed(clear_tokens as f64 / token_count as f64)
        } else {
            FeatureValue::Fallback
        };

        let hook_divisor = num_sampled.min(self.config.hook_frame_limit);
        let hook = if hook_divisor > 0 {
            FeatureValue::computed(hook_frames_with_text as f64 / hook_divisor as f64)
        } else {
            FeatureValue::Fallback
        };

        let mut features = FeatureMap::new();
        features.insert("text_presence_ratio", presence);
        features.insert("text_density", density);
        features.insert("font_size_score", font_size);
        features.insert("context_clarity", clarity);
        features.insert("hook_text_ratio", hook);

        tracing::info!(
            "Text reduction complete: presence {:.2}, {} tokens",
            features.get("text_presence_ratio").unwrap_or(0.0),
            token_count
        );

        Ok(features)
    }
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// The all-zero text map used when no frames are available.
fn zero_features() -> FeatureMap {
    let mut features = FeatureMap::new();
    for key in TEXT_FEATURE_KEYS {
        features.insert(key, FeatureValue::Fallback);
    }
    features
}
