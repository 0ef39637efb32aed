use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for clip-signals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Audio reduction settings
    pub audio: AudioConfig,

    /// On-screen text reduction settings
    pub text: TextConfig,

    /// Visual reduction settings
    pub visual: VisualConfig,

    /// Pipeline orchestration settings
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            text: TextConfig::default(),
            visual: VisualConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|_| ConfigError::ParseFailed {
            path: path.display().to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.audio.validate()?;
        self.text.validate()?;
        self.visual.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }
}

/// Audio reduction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Window size for RMS and FFT analysis (samples)
    pub window_size: usize,

    /// Hop size between analysis windows (samples)
    pub hop_size: usize,

    /// Leading span treated as the audio hook (seconds)
    pub hook_seconds: f64,

    /// Number of mel bands in the MFCC filterbank
    pub mel_bands: usize,

    /// Number of cepstral coefficients to keep
    pub mfcc_coefficients: usize,

    /// Minimum plausible tempo (BPM)
    pub min_bpm: f64,

    /// Maximum plausible tempo (BPM)
    pub max_bpm: f64,

    /// Onset picking sensitivity (0.0-1.0)
    pub onset_sensitivity: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            hop_size: 512,
            hook_seconds: 3.0,
            mel_bands: 40,
            mfcc_coefficients: 13,
            min_bpm: 60.0,
            max_bpm: 200.0,
            onset_sensitivity: 0.7,
        }
    }
}

impl AudioConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 || !self.window_size.is_power_of_two() {
            return Err(ConfigError::InvalidValue {
                key: "audio.window_size".to_string(),
                value: self.window_size.to_string(),
            }
            .into());
        }

        if self.hop_size == 0 || self.hop_size > self.window_size {
            return Err(ConfigError::InvalidValue {
                key: "audio.hop_size".to_string(),
                value: self.hop_size.to_string(),
            }
            .into());
        }

        if self.hook_seconds <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "audio.hook_seconds".to_string(),
                value: self.hook_seconds.to_string(),
            }
            .into());
        }

        if self.mfcc_coefficients == 0 || self.mfcc_coefficients > self.mel_bands {
            return Err(ConfigError::InvalidValue {
                key: "audio.mfcc_coefficients".to_string(),
                value: self.mfcc_coefficients.to_string(),
            }
            .into());
        }

        if self.min_bpm >= self.max_bpm {
            return Err(ConfigError::InvalidValue {
                key: "audio.bpm_range".to_string(),
                value: format!("{}-{}", self.min_bpm, self.max_bpm),
            }
            .into());
        }

        if !(0.0..=1.0).contains(&self.onset_sensitivity) {
            return Err(ConfigError::InvalidValue {
                key: "audio.onset_sensitivity".to_string(),
                value: self.onset_sensitivity.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// On-screen text reduction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Process every Nth frame of the token sequence
    pub sample_stride: usize,

    /// Number of sampled frames counted as the hook window
    pub hook_frame_limit: usize,

    /// Minimum trimmed token length counted as a clear word
    pub min_word_length: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            sample_stride: 3,
            hook_frame_limit: 5,
            min_word_length: 3,
        }
    }
}

impl TextConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_stride == 0 {
            return Err(ConfigError::InvalidValue {
                key: "text.sample_stride".to_string(),
                value: self.sample_stride.to_string(),
            }
            .into());
        }

        if self.hook_frame_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "text.hook_frame_limit".to_string(),
                value: self.hook_frame_limit.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Visual reduction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualConfig {
    /// Scene detector threshold passed to the scene source
    pub scene_threshold: f64,

    /// Optical flow pyramid scale between levels
    pub flow_pyramid_scale: f64,

    /// Optical flow pyramid levels
    pub flow_levels: usize,

    /// Optical flow averaging window size (pixels)
    pub flow_window_size: usize,

    /// Optical flow iterations per pyramid level
    pub flow_iterations: usize,

    /// Polynomial expansion neighborhood size (pixels)
    pub flow_poly_n: usize,

    /// Polynomial expansion Gaussian sigma
    pub flow_poly_sigma: f64,

    /// Path to the frontal-face detection model, if any
    pub face_model_path: Option<String>,

    /// Number of parallel threads for per-frame statistics
    pub processing_threads: usize,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            scene_threshold: 30.0,
            flow_pyramid_scale: 0.5,
            flow_levels: 3,
            flow_window_size: 15,
            flow_iterations: 3,
            flow_poly_n: 5,
            flow_poly_sigma: 1.2,
            face_model_path: None,
            processing_threads: num_cpus::get(),
        }
    }
}

impl VisualConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.flow_pyramid_scale) || self.flow_pyramid_scale == 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "visual.flow_pyramid_scale".to_string(),
                value: self.flow_pyramid_scale.to_string(),
            }
            .into());
        }

        if self.flow_levels == 0 {
            return Err(ConfigError::InvalidValue {
                key: "visual.flow_levels".to_string(),
                value: self.flow_levels.to_string(),
            }
            .into());
        }

        if self.flow_poly_n % 2 == 0 || self.flow_poly_n < 3 {
            return Err(ConfigError::InvalidValue {
                key: "visual.flow_poly_n".to_string(),
                value: self.flow_poly_n.to_string(),
            }
            .into());
        }

        if self.flow_window_size == 0 || self.flow_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                key: "visual.flow_window".to_string(),
                value: format!("{}x{}", self.flow_window_size, self.flow_iterations),
            }
            .into());
        }

        if self.processing_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "visual.processing_threads".to_string(),
                value: self.processing_threads.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Pipeline orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Include frame-source metadata in the aggregated vector
    pub include_metadata: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            include_metadata: true,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let original = Config::default();

        original.save_to_file(&file_path).unwrap();
        let loaded = Config::from_file(&file_path).unwrap();

        assert_eq!(original.audio.window_size, loaded.audio.window_size);
        assert_eq!(original.text.sample_stride, loaded.text.sample_stride);
        assert_eq!(original.visual.scene_threshold, loaded.visual.scene_threshold);
    }

    #[test]
    fn test_invalid_window_size() {
        let mut config = Config::default();
        config.audio.window_size = 1000; // not a power of two
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_stride() {
        let mut config = Config::default();
        config.text.sample_stride = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_bpm_range() {
        let mut config = Config::default();
        config.audio.min_bpm = 150.0;
        config.audio.max_bpm = 100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_flow_neighborhood() {
        let mut config = Config::default();
        config.visual.flow_poly_n = 4; // must be odd
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_distinct_error() {
        let err = Config::from_file("does/not/exist.toml").unwrap_err();
        assert!(matches!(
            err,
            crate::error::SignalError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
