use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the clip-signals library
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Audio analysis error: {0}")]
    Audio(#[from] AudioError),

    #[error("Visual analysis error: {0}")]
    Visual(#[from] VisualError),

    #[error("Text analysis error: {0}")]
    Text(#[from] TextError),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("Input source error: {0}")]
    Source(#[from] SourceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Audio-specific errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to decode audio: {path}")]
    DecodeFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio feature computation failed: {feature} - {reason}")]
    FeatureFailed { feature: String, reason: String },

    #[error("Invalid audio parameters: {details}")]
    InvalidParameters { details: String },
}

/// Visual-specific errors
#[derive(Error, Debug)]
pub enum VisualError {
    #[error("Frame decode failed: {reason}")]
    FrameDecodeFailed { reason: String },

    #[error("Optical flow failed: {reason}")]
    FlowFailed { reason: String },

    #[error("Face detector unavailable: {reason}")]
    DetectorUnavailable { reason: String },

    #[error("Invalid visual parameters: {details}")]
    InvalidParameters { details: String },
}

/// Text-specific errors
#[derive(Error, Debug)]
pub enum TextError {
    #[error("Token batch for frame {frame_index} rejected: {reason}")]
    BadTokenBatch { frame_index: usize, reason: String },

    #[error("Invalid text parameters: {details}")]
    InvalidParameters { details: String },
}

/// OCR collaborator errors
///
/// `EngineUnavailable` is fatal for the clip: no token can be produced for
/// any frame. `FrameFailed` covers a single frame and is recoverable.
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    #[error("OCR failed on frame {frame_index}: {reason}")]
    FrameFailed { frame_index: usize, reason: String },
}

/// Input source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Input not found: {0}")]
    NotFound(PathBuf),

    #[error("Unreadable entry in {path}: {reason}")]
    UnreadableEntry { path: String, reason: String },

    #[error("Malformed fixture data: {path} - {reason}")]
    MalformedFixture { path: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using SignalError
pub type Result<T> = std::result::Result<T, SignalError>;

impl SignalError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable within a batch run.
    ///
    /// Recoverable failures zero the affected scalar or skip the affected
    /// frame; fatal ones abort the whole clip's extraction.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // A missing input or an absent OCR engine cannot produce any
            // usable vector for the clip.
            Self::Source(SourceError::NotFound(_)) => false,
            Self::Ocr(OcrError::EngineUnavailable { .. }) => false,
            Self::Config(_) => false,
            // Everything else is absorbed as a zero default or a skipped
            // frame by the reducers.
            _ => true,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Source(SourceError::NotFound(path)) => {
                format!(
                    "Input '{}' not found. Please check the path exists.",
                    path.display()
                )
            }
            Self::Ocr(OcrError::EngineUnavailable { reason }) => {
                format!(
                    "The OCR engine could not be used ({}). Text features cannot be extracted.",
                    reason
                )
            }
            Self::Audio(AudioError::DecodeFailed { path }) => {
                format!(
                    "Could not decode audio file '{}'. Please check it is a supported format.",
                    path
                )
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
