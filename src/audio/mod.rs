//! # Audio Feature Reduction
//!
//! Turns a decoded waveform into the audio slice of the feature vector:
//! energy, rhythm, and spectral-shape scalars.
//!
//! ## Core Features
//!
//! - **Energy**: sliding-window RMS statistics, plus the leading-hook level
//! - **Rhythm**: onset-strength envelope and a global tempo estimate
//! - **Spectral shape**: magnitude STFT and MFCC moments
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clip_signals::audio::{AudioAnalyzer, Waveform};
//!
//! # fn main() -> anyhow::Result<()> {
//! let waveform = Waveform::from_mono(vec![0.0; 44100], 44100);
//!
//! let analyzer = AudioAnalyzer::new();
//! let features = analyzer.reduce(&waveform)?;
//!
//! println!("tempo: {:?}", features.get("tempo_bpm"));
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod spectral;
pub mod types;

pub use analyzer::{AudioAnalyzer, AUDIO_FEATURE_KEYS};
pub use types::Waveform;
