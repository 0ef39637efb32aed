use std::collections::BTreeMap;

use crate::audio::spectral;
use crate::audio::types::Waveform;
use crate::config::AudioConfig;
use crate::error::Result;
use crate::features::{FeatureMap, FeatureValue};
use crate::stats;

/// Feature keys produced by the audio reducer.
pub const AUDIO_FEATURE_KEYS: [&str; 9] = [
    "audio_energy",
    "beat_strength",
    "tempo_bpm",
    "speech_clarity",
    "hook_audio_intensity",
    "spectrogram_mean",
    "spectrogram_variance",
    "mfcc_mean",
    "mfcc_variance",
];

/// Reduces a decoded waveform to the audio feature set
///
/// Nine scalars covering energy, rhythm, and spectral shape. Every scalar
/// is computed independently: one failing sub-computation falls back to
/// `0.0` for that key without disturbing the others. An empty waveform
/// short-circuits to the all-zero map.
pub struct AudioAnalyzer {
    config: AudioConfig,
}

impl AudioAnalyzer {
    /// Create a new analyzer with default configuration
    pub fn new() -> Self {
        Self::with_config(AudioConfig::default())
    }

    /// Create a new analyzer with custom configuration
    pub fn with_config(config: AudioConfig) -> Self {
        Self { config }
    }

    /// Reduce a waveform to the nine audio features.
    pub fn reduce(&self, waveform: &Waveform) -> Result<FeatureMap> {
        self.config.validate()?;

        let mono = waveform.mono_samples();
        if mono.is_empty() {
            tracing::info!("Empty waveform, returning zeroed audio features");
            return Ok(zero_features());
        }

        tracing::debug!(
            "Reducing {:.2}s of audio at {} Hz",
            waveform.duration(),
            waveform.sample_rate
        );

        let window = self.config.window_size;
        let hop = self.config.hop_size;

        let rms = rms_envelope(&mono, window, hop);
        let energy = FeatureValue::from_option(stats::mean(&rms));
        let clarity = speech_clarity(&rms);
        let hook = self.hook_intensity(&mono, waveform.sample_rate);

        // The four spectral features share one STFT pass. If it fails they
        // all fall back while the time-domain features above stand.
        let (beat, tempo, spec_mean, spec_var, mfcc_mean, mfcc_var) =
            match spectral::magnitude_spectrogram(&mono, window, hop) {
                Ok(frames) => {
                    let envelope = spectral::onset_envelope(&frames);
                    let envelope_f64: Vec<f64> = envelope.iter().map(|&v| v as f64).collect();
                    let beat = FeatureValue::from_option(stats::mean(&envelope_f64));

                    let onsets = self.pick_onsets(&envelope, waveform.sample_rate);
                    let tempo = self.estimate_tempo(&onsets);

                    let flat: Vec<f64> = frames
                        .iter()
                        .flat_map(|frame| frame.iter().map(|&m| m as f64))
                        .collect();
                    let spec_mean = FeatureValue::from_option(stats::mean(&flat));
                    let spec_var = FeatureValue::from_option(stats::population_variance(&flat));

                    let filterbank = spectral::mel_filterbank(
                        self.config.mel_bands,
                        window,
                        waveform.sample_rate,
                    );
                    let mfcc =
                        spectral::mfcc_frames(&frames, &filterbank, self.config.mfcc_coefficients);
                    let mfcc_flat: Vec<f64> = mfcc
                        .iter()
                        .flat_map(|coeffs| coeffs.iter().map(|&c| c as f64))
                        .collect();
                    let mfcc_mean = FeatureValue::from_option(stats::mean(&mfcc_flat));
                    let mfcc_var =
                        FeatureValue::from_option(stats::population_variance(&mfcc_flat));

                    (beat, tempo, spec_mean, spec_var, mfcc_mean, mfcc_var)
                }
                Err(err) => {
                    tracing::warn!("Spectral analysis failed, zeroing spectral features: {}", err);
                    (
                        FeatureValue::Fallback,
                        FeatureValue::Fallback,
                        FeatureValue::Fallback,
                        FeatureValue::Fallback,
                        FeatureValue::Fallback,
                        FeatureValue::Fallback,
                    )
                }
            };

        let mut features = FeatureMap::new();
        features.insert("audio_energy", energy);
        features.insert("beat_strength", beat);
        features.insert("tempo_bpm", tempo);
        features.insert("speech_clarity", clarity);
        features.insert("hook_audio_intensity", hook);
        features.insert("spectrogram_mean", spec_mean);
        features.insert("spectrogram_variance", spec_var);
        features.insert("mfcc_mean", mfcc_mean);
        features.insert("mfcc_variance", mfcc_var);

        tracing::info!(
            "Audio reduction complete: energy {:.4}, tempo {:.1} BPM",
            features.get("audio_energy").unwrap_or(0.0),
            features.get("tempo_bpm").unwrap_or(0.0)
        );

        Ok(features)
    }

    /// Mean RMS over the leading hook span of the clip.
    fn hook_intensity(&self, mono: &[f32], sample_rate: u32) -> FeatureValue {
        let hook_len = (self.config.hook_seconds * sample_rate as f64) as usize;
        let lead = &mono[..hook_len.min(mono.len())];
        let rms = rms_envelope(lead, self.config.window_size, self.config.hop_size);
        FeatureValue::from_option(stats::mean(&rms))
    }

    /// Pick onset times as local maxima of the strength envelope.
    ///
    /// A frame fires when it tops its +-3 frame neighborhood, clears an
    /// adaptive threshold between the local mean and local max, and stands
    /// well above the local mean.
    fn pick_onsets(&self, envelope: &[f32], sample_rate: u32) -> Vec<f64> {
        let mut onsets = Vec::new();
        if envelope.len() < 7 || sample_rate == 0 {
            return onsets;
        }

        let sensitivity = self.config.onset_sensitivity;
        for i in 3..envelope.len() - 3 {
            let window = &envelope[i - 3..=i + 3];
            let local_max = window.iter().fold(0.0f32, |acc, &x| acc.max(x));
            let local_mean = window.iter().sum::<f32>() / window.len() as f32;
            let threshold = local_mean + sensitivity * (local_max - local_mean) * 0.5;

            let flux = envelope[i];
            if flux >= threshold && flux == local_max && flux > local_mean * 1.5 {
                let time = (i * self.config.hop_size) as f64 / sample_rate as f64;
                onsets.push(time);
            }
        }

        tracing::debug!("Picked {} onset candidates", onsets.len());
        onsets
    }

    /// Estimate global tempo from inter-onset intervals.
    ///
    /// Intervals are filtered to the plausible BPM range, quantized to 1ms
    /// and binned; the most common interval sets the tempo. Fewer than two
    /// onsets yields the fallback.
    fn estimate_tempo(&self, onsets: &[f64]) -> FeatureValue {
        if onsets.len() < 2 {
            return FeatureValue::Fallback;
        }

        let intervals: Vec<f64> = onsets
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .filter(|&interval| {
                let bpm = 60.0 / interval;
                bpm >= self.config.min_bpm && bpm <= self.config.max_bpm
            })
            .collect();

        if intervals.is_empty() {
            return FeatureValue::Fallback;
        }

        let mut interval_counts: BTreeMap<i64, usize> = BTreeMap::new();
        for &interval in &intervals {
            let quantized_ms = (interval * 1000.0).round() as i64;
            *interval_counts.entry(quantized_ms).or_insert(0) += 1;
        }

        match interval_counts.iter().max_by_key(|(_, &count)| count) {
            Some((&interval_ms, _)) if interval_ms > 0 => {
                let bpm = 60.0 / (interval_ms as f64 / 1000.0);
                tracing::debug!("Tempo {:.1} BPM from {} intervals", bpm, intervals.len());
                FeatureValue::computed(bpm)
            }
            _ => FeatureValue::Fallback,
        }
    }
}

impl Default for AudioAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// The all-zero audio map used when the waveform is empty or unusable.
fn zero_features() -> FeatureMap {
    let mut features = FeatureMap::new();
    for key in AUDIO_FEATURE_KEYS {
        features.insert(key, FeatureValue::Fallback);
    }
    features
}

/// RMS energy over sliding windows.
///
/// Input shorter than one window is reduced as a single window so brief
/// clips still report their level.
fn rms_envelope(samples: &[f32], window_size: usize, hop_size: usize) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }

    let rms = |window: &[f32]| -> f64 {
        let sum_sq: f32 = window.iter().map(|&x| x * x).sum();
        (sum_sq as f64 / window.len() as f64).sqrt()
    };

    if samples.len() < window_size {
        return vec![rms(samples)];
    }

    samples
        .windows(window_size)
        .step_by(hop_size.max(1))
        .map(rms)
        .collect()
}

/// `mean(RMS) / (std(RMS) + 1e-6)`: energy consistency over time.
fn speech_clarity(rms: &[f64]) -> FeatureValue {
    match (stats::mean(rms), stats::population_std(rms)) {
        (Some(mean), Some(std)) => FeatureValue::computed(mean / (std + 1e-6)),
        _ => FeatureValue::Fallback,
    }
}
