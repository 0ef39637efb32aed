//! Spectral analysis primitives for the audio reducer
//!
//! Short-time Fourier transform, onset-strength envelope, and MFCC
//! computation. Everything here is synchronous and allocation-light: the
//! FFT plan is built once per call and frames are processed in place.

use realfft::RealFftPlanner;

use crate::error::{AudioError, Result};

/// Compute the magnitude short-time Fourier transform.
///
/// Frames start every `hop_size` samples; the final frames are zero-padded
/// to `window_size` so short clips still produce at least one frame. Each
/// frame is Hann-windowed before the transform. Returns `frames x bins`
/// with `bins = window_size / 2 + 1`.
pub fn magnitude_spectrogram(
    samples: &[f32],
    window_size: usize,
    hop_size: usize,
) -> Result<Vec<Vec<f32>>> {
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let mut planner = RealFftPlanner::new();
    let fft = planner.plan_fft_forward(window_size);
    let mut input_buffer = fft.make_input_vec();
    let mut spectrum_buffer = fft.make_output_vec();

    let hann: Vec<f32> = (0..window_size)
        .map(|i| {
            0.5 * (1.0
                - (2.0 * std::f32::consts::PI * i as f32 / (window_size - 1) as f32).cos())
        })
        .collect();

    let mut frames = Vec::new();
    let mut start = 0;

    while start < samples.len() {
        let end = (start + window_size).min(samples.len());
        let frame = &samples[start..end];

        for (i, slot) in input_buffer.iter_mut().enumerate() {
            *slot = match frame.get(i) {
                Some(&sample) => sample * hann[i],
                None => 0.0,
            };
        }

        fft.process(&mut input_buffer, &mut spectrum_buffer)
            .map_err(|_| AudioError::FeatureFailed {
                feature: "spectrogram".to_string(),
                reason: "FFT processing failed".to_string(),
            })?;

        frames.push(spectrum_buffer.iter().map(|c| c.norm()).collect());

        start += hop_size;
    }

    Ok(frames)
}

/// Onset-strength envelope from a magnitude spectrogram.
///
/// Per frame, the mean over bins of the positive spectral difference
/// against the previous frame. The first frame is compared against
/// silence, so a clip that starts on a transient registers it.
pub fn onset_envelope(spectrogram: &[Vec<f32>]) -> Vec<f32> {
    let mut envelope = Vec::with_capacity(spectrogram.len());
    let mut previous: Option<&Vec<f32>> = None;

    for frame in spectrogram {
        let flux: f32 = match previous {
            Some(prev) => frame
                .iter()
                .zip(prev.iter())
                .map(|(&curr, &prev)| (curr - prev).max(0.0))
                .sum(),
            None => frame.iter().sum(),
        };

        let bins = frame.len().max(1);
        envelope.push(flux / bins as f32);
        previous = Some(frame);
    }

    envelope
}

/// Build a triangular mel filterbank.
///
/// `mel_bands` filters over `window_size / 2 + 1` linear-frequency bins,
/// with band edges equally spaced on the mel scale between 0 Hz and
/// Nyquist. Rows are filter weights per bin.
pub fn mel_filterbank(mel_bands: usize, window_size: usize, sample_rate: u32) -> Vec<Vec<f32>> {
    let bins = window_size / 2 + 1;
    let nyquist = sample_rate as f64 / 2.0;

    let mel_max = hz_to_mel(nyquist);
    let band_edges: Vec<f64> = (0..mel_bands + 2)
        .map(|i| mel_to_hz(mel_max * i as f64 / (mel_bands + 1) as f64))
        .collect();

    let bin_freqs: Vec<f64> = (0..bins)
        .map(|b| b as f64 * sample_rate as f64 / window_size as f64)
        .collect();

    let mut filters = Vec::with_capacity(mel_bands);
    for k in 0..mel_bands {
        let (left, center, right) = (band_edges[k], band_edges[k + 1], band_edges[k + 2]);
        let filter: Vec<f32> = bin_freqs
            .iter()
            .map(|&f| {
                let weight = if f <= left || f >= right {
                    0.0
                } else if f <= center {
                    (f - left) / (center - left)
                } else {
                    (right - f) / (right - center)
                };
                weight as f32
            })
            .collect();
        filters.push(filter);
    }

    filters
}

/// Mel-frequency cepstral coefficients per frame.
///
/// Squares the magnitude spectrogram into power, applies the filterbank,
/// takes the natural log (floored at 1e-10) and an orthonormal DCT-II,
/// keeping the first `n_coeffs` coefficients.
pub fn mfcc_frames(
    spectrogram: &[Vec<f32>],
    filterbank: &[Vec<f32>],
    n_coeffs: usize,
) -> Vec<Vec<f32>> {
    let n_coeffs = n_coeffs.min(filterbank.len());
    let mut frames = Vec::with_capacity(spectrogram.len());

    for frame in spectrogram {
        let mut log_mel = Vec::with_capacity(filterbank.len());
        for filter in filterbank {
            let energy: f32 = filter
                .iter()
                .zip(frame.iter())
                .map(|(&w, &m)| w * m * m)
                .sum();
            log_mel.push(energy.max(1e-10).ln());
        }
        let mut coeffs = dct_ii_orthonormal(&log_mel);
        coeffs.truncate(n_coeffs);
        frames.push(coeffs);
    }

    frames
}

/// Orthonormal DCT-II of a real vector.
fn dct_ii_orthonormal(input: &[f32]) -> Vec<f32> {
    let n = input.len();
    if n == 0 {
        return Vec::new();
    }

    let scale0 = (1.0 / n as f32).sqrt();
    let scale = (2.0 / n as f32).sqrt();

    (0..n)
        .map(|k| {
            let sum: f32 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    x * (std::f32::consts::PI * (i as f32 + 0.5) * k as f32 / n as f32).cos()
                })
                .sum();
            if k == 0 {
                sum * scale0
            } else {
                sum * scale
            }
        })
        .collect()
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        (0..(sample_rate as f32 * seconds) as usize)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * freq * t).sin() * 0.5
            })
            .collect()
    }

    #[test]
    fn spectrogram_of_empty_signal_is_empty() {
        let frames = magnitude_spectrogram(&[], 1024, 512).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn spectrogram_peak_tracks_sine_frequency() {
        let samples = sine(440.0, 44100, 1.0);
        let frames = magnitude_spectrogram(&samples, 1024, 512).unwrap();
        assert!(!frames.is_empty());
        assert_eq!(frames[0].len(), 513);

        // 440 Hz should land near bin 440 * 1024 / 44100 ~= 10.2.
        let mid = &frames[frames.len() / 2];
        let peak_bin = mid
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!((9..=11).contains(&peak_bin), "peak at bin {}", peak_bin);
    }

    #[test]
    fn short_clip_still_produces_one_frame() {
        let samples = vec![0.3f32; 100];
        let frames = magnitude_spectrogram(&samples, 1024, 512).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn onset_envelope_spikes_on_transition() {
        // Silence, then a tone: the flux at the transition frame dominates.
        let mut samples = vec![0.0f32; 22050];
        samples.extend(sine(880.0, 22050, 1.0));
        let frames = magnitude_spectrogram(&samples, 1024, 512).unwrap();
        let envelope = onset_envelope(&frames);

        let peak_idx = envelope
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        // Transition happens around frame 22050 / 512 ~= 43.
        assert!((40..=47).contains(&peak_idx), "peak at frame {}", peak_idx);
    }

    #[test]
    fn filterbank_rows_cover_the_spectrum() {
        let filters = mel_filterbank(40, 1024, 44100);
        assert_eq!(filters.len(), 40);
        assert!(filters.iter().all(|f| f.len() == 513));
        assert!(filters.iter().all(|f| f.iter().any(|&w| w > 0.0)));
    }

    #[test]
    fn dct_of_constant_concentrates_in_first_coefficient() {
        let coeffs = dct_ii_orthonormal(&[1.0; 16]);
        assert!(coeffs[0] > 3.9); // sqrt(16) * 1.0
        assert!(coeffs[1..].iter().all(|&c| c.abs() < 1e-5));
    }

    #[test]
    fn mfcc_frames_have_requested_width() {
        let samples = sine(440.0, 22050, 0.5);
        let frames = magnitude_spectrogram(&samples, 1024, 512).unwrap();
        let filterbank = mel_filterbank(40, 1024, 22050);
        let mfcc = mfcc_frames(&frames, &filterbank, 13);

        assert_eq!(mfcc.len(), frames.len());
        assert!(mfcc.iter().all(|c| c.len() == 13));
        assert!(mfcc.iter().flatten().all(|c| c.is_finite()));
    }
}
