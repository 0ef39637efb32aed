/// Decoded audio data for one clip
///
/// Samples are interleaved when the source is multi-channel. The waveform
/// is immutable for the lifetime of a reduction; analyzers work on the
/// mono mix.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Audio samples (interleaved for stereo, plain for mono)
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl Waveform {
    /// Create a waveform from interleaved samples
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Create a mono waveform
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    /// True if the waveform carries no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        let frames = self.samples.len() / self.channels as usize;
        frames as f64 / self.sample_rate as f64
    }

    /// Get mono mix of all channels
    pub fn mono_samples(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        let mut mono = Vec::with_capacity(self.samples.len() / self.channels as usize);

        for chunk in self.samples.chunks(self.channels as usize) {
            let sum: f32 = chunk.iter().sum();
            mono.push(sum / self.channels as f32);
        }

        mono
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_mix_averages_channels() {
        let wf = Waveform::new(vec![1.0, 0.0, 0.5, 0.5], 44100, 2);
        assert_eq!(wf.mono_samples(), vec![0.5, 0.5]);
    }

    #[test]
    fn mono_waveform_passes_through() {
        let wf = Waveform::from_mono(vec![0.1, 0.2, 0.3], 22050);
        assert_eq!(wf.mono_samples(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn duration_counts_frames_not_samples() {
        let wf = Waveform::new(vec![0.0; 88200], 44100, 2);
        assert!((wf.duration() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_waveform_reports_empty() {
        let wf = Waveform::from_mono(vec![], 44100);
        assert!(wf.is_empty());
        assert_eq!(wf.duration(), 0.0);
    }
}
