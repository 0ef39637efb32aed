use std::fs::File;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{info, warn};

use crate::audio::Waveform;
use crate::error::{AudioError, Result, SourceError};
use crate::sources::WaveformSource;

/// Waveform source backed by a single audio file
///
/// WAV goes through hound; mp3/flac/ogg/m4a/aac go through a symphonia
/// probe and decode. A missing file is the distinct fatal not-found error;
/// a file that exists but will not decode is a recoverable decode failure,
/// leaving the caller to fall back to silence.
pub struct FileWaveformSource {
    path: PathBuf,
}

impl FileWaveformSource {
    /// Create a source reading from the given file.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl WaveformSource for FileWaveformSource {
    async fn waveform(&self) -> Result<Waveform> {
        let path = &self.path;
        if !path.is_file() {
            return Err(SourceError::NotFound(path.clone()).into());
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        let waveform = match extension.as_str() {
            "wav" => decode_wav(path)?,
            "mp3" | "flac" | "ogg" | "m4a" | "aac" => decode_with_symphonia(path)?,
            _ => {
                return Err(AudioError::UnsupportedFormat { format: extension }.into());
            }
        };

        info!(
            "Decoded {:.2}s of audio from {:?} ({} Hz, {} channels)",
            waveform.duration(),
            path,
            waveform.sample_rate,
            waveform.channels
        );
        Ok(waveform)
    }
}

/// Decode a WAV file with hound.
fn decode_wav(path: &Path) -> Result<Waveform> {
    let reader = hound::WavReader::open(path).map_err(|_| AudioError::DecodeFailed {
        path: path.display().to_string(),
    })?;

    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| AudioError::DecodeFailed {
                path: path.display().to_string(),
            })?,
        hound::SampleFormat::Int => {
            let bit_depth = spec.bits_per_sample;
            let raw: std::result::Result<Vec<i32>, _> = reader.into_samples().collect();
            raw.map_err(|_| AudioError::DecodeFailed {
                path: path.display().to_string(),
            })?
            .into_iter()
            .map(|sample| int_to_float(sample, bit_depth))
            .collect()
        }
    };

    Ok(Waveform::new(samples, spec.sample_rate, spec.channels))
}

/// Decode any other supported container with symphonia.
fn decode_with_symphonia(path: &Path) -> Result<Waveform> {
    let decode_failed = || AudioError::DecodeFailed {
        path: path.display().to_string(),
    };

    let file = File::open(path).map_err(|_| decode_failed())?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();
    let probed = symphonia::default::get_probe()
        .format(&hint, stream, &fmt_opts, &meta_opts)
        .map_err(|_| decode_failed())?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(decode_failed)?;
    let track_id = track.id;

    let codec_params = &track.codec_params;
    let sample_rate = codec_params.sample_rate.ok_or_else(decode_failed)?;
    let channels = codec_params
        .channels
        .ok_or_else(decode_failed)?
        .count() as u16;

    let dec_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(codec_params, &dec_opts)
        .map_err(|_| decode_failed())?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            // End of stream, or a stream broken past recovery; keep what
            // was decoded so far.
            Err(_) => break,
        };

        while !format.metadata().is_latest() {
            format.metadata().pop();
        }

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => extend_interleaved(&decoded, &mut samples),
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(_) => break,
        }
    }

    Ok(Waveform::new(samples, sample_rate, channels))
}

/// Interleave a decoded planar buffer into the output as f32.
fn extend_interleaved(buffer: &AudioBufferRef, output: &mut Vec<f32>) {
    match buffer {
        AudioBufferRef::F32(buf) => extend_planar(buf, output, |s| s),
        AudioBufferRef::F64(buf) => extend_planar(buf, output, |s| s as f32),
        AudioBufferRef::S32(buf) => extend_planar(buf, output, |s| s as f32 / 2_147_483_648.0),
        AudioBufferRef::S16(buf) => extend_planar(buf, output, |s| s as f32 / 32_768.0),
        _ => warn!("Unsupported sample format, dropping packet"),
    }
}

fn extend_planar<S, F>(buffer: &AudioBuffer<S>, output: &mut Vec<f32>, convert: F)
where
    S: Sample,
    F: Fn(S) -> f32,
{
    let channels = buffer.spec().channels.count();
    let frames = buffer.frames();
    for frame_idx in 0..frames {
        for ch in 0..channels {
            output.push(convert(buffer.chan(ch)[frame_idx]));
        }
    }
}

/// Convert an integer sample to float in -1.0..1.0.
fn int_to_float(sample: i32, bit_depth: u16) -> f32 {
    match bit_depth {
        8 => (sample as f32 - 128.0) / 128.0,
        16 => sample as f32 / 32_768.0,
        24 => sample as f32 / 8_388_608.0,
        32 => sample as f32 / 2_147_483_648.0,
        _ => sample as f32 / 32_768.0,
    }
}
