//! Audio reduction throughput benchmark
//!
//! Feeds synthesized waveforms of increasing length through the full audio
//! reducer to track how extraction cost scales with clip duration. The synth
//! signal mixes two tones with periodic clicks so tempo and onset picking
//! have real work to do.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use clip_signals::audio::{AudioAnalyzer, Waveform};

/// Sine bed with a click every half second, loud enough to register as onsets.
fn synth_clip(seconds: f64, sample_rate: u32) -> Waveform {
    let total = (seconds * sample_rate as f64) as usize;
    let click_period = sample_rate as usize / 2;
    let mut samples = Vec::with_capacity(total);
    for i in 0..total {
        let t = i as f32 / sample_rate as f32;
        let mut s = 0.4 * (std::f32::consts::TAU * 220.0 * t).sin()
            + 0.2 * (std::f32::consts::TAU * 555.0 * t).sin();
        if i % click_period < 64 {
            s += 0.5;
        }
        samples.push(s);
    }
    Waveform::from_mono(samples, sample_rate)
}

fn bench_audio_reduce(c: &mut Criterion) {
    let analyzer = AudioAnalyzer::new();
    let sample_rate = 22_050;

    let mut group = c.benchmark_group("audio_reduce");
    for seconds in [3.0, 10.0, 30.0] {
        let waveform = synth_clip(seconds, sample_rate);
        group.throughput(Throughput::Elements(waveform.samples.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}s", seconds)),
            &waveform,
            |b, waveform| {
                b.iter(|| analyzer.reduce(black_box(waveform)));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_audio_reduce);
criterion_main!(benches);
