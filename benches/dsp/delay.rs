//! Benchmarks for delay line operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use particle_synth::{
    dsp::delay::{DelayLine, StereoMultiTapDelay},
    patch::DelayParams,
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Test with different delay times (in samples)
    let delay_times: &[f32] = &[
        480.0,   // 10ms at 48kHz
        4800.0,  // 100ms at 48kHz
        48000.0, // 1 second at 48kHz
    ];

    for &size in BLOCK_SIZES {
        // Generate a test signal
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for &delay_samples in delay_times {
            let delay_ms = delay_samples / 48.0;

            let mut delay = DelayLine::with_capacity(2 * SAMPLE_RATE as usize);
            let mut buffer = input.clone();
            group.bench_with_input(
                BenchmarkId::new(format!("render_{}ms", delay_ms as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        delay.render(black_box(&mut buffer), black_box(delay_samples));
                    })
                },
            );
        }

        // Default carrier echo: three taps per side with feedback
        let mut echo = StereoMultiTapDelay::with_capacity(2 * SAMPLE_RATE as usize);
        echo.set_params(&DelayParams::default(), SAMPLE_RATE);
        group.bench_with_input(
            BenchmarkId::new("stereo_multitap", size),
            &size,
            |b, _| {
                b.iter(|| {
                    let mut sum = 0.0f32;
                    for &sample in &input {
                        let (l, r) = echo.process(black_box(sample));
                        sum += l + r;
                    }
                    sum
                })
            },
        );
    }

    group.finish();
}
