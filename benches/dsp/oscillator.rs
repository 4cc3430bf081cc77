//! Benchmarks for wave table lookups.

use std::f32::consts::TAU;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use particle_synth::dsp::oscillator::{wrap_phase, OscillatorWaveform, WaveTables};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let tables = WaveTables::new();
    let increment = TAU * 440.0 / 48_000.0;

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for (name, waveform) in [
            ("sine", OscillatorWaveform::Sine),
            ("saw", OscillatorWaveform::Saw),
        ] {
            let mut phase = 0.0f32;
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    for sample in buffer.iter_mut() {
                        *sample = tables.lookup(black_box(waveform), phase);
                        phase = wrap_phase(phase + increment);
                    }
                })
            });
        }
    }

    group.finish();
}
