//! Benchmarks for linear and exponential ramps.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use particle_synth::dsp::ramp::{Ramp, RampShape};

use crate::BLOCK_SIZES;

pub fn bench_ramp(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/ramp");
    let dt = 1.0 / 48_000.0;

    for &size in BLOCK_SIZES {
        for (name, shape) in [
            ("linear", RampShape::Linear),
            ("exponential", RampShape::Exponential),
        ] {
            let mut ramp = Ramp::default();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &size| {
                b.iter(|| {
                    // Restart so every iteration measures a moving ramp
                    ramp.start(0.5, 2.0, 10.0, shape);
                    let mut sum = 0.0f32;
                    for _ in 0..size {
                        sum += ramp.advance(black_box(dt));
                    }
                    sum
                })
            });
        }
    }

    group.finish();
}
