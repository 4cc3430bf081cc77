//! One fully triggered particle: seven operators, four echoes, four panners.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use particle_synth::{
    dsp::WaveTables,
    graph::{GraphNode, Particle, RenderCtx, Routing},
    EngineConfig, Patch, OUTPUT_CHANNELS,
};

use crate::BLOCK_SIZES;

pub fn bench_particle(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/particle");
    let config = EngineConfig::default();
    let tables = Arc::new(WaveTables::new());
    let routing = Routing::particle().expect("fixed routing is valid");

    for &size in BLOCK_SIZES {
        let mut particle = Particle::new(&Patch::default(), routing, Arc::clone(&tables), &config);
        let ctx = RenderCtx::from_note(config.sample_rate, 57.0, 0.8);
        particle.note_on(&ctx);

        let mut buffer = vec![0.0f32; size * OUTPUT_CHANNELS];
        group.bench_with_input(BenchmarkId::new("sustained", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                particle.render_block(black_box(&mut buffer), &ctx);
            })
        });
    }

    group.finish();
}
