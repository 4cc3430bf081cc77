//! The whole render loop with a full voice pool.
//!
//! Every slot holds a sounding particle, so this is the worst case the audio
//! callback sees before stealing starts.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use particle_synth::{EngineConfig, Patch, PolySynth, OUTPUT_CHANNELS};

use crate::BLOCK_SIZES;

const CHORD: &[f32] = &[48.0, 52.0, 55.0, 59.0, 60.0, 64.0, 67.0, 71.0];

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let config = EngineConfig {
            block_size: size,
            max_voices: CHORD.len(),
            ..EngineConfig::default()
        };
        let (mut synth, mut handle) =
            PolySynth::new(config, Patch::default()).expect("default engine builds");

        for (id, &pitch) in CHORD.iter().enumerate() {
            handle
                .note_on(id as u64, pitch, 0.7, 0)
                .expect("queue has room");
        }

        let mut buffer = vec![0.0f32; size * OUTPUT_CHANNELS];
        synth.render_block(&mut buffer);

        group.bench_with_input(
            BenchmarkId::new(format!("{}_voices", CHORD.len()), size),
            &size,
            |b, _| {
                b.iter(|| {
                    synth.render_block(black_box(&mut buffer));
                })
            },
        );
    }

    group.finish();
}
