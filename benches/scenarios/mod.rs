//! Real-world scenario benchmarks.
//!
//! These benchmarks model actual usage: one fully triggered particle, and the
//! whole engine with a busy voice pool.

mod engine;
mod particle;

pub use engine::bench_engine;
pub use particle::bench_particle;
