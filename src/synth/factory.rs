use std::sync::Arc;

use crate::{
    config::EngineConfig,
    dsp::oscillator::WaveTables,
    graph::{node::GraphNode, particle::Particle, routing::Routing},
    patch::Patch,
};

/// Factory for creating the voices of the pool
///
/// This is the "instrument design" layer - the sound is configured once,
/// then PolySynth uses this factory to fill every slot with identical voices
/// before rendering starts.
pub trait VoiceFactory: Send {
    type Voice: GraphNode;

    fn create_voice(&self) -> Self::Voice;
}

impl<F, T> VoiceFactory for F
where
    F: Fn() -> T + Send,
    T: GraphNode,
{
    type Voice = T;

    fn create_voice(&self) -> Self::Voice {
        self()
    }
}

/// Builds particles that share one set of wave tables.
pub struct ParticleFactory {
    patch: Patch,
    routing: Routing,
    tables: Arc<WaveTables>,
    config: EngineConfig,
}

impl ParticleFactory {
    pub fn new(patch: Patch, routing: Routing, config: EngineConfig) -> Self {
        Self {
            patch,
            routing,
            tables: Arc::new(WaveTables::new()),
            config,
        }
    }
}

impl VoiceFactory for ParticleFactory {
    type Voice = Particle;

    fn create_voice(&self) -> Particle {
        Particle::new(
            &self.patch,
            self.routing,
            Arc::clone(&self.tables),
            &self.config,
        )
    }
}
