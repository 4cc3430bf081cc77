use crate::{
    graph::node::{GraphNode, RenderCtx},
    synth::message::NoteId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Gate held (or deferred by the sustain pedal)
    Releasing, // Key released, envelopes in release phase
}

/// A pool slot: one graph plus the note currently bound to it
pub struct Voice<T: GraphNode> {
    note_id: Option<NoteId>,
    pitch: f32,
    velocity: f32,
    channel: u8,
    state: VoiceState,
    age: u64,
    /// Note-off arrived while the sustain pedal was down
    release_deferred: bool,
    sample_rate: f32,
    graph: T,
}

impl<T: GraphNode> Voice<T> {
    pub fn new(graph: T, sample_rate: f32) -> Self {
        Self {
            note_id: None,
            pitch: 0.0,
            velocity: 0.0,
            channel: 0,
            state: VoiceState::Free,
            age: 0,
            release_deferred: false,
            sample_rate,
            graph,
        }
    }

    /// Bind a note and trigger the graph. Sounding graphs retrigger from their
    /// current level.
    pub fn start(&mut self, note_id: NoteId, pitch: f32, velocity: f32, channel: u8, age: u64) {
        self.note_id = Some(note_id);
        self.pitch = pitch;
        self.velocity = velocity;
        self.channel = channel;
        self.state = VoiceState::Active;
        self.age = age;
        self.release_deferred = false;

        let ctx = RenderCtx::from_note(self.sample_rate, pitch, velocity);
        self.graph.note_on(&ctx);
    }

    /// Rebind to another note without retriggering (legato).
    pub fn retune(&mut self, note_id: NoteId, pitch: f32) {
        self.note_id = Some(note_id);
        self.pitch = pitch;
    }

    pub fn release(&mut self) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.release_deferred = false;

            let ctx = RenderCtx::from_note(self.sample_rate, self.pitch, self.velocity);
            self.graph.note_off(&ctx);
        }
    }

    /// Remember a note-off to apply when the sustain pedal lifts.
    pub fn defer_release(&mut self) {
        if self.state == VoiceState::Active {
            self.release_deferred = true;
        }
    }

    /// Add this voice's block into `out`, with `bend` semitones applied.
    pub fn render(&mut self, out: &mut [f32], bend: f32) {
        let ctx = RenderCtx::from_note(self.sample_rate, self.pitch + bend, self.velocity);
        self.graph.render_block(out, &ctx);
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    /// Bound, sounding and no longer held.
    pub fn is_releasing(&self) -> bool {
        self.state == VoiceState::Releasing
    }

    pub fn is_release_deferred(&self) -> bool {
        self.release_deferred
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.note_id = None;
        self.release_deferred = false;
    }

    pub fn note_id(&self) -> Option<NoteId> {
        self.note_id
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn graph(&self) -> &T {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut T {
        &mut self.graph
    }
}
