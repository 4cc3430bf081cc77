use crate::patch::{GlobalParam, ParamKey, Patch};

/// Convert a (possibly fractional) MIDI pitch to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(pitch: f32) -> f32 {
    440.0 * 2.0_f32.powf((pitch - 69.0) / 12.0)
}

/// Context passed to graph nodes during rendering
///
/// Contains information about what to render:
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - frequency: Voice fundamental (Hz), pitch bend already applied
/// - velocity: Intensity/loudness (0.0-1.0)
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
    pub velocity: f32,
}

impl RenderCtx {
    /// Create context from a MIDI pitch (keyboard/sequencer use case)
    pub fn from_note(sample_rate: f32, pitch: f32, velocity: f32) -> Self {
        Self::from_freq(sample_rate, midi_note_to_freq(pitch), velocity)
    }

    /// Create context from direct frequency
    pub fn from_freq(sample_rate: f32, frequency: f32, velocity: f32) -> Self {
        Self {
            sample_rate,
            frequency,
            velocity,
        }
    }
}

/// A voice's signal graph, as seen by the voice pool.
///
/// The pool only drives lifecycle and parameter calls through this trait and
/// never looks inside the graph.
pub trait GraphNode: Send {
    /// Render one block of interleaved `OUTPUT_CHANNELS`-channel frames.
    ///
    /// The node ADDS its output into `out`; `out.len()` is a multiple of the
    /// channel count.
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Triggered when a note starts (or the voice is stolen for a new note)
    fn note_on(&mut self, ctx: &RenderCtx);

    /// Triggered when a note is released
    fn note_off(&mut self, ctx: &RenderCtx);

    /// Replace every parameter from the table, dropping per-note changes.
    fn apply_patch(&mut self, _patch: &Patch) {}

    /// Live update of one per-operator parameter.
    fn set_param(&mut self, _key: ParamKey, _value: f32) {}

    /// Live update of one global parameter.
    fn set_global(&mut self, _param: GlobalParam, _value: f32) {}

    /// Per-note pressure (aftertouch), 0.0 to 1.0.
    fn set_pressure(&mut self, _pressure: f32) {}

    /// True once every envelope has gone idle; the voice can be reclaimed.
    fn is_silent(&self) -> bool;

    /// True while the gate is held and every envelope has settled in sustain.
    fn is_sustaining(&self) -> bool {
        false
    }
}
