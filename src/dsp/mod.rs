//! Low-level DSP primitives used by the operator graph.
//!
//! These components allocate only at construction and are realtime-safe
//! afterwards, so they can be embedded directly inside operators and voices.
//! They stay focused on the signal-processing math; the graph layer decides
//! how they are wired together.

/// Circular delay line, multitap and stereo multitap echo.
pub mod delay;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Sine LFO for the auto-panner.
pub mod lfo;
/// Band-limited wave tables.
pub mod oscillator;
/// Equal-power auto-panner.
pub mod pan;
/// Start-to-end scalar ramps.
pub mod ramp;

pub use envelope::EnvelopeState;
pub use oscillator::{OscillatorWaveform, WaveTables};
pub use ramp::RampShape;
