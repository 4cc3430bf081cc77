pub mod config;
pub mod dsp;
pub mod error;
pub mod graph; // Operator graph ("particle") and its fixed routing
pub mod io;
pub mod patch; // Flat parameter table
pub mod synth; // Voice management, event handoff and the render loop

pub use config::{EngineConfig, PlayMode, RampRetrigger};
pub use error::Error;
pub use patch::{GlobalParam, OperatorParam, ParamKey, Patch};
pub use synth::{PolySynth, SynthHandle, SynthMessage};

/// Largest block (in frames) the render loop accepts.
pub const MAX_BLOCK_SIZE: usize = 2048;
/// Operators per particle: three modulators followed by four carriers.
pub const OPERATOR_COUNT: usize = 7;
/// Carriers per particle, each owning one stereo pair of the output frame.
pub const CARRIER_COUNT: usize = 4;
/// Interleaved channels in one output frame (four stereo pairs).
pub const OUTPUT_CHANNELS: usize = CARRIER_COUNT * 2;
/// Taps per side of a carrier's stereo multitap delay.
pub const MAX_DELAY_TAPS: usize = 4;

pub(crate) const MIN_FREQUENCY: f32 = 1.0e-3;
