// Purpose: Voice management, event handoff and the render loop
// This layer sits above the particle graph and manages the voice pool

pub mod allocator;
pub mod factory;
pub mod message;
pub mod poly;
pub mod voice;

pub use message::{ControlTarget, NoteId, SynthHandle, SynthMessage};
pub use poly::PolySynth;
