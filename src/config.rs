//! Engine configuration, negotiated once before the audio callback starts.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::Error, MAX_BLOCK_SIZE};

/// How note events map onto the voice pool.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    /// Every note gets its own voice, stealing when the pool is exhausted.
    #[default]
    Poly,
    /// All notes share one persistent voice; overlapping notes glide legato.
    Mono,
}

/// Where frequency and amplitude ramps restart from when a voice is retriggered.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RampRetrigger {
    /// Restart from the configured start value.
    #[default]
    FromStart,
    /// Restart from wherever the ramp currently is, heading to the configured end value.
    FromCurrent,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Samples per second.
    pub sample_rate: f32,
    /// Frames per render block. Immutable once the engine is built.
    pub block_size: usize,
    /// Size of the pre-allocated voice pool.
    pub max_voices: usize,
    /// Capacity of the control -> audio event queue.
    pub event_queue_capacity: usize,
    pub play_mode: PlayMode,
    pub ramp_retrigger: RampRetrigger,
    /// Delay memory per tap line, in seconds. Longer tap times are clamped.
    pub max_delay_seconds: f32,
}

impl EngineConfig {
    /// Check the configuration before any realtime work starts.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_voices == 0 {
            return Err(Error::NoVoices);
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(Error::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(Error::InvalidBlockSize(self.block_size));
        }
        if self.event_queue_capacity == 0 {
            return Err(Error::InvalidQueueCapacity);
        }
        if !self.max_delay_seconds.is_finite() || self.max_delay_seconds <= 0.0 {
            return Err(Error::InvalidDelayTime(self.max_delay_seconds));
        }
        Ok(())
    }

    /// Delay line length in samples for the configured memory and sample rate.
    pub fn delay_capacity(&self) -> usize {
        (self.max_delay_seconds * self.sample_rate).ceil() as usize + 1
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            block_size: 256,
            max_voices: 8,
            event_queue_capacity: 1024,
            play_mode: PlayMode::Poly,
            ramp_retrigger: RampRetrigger::FromStart,
            max_delay_seconds: 2.0,
        }
    }
}
