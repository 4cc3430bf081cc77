//! Sub-audio sine oscillator driving the carrier auto-panners.

/*
Pan LFO
=======

Each carrier sweeps across its stereo pair at its own slow rate. The default
patch uses rates between 0.1 and 0.3 Hz, so the four carriers drift in and out
of phase with each other over several seconds.

    value = sin(2π · phase)        -1.0 ..= +1.0 (bipolar)
    phase += rate · dt             wrapped into [0, 1)

The sine is computed directly instead of through the wave tables: only one
shape is ever needed, and at these rates the cost is one `sin` per carrier per
sample.

The LFO is free-running while a voice sounds and restarts at the zero
crossing when a silent voice is retriggered, so every fresh note starts its
sweep from the pan center.
*/

use std::f32::consts::TAU;

/// Free-running sine LFO, bipolar output.
#[derive(Debug, Clone, Default)]
pub struct Lfo {
    phase: f32,
    rate: f32,
}

impl Lfo {
    pub fn new(rate: f32) -> Self {
        let mut lfo = Self::default();
        lfo.set_rate(rate);
        lfo
    }

    /// Rate in Hz. Negative or non-finite rates stop the LFO.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Current value (-1.0 to +1.0), then advance by `dt` seconds.
    #[inline]
    pub fn next(&mut self, dt: f32) -> f32 {
        let value = (self.phase * TAU).sin();
        self.phase += self.rate * dt;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        value
    }

    /// Restart the cycle at zero crossing.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
