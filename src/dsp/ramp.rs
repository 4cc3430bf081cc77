//! Time-based scalar interpolation.

/*
Ramps
=====

A ramp moves one scalar from a start value to an end value over a fixed
duration, then holds the end value. Operators use two of them: one scales
frequency, one scales amplitude. Unlike an envelope a ramp ignores the gate;
it starts on note-on and simply runs out.

  value
    to  ┤            ┌───────────── (holds)
        │          ╱
        │        ╱
  from  ┤──────╱
        └──────┴─────┴─────────────→ time
               0   duration


Shapes
------

LINEAR
    value = from + (to - from) * progress        progress = elapsed / duration

EXPONENTIAL
    value = from * (to / from) ^ progress

    Equal time steps give equal RATIOS instead of equal differences, which is
    how pitch and loudness are perceived. The formula only exists for strictly
    positive endpoints (log of zero or a negative number), so any endpoint
    <= 0 falls back to the linear formula.


Degenerate Inputs
-----------------

Nothing is rejected. A duration of zero (or less) means the ramp is already
finished and `advance` returns `to`. Non-finite values are replaced by the
other endpoint or zero.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RampShape {
    #[default]
    Linear,
    Exponential,
}

impl RampShape {
    /// Map a flat parameter value onto a shape: 0 is linear, anything else exponential.
    pub fn from_value(value: f32) -> Self {
        if value >= 0.5 {
            RampShape::Exponential
        } else {
            RampShape::Linear
        }
    }

    pub fn to_value(self) -> f32 {
        match self {
            RampShape::Linear => 0.0,
            RampShape::Exponential => 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ramp {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
    shape: RampShape,
}

impl Ramp {
    /// A finished ramp resting at `value`.
    pub fn hold(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            duration: 0.0,
            elapsed: 0.0,
            shape: RampShape::Linear,
        }
    }

    /// Restart the ramp from `from`, heading to `to` over `duration` seconds.
    pub fn start(&mut self, from: f32, to: f32, duration: f32, shape: RampShape) {
        let to = if to.is_finite() { to } else { 0.0 };
        self.from = if from.is_finite() { from } else { to };
        self.to = to;
        self.duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        self.elapsed = 0.0;
        self.shape = shape;
    }

    /// Return the current value, then move `dt` seconds forward.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let value = self.value();
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        value
    }

    /// Current value without advancing.
    pub fn value(&self) -> f32 {
        if self.duration <= 0.0 || self.elapsed >= self.duration {
            return self.to;
        }

        let progress = (self.elapsed / self.duration).clamp(0.0, 1.0);
        match self.shape {
            RampShape::Exponential if self.from > 0.0 && self.to > 0.0 => {
                self.from * (self.to / self.from).powf(progress)
            }
            // Linear, and the explicit fallback for endpoints <= 0
            _ => self.from + (self.to - self.from) * progress,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn target(&self) -> f32 {
        self.to
    }
}

impl Default for Ramp {
    fn default() -> Self {
        Self::hold(1.0)
    }
}
