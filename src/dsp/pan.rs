//! LFO-driven stereo panning.

/*
Equal-Power Panning
===================

Panning splits one signal between two speakers. A naive linear split
(left = 1 - pos, right = pos) dips in loudness at the centre, because
perceived loudness follows power (amplitude squared), and 0.5² + 0.5² = 0.5.

Equal-power panning walks a quarter circle instead:

    angle = pos * π/2                 pos in [0, 1], 0 = hard left
    left  = cos(angle)
    right = sin(angle)                left² + right² = 1 everywhere

Here both gains are also scaled by √2 so a centred signal (pos = 0.5) passes
through at unity on BOTH sides. A mono source that used to sit in the middle
keeps its level when it is swept.

    gain
    √2 ┤ L╲               ╱R
     1 ┤    ╲ ─ ─ ─ ─ ─ ╱     (both 1.0 at centre)
       │      ╲       ╱
     0 ┤────────╲───╱──────
       └────────┴─┴─┴──────→ pos
       0       0.5        1


Auto-Pan
--------

The position is not static: an LFO sweeps it around a centre point.

    pos = clamp(center + 0.5 * depth * lfo, 0, 1)

With depth 1 and centre 0.5 the sweep covers the full field, hard left to
hard right, once per LFO period. Depth 0 is a static pan at `center`.
*/

use std::f32::consts::{FRAC_PI_2, SQRT_2};

use super::lfo::Lfo;
use crate::patch::PanParams;

pub struct AutoPanner {
    lfo: Lfo,
    center: f32,
    depth: f32,
}

impl AutoPanner {
    pub fn new(params: &PanParams) -> Self {
        let mut panner = Self {
            lfo: Lfo::default(),
            center: 0.5,
            depth: 0.0,
        };
        panner.set_params(params);
        panner
    }

    pub fn set_params(&mut self, params: &PanParams) {
        self.lfo.set_rate(params.rate);
        self.center = sanitize_unit(params.center, 0.5);
        self.depth = sanitize_unit(params.depth, 0.0);
    }

    /// Pan one mono sample into a (left, right) pair and advance the LFO.
    #[inline]
    pub fn process(&mut self, input: f32, dt: f32) -> (f32, f32) {
        let (gain_l, gain_r) = self.next_gains(dt);
        (input * gain_l, input * gain_r)
    }

    /// Pan a stereo pair: each side is scaled by its gain.
    #[inline]
    pub fn process_stereo(&mut self, left: f32, right: f32, dt: f32) -> (f32, f32) {
        let (gain_l, gain_r) = self.next_gains(dt);
        (left * gain_l, right * gain_r)
    }

    #[inline]
    fn next_gains(&mut self, dt: f32) -> (f32, f32) {
        let lfo = self.lfo.next(dt);
        let position = (self.center + 0.5 * self.depth * lfo).clamp(0.0, 1.0);
        pan_gains(position)
    }

    pub fn reset(&mut self) {
        self.lfo.reset();
    }
}

/// Equal-power gains for `position` in [0, 1], unity on both sides at 0.5.
#[inline]
pub fn pan_gains(position: f32) -> (f32, f32) {
    let angle = position.clamp(0.0, 1.0) * FRAC_PI_2;
    (angle.cos() * SQRT_2, angle.sin() * SQRT_2)
}

fn sanitize_unit(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_is_unity_on_both_sides() {
        let (l, r) = pan_gains(0.5);
        assert!((l - 1.0).abs() < 1e-5);
        assert!((r - 1.0).abs() < 1e-5);
    }

    #[test]
    fn power_is_constant_across_the_field() {
        for i in 0..=10 {
            let (l, r) = pan_gains(i as f32 / 10.0);
            assert!((l * l + r * r - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn hard_left_silences_right() {
        let (l, r) = pan_gains(0.0);
        assert!(r.abs() < 1e-6);
        assert!((l - SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn zero_depth_is_static() {
        let params = PanParams {
            center: 0.5,
            rate: 5.0,
            depth: 0.0,
        };
        let mut panner = AutoPanner::new(&params);
        for _ in 0..1000 {
            let (l, r) = panner.process(1.0, 1.0 / 1000.0);
            assert!((l - 1.0).abs() < 1e-5 && (r - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn full_depth_sweeps_both_sides() {
        let params = PanParams {
            center: 0.5,
            rate: 1.0,
            depth: 1.0,
        };
        let mut panner = AutoPanner::new(&params);
        let mut min_r = f32::MAX;
        let mut min_l = f32::MAX;
        for _ in 0..1000 {
            let (l, r) = panner.process(1.0, 1.0 / 1000.0);
            min_l = min_l.min(l);
            min_r = min_r.min(r);
        }
        assert!(min_l < 0.01, "never reached hard right: {min_l}");
        assert!(min_r < 0.01, "never reached hard left: {min_r}");
    }
}
