//! Wave tables for the operators' phase-driven oscillators.

/*
Table Lookup Oscillators
========================

An operator owns only a phase (radians, wrapped to [0, 2π)). The waveform is
looked up in a pre-computed single-cycle table with linear interpolation, so
the per-sample cost is one multiply, two loads and a lerp, independent of the
waveform.

Tables are built ONCE at startup from a sum of sine partials (additive
synthesis), never at render time:

    sine      partial 1 only
    triangle  odd partials,  amplitude 1/n², alternating sign
    saw       all partials,  amplitude 1/n
    square    odd partials,  amplitude 1/n

Truncating the series at a fixed number of partials keeps the non-sine tables
band-limited for low and mid fundamentals. Every table is normalized to a
peak of 1.0.

The table has one guard sample at the end (a copy of index 0) so
interpolation never needs a wrap-around branch.
*/

use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Samples per table cycle.
pub const TABLE_SIZE: usize = 8192;
/// Partials summed for the non-sine tables.
const PARTIALS: usize = 32;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OscillatorWaveform {
    #[default]
    Sine,
    Triangle,
    Saw,
    Square,
}

impl OscillatorWaveform {
    /// Map a flat parameter value (0, 1, 2, 3) onto a waveform.
    pub fn from_value(value: f32) -> Self {
        match value.round() as i32 {
            1 => OscillatorWaveform::Triangle,
            2 => OscillatorWaveform::Saw,
            3 => OscillatorWaveform::Square,
            _ => OscillatorWaveform::Sine,
        }
    }

    pub fn to_value(self) -> f32 {
        match self {
            OscillatorWaveform::Sine => 0.0,
            OscillatorWaveform::Triangle => 1.0,
            OscillatorWaveform::Saw => 2.0,
            OscillatorWaveform::Square => 3.0,
        }
    }
}

/// One single-cycle table per waveform, shared by every operator of every voice.
pub struct WaveTables {
    sine: Box<[f32]>,
    triangle: Box<[f32]>,
    saw: Box<[f32]>,
    square: Box<[f32]>,
}

impl WaveTables {
    pub fn new() -> Self {
        Self {
            sine: build_table(|n| if n == 1 { 1.0 } else { 0.0 }),
            triangle: build_table(|n| {
                if n % 2 == 0 {
                    0.0
                } else {
                    let sign = if (n / 2) % 2 == 0 { 1.0 } else { -1.0 };
                    sign / (n * n) as f32
                }
            }),
            saw: build_table(|n| {
                let sign = if n % 2 == 1 { 1.0 } else { -1.0 };
                sign / n as f32
            }),
            square: build_table(|n| if n % 2 == 1 { 1.0 / n as f32 } else { 0.0 }),
        }
    }

    /// Interpolated lookup. `phase` is in radians within [0, 2π).
    #[inline]
    pub fn lookup(&self, waveform: OscillatorWaveform, phase: f32) -> f32 {
        let table = match waveform {
            OscillatorWaveform::Sine => &self.sine,
            OscillatorWaveform::Triangle => &self.triangle,
            OscillatorWaveform::Saw => &self.saw,
            OscillatorWaveform::Square => &self.square,
        };

        let position = (phase * (TABLE_SIZE as f32 / TAU)).clamp(0.0, TABLE_SIZE as f32);
        let index = (position as usize).min(TABLE_SIZE - 1);
        let frac = position - index as f32;
        let a = table[index];
        let b = table[index + 1];
        a + (b - a) * frac
    }
}

impl Default for WaveTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Sum `PARTIALS` sine partials with the given amplitudes, normalized to a peak of 1.0.
fn build_table(amplitude: impl Fn(usize) -> f32) -> Box<[f32]> {
    let mut table = vec![0.0f32; TABLE_SIZE + 1];
    for n in 1..=PARTIALS {
        let amp = amplitude(n);
        if amp == 0.0 {
            continue;
        }
        for (i, sample) in table.iter_mut().take(TABLE_SIZE).enumerate() {
            let phase = TAU * i as f32 / TABLE_SIZE as f32;
            *sample += amp * (phase * n as f32).sin();
        }
    }

    let peak = table.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 0.0 {
        for sample in table.iter_mut() {
            *sample /= peak;
        }
    }
    table[TABLE_SIZE] = table[0];
    table.into_boxed_slice()
}

/// Wrap a phase into [0, 2π).
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_table_matches_sin() {
        let tables = WaveTables::new();
        for i in 0..1000 {
            let phase = TAU * i as f32 / 1000.0;
            let expected = phase.sin();
            let actual = tables.lookup(OscillatorWaveform::Sine, wrap_phase(phase));
            assert!(
                (actual - expected).abs() < 1e-4,
                "phase {phase}: expected {expected}, got {actual}"
            );
        }
    }

    #[test]
    fn tables_are_normalized() {
        let tables = WaveTables::new();
        for waveform in [
            OscillatorWaveform::Sine,
            OscillatorWaveform::Triangle,
            OscillatorWaveform::Saw,
            OscillatorWaveform::Square,
        ] {
            let peak = (0..TABLE_SIZE)
                .map(|i| tables.lookup(waveform, TAU * i as f32 / TABLE_SIZE as f32).abs())
                .fold(0.0f32, f32::max);
            assert!((peak - 1.0).abs() < 1e-3, "{waveform:?} peak {peak}");
        }
    }

    #[test]
    fn phase_wraps_into_range() {
        assert!((wrap_phase(TAU + 0.5) - 0.5).abs() < 1e-5);
        assert!((wrap_phase(-0.5) - (TAU - 0.5)).abs() < 1e-5);
        let p = wrap_phase(-1e-9);
        assert!((0.0..TAU).contains(&p));
    }

    #[test]
    fn waveform_parameter_roundtrip() {
        for waveform in [
            OscillatorWaveform::Sine,
            OscillatorWaveform::Triangle,
            OscillatorWaveform::Saw,
            OscillatorWaveform::Square,
        ] {
            assert_eq!(OscillatorWaveform::from_value(waveform.to_value()), waveform);
        }
    }
}
