//! Linear ADSR envelope, advanced per sample.
//!
//! Every operator carries two: one on amplitude, one on frequency. The
//! level is a function of the current stage and the seconds spent in it,
//! so `advance(dt)` is the only clock.
//!
//! ```text
//!  1.0 ┐   /\
//!      │  /  \______
//!    S │ /          \
//!  0.0 └/────────────\──
//!       A  D    S     R
//! ```
//!
//! A `note_on` while sounding ramps up from the current level, and
//! `note_off` releases from wherever the level is, so neither jumps.
//! Sustain is live (aftertouch moves it) and glides to a new target over
//! a few milliseconds. A zero-length stage hands its leftover time to the
//! next one within the same `advance`.

use crate::patch::EnvelopeParams;

/// Time to glide across the full range when the sustain level changes live.
const SUSTAIN_GLIDE_TIME: f32 = 0.005;

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,    // Gate low, envelope inactive, level = 0
    Attack,  // Gate just went high, ramping up to 1.0
    Decay,   // Reached peak, ramping down to sustain level
    Sustain, // Holding at sustain level while gate is high
    Release, // Gate went low, ramping down to 0
}

#[derive(Debug, Clone)]
pub struct Envelope {
    // ADSR parameters
    attack_time: f32,   // seconds to ramp start level → 1
    decay_time: f32,    // seconds to ramp 1 → sustain
    sustain_level: f32, // level to hold (0.0 - 1.0)
    release_time: f32,  // seconds to ramp current → 0

    // Runtime state
    stage: EnvelopeState,
    level: f32,
    elapsed: f32, // seconds spent in the current stage

    // Levels snapshotted at the transitions that start from "wherever we are"
    attack_start_level: f32,
    release_start_level: f32,
}

impl Envelope {
    pub fn new() -> Self {
        Self::adsr(0.01, 0.1, 0.7, 0.3)
    }

    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        let mut env = Self {
            attack_time: 0.0,
            decay_time: 0.0,
            sustain_level: 0.0,
            release_time: 0.0,

            stage: EnvelopeState::Idle,
            level: 0.0,
            elapsed: 0.0,
            attack_start_level: 0.0,
            release_start_level: 0.0,
        };
        env.set_adsr(attack, decay, sustain, release);
        env
    }

    pub fn from_params(params: &EnvelopeParams) -> Self {
        Self::adsr(params.attack, params.decay, params.sustain, params.release)
    }

    /// Update the shape. Takes effect immediately, including mid-stage.
    pub fn set_adsr(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.attack_time = non_negative(attack);
        self.decay_time = non_negative(decay);
        self.sustain_level = if sustain.is_finite() {
            sustain.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.release_time = non_negative(release);
    }

    pub fn set_params(&mut self, params: &EnvelopeParams) {
        self.set_adsr(params.attack, params.decay, params.sustain, params.release);
    }

    /// Gate high: (re)start the attack phase from the current level.
    pub fn note_on(&mut self) {
        self.attack_start_level = self.level;
        self.elapsed = 0.0;
        self.stage = EnvelopeState::Attack;
    }

    /// Gate low: start the release phase from the current level.
    pub fn note_off(&mut self) {
        if self.stage == EnvelopeState::Idle {
            return;
        }
        self.release_start_level = self.level;
        self.elapsed = 0.0;
        self.stage = EnvelopeState::Release;
    }

    /// Move `dt` seconds forward and return the new level.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let mut remaining = dt.max(0.0);

        loop {
            match self.stage {
                EnvelopeState::Idle => {
                    self.level = 0.0;
                    break;
                }

                EnvelopeState::Attack => {
                    self.elapsed += remaining;
                    if self.elapsed >= self.attack_time {
                        remaining = self.elapsed - self.attack_time;
                        self.level = 1.0;
                        self.enter(EnvelopeState::Decay);
                        continue;
                    }
                    let progress = self.elapsed / self.attack_time;
                    self.level = lerp(self.attack_start_level, 1.0, progress);
                    break;
                }

                EnvelopeState::Decay => {
                    self.elapsed += remaining;
                    if self.elapsed >= self.decay_time {
                        remaining = self.elapsed - self.decay_time;
                        self.level = self.sustain_level;
                        self.enter(EnvelopeState::Sustain);
                        continue;
                    }
                    let progress = self.elapsed / self.decay_time;
                    self.level = lerp(1.0, self.sustain_level, progress);
                    break;
                }

                EnvelopeState::Sustain => {
                    // Glide towards a sustain level that changed while holding
                    let step = remaining / SUSTAIN_GLIDE_TIME;
                    let delta = self.sustain_level - self.level;
                    self.level += delta.clamp(-step, step);
                    break;
                }

                EnvelopeState::Release => {
                    self.elapsed += remaining;
                    if self.elapsed >= self.release_time {
                        self.level = 0.0;
                        self.enter(EnvelopeState::Idle);
                        break;
                    }
                    let progress = self.elapsed / self.release_time;
                    self.level = lerp(self.release_start_level, 0.0, progress);
                    break;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Render a block of envelope values, one per sample.
    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        let dt = 1.0 / sample_rate;
        for sample in buffer.iter_mut() {
            *sample = self.advance(dt);
        }
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeState::Idle
    }

    /// Reset to idle state.
    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
        self.elapsed = 0.0;
        self.attack_start_level = 0.0;
        self.release_start_level = 0.0;
    }

    /// Get the current envelope level (0.0 to 1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Get the current envelope stage
    pub fn state(&self) -> EnvelopeState {
        self.stage
    }

    fn enter(&mut self, stage: EnvelopeState) {
        self.stage = stage;
        self.elapsed = 0.0;
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn lerp(from: f32, to: f32, t: f32) -> f32 {
    (from + (to - from) * t.clamp(0.0, 1.0)).clamp(0.0, 1.0)
}

#[inline]
fn non_negative(seconds: f32) -> f32 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;
    const DT: f32 = 1.0 / SAMPLE_RATE;

    fn render_samples(env: &mut Envelope, samples: usize) -> f32 {
        let mut max_step = 0.0f32;
        let mut previous = env.level();
        for _ in 0..samples {
            let level = env.advance(DT);
            max_step = max_step.max((level - previous).abs());
            previous = level;
        }
        max_step
    }

    #[test]
    fn attack_reaches_full_level() {
        let mut env = Envelope::adsr(0.01, 0.1, 0.7, 0.2);

        env.note_on();
        render_samples(&mut env, (0.01 * SAMPLE_RATE) as usize + 1);

        assert!(env.level() > 0.99, "expected attack to reach full level");
        assert!(!matches!(env.state(), EnvelopeState::Attack));
    }

    #[test]
    fn sustain_holds_target_level() {
        let sustain = 0.6;
        let mut env = Envelope::adsr(0.01, 0.05, sustain, 0.2);

        env.note_on();
        let attack_decay_samples = ((0.01 + 0.05) * SAMPLE_RATE) as usize + 5;
        render_samples(&mut env, attack_decay_samples);

        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((env.level() - sustain).abs() < 1e-4, "sustain level should be held");

        // No automatic transition out of sustain
        render_samples(&mut env, 5_000);
        assert_eq!(env.state(), EnvelopeState::Sustain);
    }

    #[test]
    fn release_falls_back_to_idle() {
        let release = 0.03;
        let mut env = Envelope::adsr(0.01, 0.05, 0.5, release);

        env.note_on();
        render_samples(&mut env, (0.02 * SAMPLE_RATE) as usize);

        env.note_off();
        render_samples(&mut env, (release * SAMPLE_RATE) as usize + 2);

        assert!(env.level() <= 0.001, "release should fall back to zero");
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn early_release_starts_from_current_level() {
        let mut env = Envelope::adsr(0.1, 0.1, 0.8, 0.1);
        env.note_on();
        render_samples(&mut env, 20); // 20% into the attack
        let before = env.level();
        assert!(before < 0.3);

        env.note_off();
        let after = env.advance(DT);
        assert!(after <= before, "release must not jump up to sustain");
        assert!((before - after) < 0.05);
    }

    #[test]
    fn retrigger_mid_release_is_continuous() {
        let mut env = Envelope::adsr(0.02, 0.05, 0.6, 0.2);
        env.note_on();
        render_samples(&mut env, 100);
        env.note_off();
        render_samples(&mut env, 50);
        let before = env.level();
        assert!(before > 0.1);

        env.note_on();
        let after = env.advance(DT);
        assert!(
            (after - before).abs() < 0.05,
            "retrigger jumped from {before} to {after}"
        );
        assert_eq!(env.state(), EnvelopeState::Attack);
    }

    #[test]
    fn output_is_continuous_across_every_transition() {
        // Largest legal per-sample move is 1 / (shortest stage in samples)
        let mut env = Envelope::adsr(0.02, 0.03, 0.4, 0.05);
        let epsilon = 1.0 / (0.02 * SAMPLE_RATE) + 1e-4;

        env.note_on();
        assert!(render_samples(&mut env, 10) <= epsilon);
        // Retrigger during attack
        env.note_on();
        assert!(render_samples(&mut env, 40) <= epsilon);
        // Release during decay
        env.note_off();
        assert!(render_samples(&mut env, 20) <= epsilon);
        // Retrigger during release, run through to sustain, release to idle
        env.note_on();
        assert!(render_samples(&mut env, 100) <= epsilon);
        env.note_off();
        assert!(render_samples(&mut env, 100) <= epsilon);
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn zero_length_stages_do_not_stick() {
        let mut env = Envelope::adsr(0.0, 0.0, 0.5, 0.0);
        env.note_on();
        let level = env.advance(DT);
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((level - 0.5).abs() < 1e-6);

        env.note_off();
        assert_eq!(env.advance(DT), 0.0);
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn sustain_change_glides() {
        let mut env = Envelope::adsr(0.0, 0.0, 1.0, 0.1);
        env.note_on();
        env.advance(DT);
        env.set_adsr(0.0, 0.0, 0.0, 0.1);
        let level = env.advance(DT);
        assert!(level > 0.7, "sustain change must not jump, got {level}");
        render_samples(&mut env, 10);
        assert!(env.level() < 1e-6);
    }

    #[test]
    fn note_off_while_idle_is_ignored() {
        let mut env = Envelope::new();
        env.note_off();
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert_eq!(env.advance(DT), 0.0);
    }
}
