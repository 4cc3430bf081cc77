//! One FM operator: phase generator, envelopes, ramps and a feedback tap.

/*
FM Operators
============

An operator is a table oscillator whose frequency is pushed around by other
operators (frequency modulation). Each sample:

  1. modulation  fm = index * modulation_gain * Σ parents + feedback * previous
  2. frequency   f  = (ratio * f0 + offset)
                      * (1 + fm)
                      * freq_ramp
                      * (1 + freq_env_depth * freq_env)
                      clamped to [MIN_FREQUENCY, nyquist]
  3. output      y  = table(phase) * amp_env * amp_ramp * level
  4. phase      += 2π * f / sample_rate     (wrapped into [0, 2π))

`previous` is the operator's OWN output from the previous sample. The
feedback path reads that register before the current sample is computed and
only writes it afterwards, so an operator never depends on its own current
output. That one-sample delay is what turns the self-loop into something that
can be evaluated in order.

An operator with no parents and zero feedback has fm = 0 and is a plain
free-running oscillator.


Trigger Delay
-------------

Each operator may start late: `trigger_delay` seconds after the voice gate
opens, its envelopes open. The gate closing is postponed by the same amount,
so a late operator also releases late and keeps its full sustain time.

    voice gate   ──┐██████████████████┌──────
    operator       ──────┐██████████████████┌──
                   |<--->|            |<--->|
                    delay               delay

While the start is pending the operator does not count as idle, even though
its envelope has not moved yet. Otherwise a voice whose operators all start
late would be reclaimed before making a sound.


Retriggering
------------

A new note on a voice that is still sounding restarts the envelopes from
their CURRENT level (see `dsp/envelope.rs`) and keeps the running phase, so
a stolen voice changes pitch without a click. The phase is only reset to the
configured offset when the operator was fully idle.

Ramps restart according to the configured `RampRetrigger` policy: from their
configured start value, or from wherever they are now.
*/

use std::f32::consts::TAU;

use crate::{
    config::RampRetrigger,
    dsp::{
        envelope::{Envelope, EnvelopeState},
        oscillator::{wrap_phase, WaveTables},
        ramp::Ramp,
    },
    patch::{OperatorParam, OperatorParams, RampParams},
    MIN_FREQUENCY,
};

/// Per-sample values shared by all operators of a voice.
#[derive(Debug, Clone, Copy)]
pub struct OperatorFrame {
    /// Voice fundamental in Hz.
    pub fundamental: f32,
    /// Global scale on every modulation index.
    pub modulation_gain: f32,
    /// Seconds per sample.
    pub dt: f32,
    pub nyquist: f32,
}

pub struct Operator {
    params: OperatorParams,
    ramp_retrigger: RampRetrigger,
    phase: f32,
    /// Output of the previous sample, read by the feedback path.
    previous: f32,
    amp_env: Envelope,
    freq_env: Envelope,
    amp_ramp: Ramp,
    freq_ramp: Ramp,
    pending_on: Option<f32>,
    pending_off: Option<f32>,
}

impl Operator {
    pub fn new(params: OperatorParams, ramp_retrigger: RampRetrigger) -> Self {
        Self {
            params,
            ramp_retrigger,
            phase: wrap_phase(params.phase * TAU),
            previous: 0.0,
            amp_env: Envelope::from_params(&params.amp_env),
            freq_env: Envelope::from_params(&params.freq_env),
            amp_ramp: Ramp::hold(params.amp_ramp.start),
            freq_ramp: Ramp::hold(params.freq_ramp.start),
            pending_on: None,
            pending_off: None,
        }
    }

    pub fn params(&self) -> &OperatorParams {
        &self.params
    }

    /// Replace every parameter. Envelopes pick up the change immediately,
    /// ramps at the next trigger.
    pub fn set_params(&mut self, params: &OperatorParams) {
        self.params = *params;
        self.amp_env.set_params(&self.params.amp_env);
        self.freq_env.set_params(&self.params.freq_env);
    }

    /// Update a single parameter, clamped to its range.
    pub fn set_param(&mut self, param: OperatorParam, value: f32) {
        self.params.set(param, value);
        self.amp_env.set_params(&self.params.amp_env);
        self.freq_env.set_params(&self.params.freq_env);
    }

    /// Gate on, after the configured trigger delay.
    pub fn trigger(&mut self) {
        if self.is_idle() {
            self.phase = wrap_phase(self.params.phase * TAU);
            self.previous = 0.0;
        }

        self.pending_off = None;
        let delay = self.params.trigger_delay;
        if delay > 0.0 {
            self.pending_on = Some(delay);
        } else {
            self.pending_on = None;
            self.open_gate();
        }
    }

    /// Gate off, after the configured trigger delay.
    pub fn release(&mut self) {
        let delay = self.params.trigger_delay;
        // Never close before a pending open, or the note would hang
        let delay = match self.pending_on {
            Some(remaining) => delay.max(remaining),
            None => delay,
        };
        if delay > 0.0 {
            self.pending_off = Some(delay);
        } else {
            self.close_gate();
        }
    }

    /// Silence immediately, dropping any pending gate changes.
    pub fn reset(&mut self) {
        self.amp_env.reset();
        self.freq_env.reset();
        self.pending_on = None;
        self.pending_off = None;
        self.previous = 0.0;
        self.phase = wrap_phase(self.params.phase * TAU);
    }

    /// Compute one sample from the summed parent outputs.
    #[inline]
    pub fn tick(&mut self, modulation: f32, frame: &OperatorFrame, tables: &WaveTables) -> f32 {
        self.advance_pending(frame.dt);

        if self.is_idle() {
            self.previous = 0.0;
            return 0.0;
        }

        let params = &self.params;
        let fm = params.index * frame.modulation_gain * modulation + params.feedback * self.previous;

        let freq_env = self.freq_env.advance(frame.dt);
        let amp_env = self.amp_env.advance(frame.dt);
        let freq_ramp = self.freq_ramp.advance(frame.dt);
        let amp_ramp = self.amp_ramp.advance(frame.dt);

        let base = params.ratio * frame.fundamental + params.offset;
        let frequency = base * (1.0 + fm) * freq_ramp * (1.0 + params.freq_env_depth * freq_env);
        let frequency = if frequency.is_finite() {
            frequency.clamp(MIN_FREQUENCY, frame.nyquist.max(MIN_FREQUENCY))
        } else {
            MIN_FREQUENCY
        };

        let out = tables.lookup(params.waveform, self.phase) * amp_env * amp_ramp * params.level;

        self.phase = wrap_phase(self.phase + TAU * frequency * frame.dt);
        self.previous = out;
        out
    }

    /// No envelope running and no start pending.
    pub fn is_idle(&self) -> bool {
        !self.amp_env.is_active() && self.pending_on.is_none()
    }

    /// Gate open and amplitude envelope resting in sustain.
    pub fn is_settled(&self) -> bool {
        self.pending_on.is_none()
            && self.pending_off.is_none()
            && self.amp_env.state() == EnvelopeState::Sustain
    }

    pub fn amp_level(&self) -> f32 {
        self.amp_env.level()
    }

    pub fn amp_stage(&self) -> EnvelopeState {
        self.amp_env.state()
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    fn advance_pending(&mut self, dt: f32) {
        if let Some(remaining) = self.pending_on {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                self.pending_on = None;
                self.open_gate();
            } else {
                self.pending_on = Some(remaining);
            }
        }

        if let Some(remaining) = self.pending_off {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                self.pending_off = None;
                self.close_gate();
            } else {
                self.pending_off = Some(remaining);
            }
        }
    }

    fn open_gate(&mut self) {
        let from_current =
            self.ramp_retrigger == RampRetrigger::FromCurrent && self.amp_env.is_active();
        restart_ramp(&mut self.freq_ramp, &self.params.freq_ramp, from_current);
        restart_ramp(&mut self.amp_ramp, &self.params.amp_ramp, from_current);

        self.amp_env.note_on();
        self.freq_env.note_on();
    }

    fn close_gate(&mut self) {
        self.amp_env.note_off();
        self.freq_env.note_off();
    }
}

fn restart_ramp(ramp: &mut Ramp, params: &RampParams, from_current: bool) {
    let from = if from_current {
        ramp.value()
    } else {
        params.start
    };
    ramp.start(from, params.end, params.time, params.shape);
}
