//! Delay lines and the stereo multitap echo that follows every carrier.

/*
Delay Lines
===========

A delay line is a circular buffer: every sample is written at `write_pos`,
which then advances and wraps. Reading "d samples ago" is a lookup behind the
write head:

    buffer   [ . . . . x . . . . . . . . ]
                       ^               ^
                     read           write_pos
                       <---- d ------->

The buffer is allocated ONCE with a fixed capacity and never grows, so the
maximum delay time is fixed at construction. Longer requests are clamped.

Fractional delays are read with linear interpolation between the two
neighbouring samples, so tap times can change smoothly without snapping to
whole samples.


Multitap Echo
=============

Instead of one read head, a multitap delay reads several positions from the
SAME buffer:

    input ──┬──────────────────────────────── dry ──┐
            │                                        │
            └─► [ buffer ] ─► tap 1 ──┐              ├─► out
              ▲              tap 2 ──┼─► average ── wet
              │              tap 3 ──┘
              │                 │
              └──── Σ feedback ◄┘

Each tap carries its own feedback gain: a share of what it reads is written
back into the buffer together with the new input, which makes every tap
repeat and fade. The summed feedback is scaled so it never exceeds
`MAX_TOTAL_FEEDBACK`, keeping the loop stable whatever the tap settings.

    wet = (tap_1 + tap_2 + ... + tap_n) / n
    out = dry * (1 - mix) + wet * mix

Stereo multitap uses two independent lines (left and right) fed by the same
mono input, with their own tap times. Different tap times on each side give a
wide, bouncing echo from a single carrier.
*/

use crate::{patch::DelayParams, MAX_DELAY_TAPS};

/// Upper bound on the loop gain of all taps together.
const MAX_TOTAL_FEEDBACK: f32 = 0.95;

pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Allocate a line able to delay by up to `capacity - 1` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(2)],
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Largest delay `read` can honour, in samples.
    pub fn max_delay(&self) -> f32 {
        (self.buffer.len() - 1) as f32
    }

    /// Push one sample and advance the write head.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Sample written `delay` samples ago (1.0 is the most recent write).
    ///
    /// Fractional delays interpolate linearly. Delays are clamped to
    /// `[1, max_delay]`.
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        let delay = if delay.is_finite() {
            delay.clamp(1.0, self.max_delay())
        } else {
            1.0
        };

        let whole = delay.floor();
        let frac = delay - whole;
        let whole = whole as usize;

        let newer = self.buffer[(self.write_pos + len - whole) % len];
        if frac == 0.0 {
            return newer;
        }
        let older = self.buffer[(self.write_pos + len - (whole + 1).min(len - 1)) % len];
        newer + (older - newer) * frac
    }

    /// Write `sample`, returning what was written `delay` samples earlier.
    pub fn next_sample(&mut self, sample: f32, delay: f32) -> f32 {
        let delayed = self.read(delay);
        self.write(sample);
        delayed
    }

    pub fn render(&mut self, buffer: &mut [f32], delay: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, delay);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Tap {
    delay_samples: f32,
    feedback: f32,
}

/// Several read heads over one delay line, with per-tap feedback.
pub struct MultiTapDelay {
    line: DelayLine,
    taps: [Tap; MAX_DELAY_TAPS],
    tap_count: usize,
    feedback_scale: f32,
}

impl MultiTapDelay {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            line: DelayLine::with_capacity(capacity),
            taps: [Tap::default(); MAX_DELAY_TAPS],
            tap_count: 0,
            feedback_scale: 1.0,
        }
    }

    /// Configure the taps from `(seconds, feedback)` pairs.
    ///
    /// At most `MAX_DELAY_TAPS` taps are used. Times are clamped to the line's
    /// memory, feedback to `[0, MAX_TOTAL_FEEDBACK]`.
    pub fn set_taps(&mut self, taps: impl IntoIterator<Item = (f32, f32)>, sample_rate: f32) {
        let max_delay = self.line.max_delay();
        let mut count = 0;
        for (time, feedback) in taps.into_iter().take(MAX_DELAY_TAPS) {
            let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
            let feedback = if feedback.is_finite() {
                feedback.clamp(0.0, MAX_TOTAL_FEEDBACK)
            } else {
                0.0
            };
            self.taps[count] = Tap {
                delay_samples: (time * sample_rate).clamp(1.0, max_delay),
                feedback,
            };
            count += 1;
        }
        self.tap_count = count;

        let total: f32 = self.taps[..count].iter().map(|tap| tap.feedback).sum();
        self.feedback_scale = if total > MAX_TOTAL_FEEDBACK {
            MAX_TOTAL_FEEDBACK / total
        } else {
            1.0
        };
    }

    pub fn tap_count(&self) -> usize {
        self.tap_count
    }

    /// Process one sample, returning the wet signal only (average of all taps).
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if self.tap_count == 0 {
            self.line.write(input);
            return 0.0;
        }

        let mut wet = 0.0;
        let mut feedback = 0.0;
        for tap in &self.taps[..self.tap_count] {
            let delayed = self.line.read(tap.delay_samples);
            wet += delayed;
            feedback += delayed * tap.feedback;
        }
        self.line.write(input + feedback * self.feedback_scale);
        wet / self.tap_count as f32
    }

    pub fn reset(&mut self) {
        self.line.reset();
    }
}

/// Two multitap lines sharing one mono input, mixed against the dry signal.
pub struct StereoMultiTapDelay {
    left: MultiTapDelay,
    right: MultiTapDelay,
    mix: f32,
}

impl StereoMultiTapDelay {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            left: MultiTapDelay::with_capacity(capacity),
            right: MultiTapDelay::with_capacity(capacity),
            mix: 0.0,
        }
    }

    /// Apply tap times, feedbacks and wet/dry mix. Safe to call while running.
    pub fn set_params(&mut self, params: &DelayParams, sample_rate: f32) {
        let taps = params.taps.min(MAX_DELAY_TAPS);
        self.left.set_taps(
            params.left[..taps].iter().map(|tap| (tap.time, tap.feedback)),
            sample_rate,
        );
        self.right.set_taps(
            params.right[..taps].iter().map(|tap| (tap.time, tap.feedback)),
            sample_rate,
        );
        self.mix = if params.mix.is_finite() {
            params.mix.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Process one mono sample into a (left, right) pair.
    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        let wet_l = self.left.process(input);
        let wet_r = self.right.process(input);
        let dry = input * (1.0 - self.mix);
        (dry + wet_l * self.mix, dry + wet_r * self.mix)
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
