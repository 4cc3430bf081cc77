//! Carrier output chain: stereo multitap delay, then auto-panner.

use crate::{
    dsp::{delay::StereoMultiTapDelay, pan::AutoPanner},
    patch::OperatorParams,
};

/// Turns one carrier's mono output into a moving stereo pair.
pub struct CarrierSpatial {
    delay: StereoMultiTapDelay,
    panner: AutoPanner,
    sample_rate: f32,
}

impl CarrierSpatial {
    /// `delay_capacity` is the length of each delay line in samples.
    pub fn new(params: &OperatorParams, sample_rate: f32, delay_capacity: usize) -> Self {
        let mut delay = StereoMultiTapDelay::with_capacity(delay_capacity);
        delay.set_params(&params.delay, sample_rate);
        Self {
            delay,
            panner: AutoPanner::new(&params.pan),
            sample_rate,
        }
    }

    pub fn set_params(&mut self, params: &OperatorParams) {
        self.delay.set_params(&params.delay, self.sample_rate);
        self.panner.set_params(&params.pan);
    }

    #[inline]
    pub fn process(&mut self, input: f32, dt: f32) -> (f32, f32) {
        let (left, right) = self.delay.process(input);
        self.panner.process_stereo(left, right, dt)
    }

    /// Clear echoes and restart the pan sweep.
    pub fn reset(&mut self) {
        self.delay.reset();
        self.panner.reset();
    }
}
