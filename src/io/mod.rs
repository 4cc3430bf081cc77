// Purpose - external interfaces, format conversions

pub mod converter;
pub mod midi;

use crate::OUTPUT_CHANNELS;

/// Fold interleaved 8-channel frames onto a device with `device_channels`.
///
/// Devices with at least eight channels get the frame unchanged (extra
/// channels are silent). Smaller layouts sum input channel `k` into output
/// channel `k % device_channels`, scaled to keep the summed power: on a stereo
/// device every carrier's left side lands left and right side lands right.
pub fn fold_channels(frames: &[f32], out: &mut [f32], device_channels: usize) {
    if device_channels == 0 {
        return;
    }
    out.fill(0.0);

    let gain = if device_channels >= OUTPUT_CHANNELS {
        1.0
    } else {
        (device_channels as f32 / OUTPUT_CHANNELS as f32).sqrt()
    };

    for (input, output) in frames
        .chunks_exact(OUTPUT_CHANNELS)
        .zip(out.chunks_exact_mut(device_channels))
    {
        for (channel, &sample) in input.iter().enumerate() {
            output[channel % device_channels] += sample * gain;
        }
    }
}
