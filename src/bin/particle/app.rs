//! Player - wires the engine to a cpal output stream

use std::{thread, time::Duration};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use particle_synth::{
    io::{converter::MidiConverter, fold_channels, midi::MidiEvent},
    EngineConfig, Patch, PlayMode, PolySynth, OUTPUT_CHANNELS,
};

const BLOCK_SIZE: usize = 256;

pub struct Player {
    play_mode: PlayMode,
    tail_ms: u64,
}

impl Player {
    pub fn new(play_mode: PlayMode) -> Self {
        Self {
            play_mode,
            tail_ms: 2000,
        }
    }

    /// How long to keep the stream open after the last event.
    pub fn tail_ms(mut self, tail_ms: u64) -> Self {
        self.tail_ms = tail_ms;
        self
    }

    /// Play `(delay_ms, event)` pairs in order, then let the tails ring out.
    pub fn play(self, phrase: &[(u64, MidiEvent)]) -> EyreResult<()> {
        // Set up audio
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let stream_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;
        log::info!(
            "Output device: {} ({} Hz, {} channels)",
            device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate,
            channels
        );

        let config = EngineConfig {
            sample_rate,
            block_size: BLOCK_SIZE,
            play_mode: self.play_mode,
            ..EngineConfig::default()
        };
        let (mut synth, mut handle) =
            PolySynth::new(config, Patch::default()).wrap_err("failed to build engine")?;

        // The synth moves into the callback; only the handle stays here
        let mut frames = vec![0.0f32; BLOCK_SIZE * OUTPUT_CHANNELS];
        let stream = device.build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _| {
                for chunk in data.chunks_mut(BLOCK_SIZE * channels) {
                    let frame_count = chunk.len() / channels;
                    let block = &mut frames[..frame_count * OUTPUT_CHANNELS];
                    synth.render_block(block);
                    fold_channels(block, chunk, channels);
                }
            },
            |err| log::error!("Audio error: {err}"),
            None,
        )?;
        stream.play()?;

        let mut converter = MidiConverter::default();
        for (delay_ms, event) in phrase {
            thread::sleep(Duration::from_millis(*delay_ms));
            for message in converter.convert(*event) {
                log::debug!("{message:?}");
                handle.send(message)?;
            }
        }

        thread::sleep(Duration::from_millis(self.tail_ms));
        Ok(())
    }
}
