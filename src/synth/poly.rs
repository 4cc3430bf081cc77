//! The render loop: event handoff, voice rendering, mixing and reclamation.

/*
One Block
=========

    control thread                          audio thread
    ──────────────                          ────────────
    SynthHandle::note_on() ──┐
    SynthHandle::set_param() ┼─► [ rtrb ring ] ─► render_block():
                             ┘                      1. drain events, in order
                                                    2. render every bound voice
                                                       (each ADDS into `out`)
                                                    3. master gain
                                                    4. free silent voices

Events are applied only at the start of a block, so a parameter change is
visible in `patch()` after the next block boundary and never mid-block.

Reclamation runs after rendering, so a voice's final decayed samples are
still heard in the block where it goes silent.

Nothing in `render_block` allocates, locks or logs. The ring buffer, the
voice pool and every delay line were sized when the engine was built.
*/

use rtrb::{Consumer, RingBuffer};

use crate::{
    config::EngineConfig,
    error::Error,
    graph::{node::GraphNode, particle::Particle, routing::Routing},
    patch::Patch,
    synth::{
        allocator::VoiceAllocator,
        factory::{ParticleFactory, VoiceFactory},
        message::{ControlTarget, SynthHandle, SynthMessage},
        voice::Voice,
    },
    OUTPUT_CHANNELS,
};

pub struct PolySynth<T: GraphNode = Particle> {
    allocator: VoiceAllocator<T>,
    rx: Consumer<SynthMessage>,
    config: EngineConfig,
    /// -1.0 to 1.0, scaled by the patch's bend range
    bend: f32,
    frame_counter: u64,
}

impl PolySynth<Particle> {
    /// Build the particle engine and the handle that controls it.
    pub fn new(config: EngineConfig, patch: Patch) -> Result<(Self, SynthHandle), Error> {
        config.validate()?;
        let routing = Routing::particle()?;
        let factory = ParticleFactory::new(patch.clone(), routing, config.clone());
        Self::with_factory(config, patch, factory)
    }
}

impl<T: GraphNode> PolySynth<T> {
    /// Build an engine whose voices come from `factory`.
    pub fn with_factory<F>(
        config: EngineConfig,
        patch: Patch,
        factory: F,
    ) -> Result<(Self, SynthHandle), Error>
    where
        F: VoiceFactory<Voice = T>,
    {
        config.validate()?;

        let voices = (0..config.max_voices)
            .map(|_| Voice::new(factory.create_voice(), config.sample_rate))
            .collect();
        let allocator = VoiceAllocator::new(voices, config.play_mode, patch)?;
        let (tx, rx) = RingBuffer::new(config.event_queue_capacity);

        log::info!(
            "Engine ready: {} Hz, {} frames per block, {} voices ({:?})",
            config.sample_rate,
            config.block_size,
            config.max_voices,
            config.play_mode
        );
        log::debug!(
            "Event queue holds {} messages, {} delay samples per line, ramps restart {:?}",
            config.event_queue_capacity,
            config.delay_capacity(),
            config.ramp_retrigger
        );

        let synth = Self {
            allocator,
            rx,
            config,
            bend: 0.0,
            frame_counter: 0,
        };
        Ok((synth, SynthHandle::new(tx)))
    }

    /// Render one block of interleaved 8-channel frames into `out`.
    ///
    /// `out` is overwritten; its length should be a multiple of
    /// `OUTPUT_CHANNELS`. Trailing samples of a partial frame are zeroed.
    pub fn render_block(&mut self, out: &mut [f32]) {
        while let Ok(message) = self.rx.pop() {
            self.handle_message(message);
        }

        out.fill(0.0);
        let frames = out.len() / OUTPUT_CHANNELS;
        let out = &mut out[..frames * OUTPUT_CHANNELS];

        let globals = self.allocator.patch().globals;
        let bend = self.bend * globals.bend_range;
        for voice in self.allocator.voices_mut() {
            if !voice.is_free() {
                voice.render(out, bend);
            }
        }

        let gain = globals.master_gain;
        if gain != 1.0 {
            for sample in out.iter_mut() {
                *sample *= gain;
            }
        }

        self.allocator.reclaim_silent();
        self.frame_counter += frames as u64;
    }

    /// The parameter table as of the last block boundary.
    pub fn patch(&self) -> &Patch {
        self.allocator.patch()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn allocator(&self) -> &VoiceAllocator<T> {
        &self.allocator
    }

    pub fn active_voices(&self) -> usize {
        self.allocator.active_count()
    }

    /// Frames rendered since construction.
    pub fn frames_rendered(&self) -> u64 {
        self.frame_counter
    }

    fn handle_message(&mut self, message: SynthMessage) {
        match message {
            SynthMessage::NoteOn {
                note_id,
                pitch,
                velocity,
                channel,
            } => {
                let velocity = if velocity.is_finite() {
                    velocity.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                if pitch.is_finite() {
                    self.allocator.note_on(note_id, pitch, velocity, channel);
                }
            }
            SynthMessage::NoteOff { note_id } => self.allocator.note_off(note_id),
            SynthMessage::ControlChange {
                target: ControlTarget::Global,
                key,
                value,
            } => self.allocator.set_param(key, value),
            SynthMessage::ControlChange {
                target: ControlTarget::Note(note_id),
                key,
                value,
            } => self.allocator.set_note_param(note_id, key, value),
            SynthMessage::SetGlobal { param, value } => self.allocator.set_global(param, value),
            SynthMessage::Aftertouch { note_id, value } => {
                self.allocator.aftertouch(note_id, value)
            }
            SynthMessage::PitchBend { amount } => {
                if amount.is_finite() {
                    self.bend = amount.clamp(-1.0, 1.0);
                }
            }
            SynthMessage::Sustain(down) => self.allocator.set_sustain(down),
            SynthMessage::AllNotesOff => self.allocator.all_notes_off(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{graph::node::RenderCtx, PlayMode};

    /// Writes a constant into channel 0 while gated; silent one block after release.
    struct ConstGraph {
        gate: bool,
        tail: bool,
        frequency: f32,
    }

    impl GraphNode for ConstGraph {
        fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
            self.frequency = ctx.frequency;
            if self.gate || self.tail {
                for frame in out.chunks_exact_mut(OUTPUT_CHANNELS) {
                    frame[0] += 0.25;
                }
            }
            if !self.gate {
                self.tail = false;
            }
        }

        fn note_on(&mut self, _ctx: &RenderCtx) {
            self.gate = true;
            self.tail = true;
        }

        fn note_off(&mut self, _ctx: &RenderCtx) {
            self.gate = false;
        }

        fn is_silent(&self) -> bool {
            !self.gate && !self.tail
        }
    }

    fn const_synth(voices: usize) -> (PolySynth<ConstGraph>, SynthHandle) {
        let config = EngineConfig {
            max_voices: voices,
            block_size: 16,
            ..EngineConfig::default()
        };
        let factory = || ConstGraph {
            gate: false,
            tail: false,
            frequency: 0.0,
        };
        PolySynth::with_factory(config, Patch::default(), factory).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = EngineConfig {
            max_voices: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            PolySynth::new(config, Patch::default()),
            Err(Error::NoVoices)
        ));
    }

    #[test]
    fn voices_are_summed_and_scaled() {
        let (mut synth, mut handle) = const_synth(4);
        handle.note_on(1, 60.0, 1.0, 0).unwrap();
        handle.note_on(2, 64.0, 1.0, 0).unwrap();
        handle.set_global("master_gain", 2.0).unwrap();

        let mut out = vec![0.0; 16 * OUTPUT_CHANNELS];
        synth.render_block(&mut out);
        for frame in out.chunks_exact(OUTPUT_CHANNELS) {
            assert!((frame[0] - 1.0).abs() < 1e-6);
            assert!(frame[1..].iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn output_is_cleared_every_block() {
        let (mut synth, _handle) = const_synth(2);
        let mut out = vec![9.0; 16 * OUTPUT_CHANNELS + 3];
        synth.render_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn final_block_renders_before_reclaim() {
        let (mut synth, mut handle) = const_synth(2);
        let mut out = vec![0.0; 16 * OUTPUT_CHANNELS];
        handle.note_on(1, 60.0, 1.0, 0).unwrap();
        synth.render_block(&mut out);

        handle.note_off(1).unwrap();
        synth.render_block(&mut out);
        // The tail block still sounds, and the voice is freed right after it
        assert!((out[0] - 0.25).abs() < 1e-6);
        assert_eq!(synth.active_voices(), 0);

        synth.render_block(&mut out);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn events_apply_in_arrival_order() {
        let (mut synth, mut handle) = const_synth(2);
        handle.note_on(1, 60.0, 1.0, 0).unwrap();
        handle.note_off(1).unwrap();
        handle.note_on(1, 60.0, 1.0, 0).unwrap();

        let mut out = vec![0.0; 16 * OUTPUT_CHANNELS];
        synth.render_block(&mut out);
        assert_eq!(synth.active_voices(), 1);
        assert!(!synth.allocator().voices()[0].is_releasing());
    }

    #[test]
    fn table_changes_land_at_block_boundary() {
        let (mut synth, mut handle) = const_synth(1);
        let key = crate::patch::ParamKey::parse(3, "ratio").unwrap();
        let before = synth.patch().get(key);

        handle.set_param(3, "ratio", 2.0).unwrap();
        assert_eq!(synth.patch().get(key), before);

        synth.render_block(&mut [0.0; OUTPUT_CHANNELS]);
        assert_eq!(synth.patch().get(key), 2.0);
    }

    #[test]
    fn pitch_bend_shifts_fundamental() {
        let (mut synth, mut handle) = const_synth(1);
        handle.note_on(1, 69.0, 1.0, 0).unwrap();
        handle.pitch_bend(1.0).unwrap();
        synth.render_block(&mut [0.0; OUTPUT_CHANNELS]);

        // Default bend range is two semitones
        let expected = 440.0 * 2.0_f32.powf(2.0 / 12.0);
        let frequency = synth.allocator().voices()[0].graph().frequency;
        assert!((frequency - expected).abs() < 1e-2, "{frequency}");
    }

    #[test]
    fn mono_mode_uses_one_voice() {
        let config = EngineConfig {
            max_voices: 4,
            play_mode: PlayMode::Mono,
            ..EngineConfig::default()
        };
        let factory = || ConstGraph {
            gate: false,
            tail: false,
            frequency: 0.0,
        };
        let (mut synth, mut handle) = PolySynth::with_factory(config, Patch::default(), factory).unwrap();
        for id in 0..3 {
            handle.note_on(id, 60.0 + id as f32, 1.0, 0).unwrap();
        }
        synth.render_block(&mut [0.0; OUTPUT_CHANNELS]);
        assert_eq!(synth.active_voices(), 1);
    }
}
