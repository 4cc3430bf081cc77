use crate::{
    io::midi::MidiEvent,
    patch::GlobalParam,
    synth::message::{NoteId, SynthMessage},
};

const MIDI_CHANNELS: usize = 16;
const MIDI_KEYS: usize = 128;

/// Modulation wheel: scales every operator's modulation index.
pub const CC_MODULATION: u8 = 1;
/// Channel volume: master gain.
pub const CC_VOLUME: u8 = 7;
pub const CC_SUSTAIN: u8 = 64;
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// Turns raw MIDI into synth events.
///
/// MIDI identifies notes by channel and key; the engine wants a unique id per
/// physical trigger. The converter hands out a fresh id on every note-on and
/// remembers it until the matching note-off. Striking a key that is still
/// held releases the earlier trigger first, so no note is left hanging.
pub struct MidiConverter {
    /// `None` listens to every channel.
    channel_filter: Option<u8>,
    held: [[Option<NoteId>; MIDI_KEYS]; MIDI_CHANNELS],
    next_id: NoteId,
}

impl MidiConverter {
    pub fn new(channel_filter: Option<u8>) -> Self {
        Self {
            channel_filter,
            held: [[None; MIDI_KEYS]; MIDI_CHANNELS],
            next_id: 1,
        }
    }

    /// Synth events for one MIDI message, in the order they must be sent.
    pub fn convert(&mut self, midi: MidiEvent) -> impl Iterator<Item = SynthMessage> {
        let mut released = None;
        let message = self.translate(midi, &mut released);
        released.into_iter().chain(message)
    }

    fn translate(
        &mut self,
        midi: MidiEvent,
        released: &mut Option<SynthMessage>,
    ) -> Option<SynthMessage> {
        if self
            .channel_filter
            .is_some_and(|filter| filter != midi.channel())
        {
            return None;
        }

        match midi {
            MidiEvent::NoteOn {
                channel,
                key,
                velocity: 0,
            }
            | MidiEvent::NoteOff { channel, key, .. } => {
                let note_id = self.slot(channel, key)?.take()?;
                Some(SynthMessage::NoteOff { note_id })
            }
            MidiEvent::NoteOn {
                channel,
                key,
                velocity,
            } => {
                let note_id = self.next_id;
                self.next_id += 1;
                if let Some(previous) = self.slot(channel, key)?.replace(note_id) {
                    *released = Some(SynthMessage::NoteOff { note_id: previous });
                }
                Some(SynthMessage::NoteOn {
                    note_id,
                    pitch: key as f32,
                    velocity: velocity as f32 / 127.0,
                    channel,
                })
            }
            MidiEvent::PolyPressure {
                channel,
                key,
                pressure,
            } => {
                let note_id = (*self.slot(channel, key)?)?;
                Some(SynthMessage::Aftertouch {
                    note_id,
                    value: pressure as f32 / 127.0,
                })
            }
            MidiEvent::ControlChange {
                controller, value, ..
            } => control_change(controller, value),
            MidiEvent::PitchBend { value, .. } => Some(SynthMessage::PitchBend {
                amount: (value as f32 / 8192.0).clamp(-1.0, 1.0),
            }),
            MidiEvent::ProgramChange { .. } => None,
        }
    }

    fn slot(&mut self, channel: u8, key: u8) -> Option<&mut Option<NoteId>> {
        self.held
            .get_mut(channel as usize)?
            .get_mut(key as usize)
    }
}

impl Default for MidiConverter {
    fn default() -> Self {
        Self::new(None)
    }
}

fn control_change(controller: u8, value: u8) -> Option<SynthMessage> {
    let normalized = value as f32 / 127.0;
    match controller {
        CC_MODULATION => Some(SynthMessage::SetGlobal {
            param: GlobalParam::ModulationGain,
            value: normalized * 2.0,
        }),
        CC_VOLUME => Some(SynthMessage::SetGlobal {
            param: GlobalParam::MasterGain,
            value: normalized,
        }),
        CC_SUSTAIN => Some(SynthMessage::Sustain(value >= 64)),
        CC_ALL_NOTES_OFF => Some(SynthMessage::AllNotesOff),
        _ => None,
    }
}
