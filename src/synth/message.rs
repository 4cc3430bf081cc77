use rtrb::Producer;

use crate::{
    error::Error,
    patch::{GlobalParam, ParamKey},
};

/// Identity of one played note, unique per physical trigger.
pub type NoteId = u64;

/// Where a parameter change applies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlTarget {
    /// The shared parameter table, and every voice.
    Global,
    /// Only the voice currently bound to this note.
    Note(NoteId),
}

/// Events handed from control threads to the audio thread.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn {
        note_id: NoteId,
        /// MIDI pitch, fractional values allowed.
        pitch: f32,
        /// 0.0 to 1.0
        velocity: f32,
        channel: u8,
    },
    NoteOff {
        note_id: NoteId,
    },
    ControlChange {
        target: ControlTarget,
        key: ParamKey,
        value: f32,
    },
    SetGlobal {
        param: GlobalParam,
        value: f32,
    },
    /// Per-note pressure, 0.0 to 1.0.
    Aftertouch {
        note_id: NoteId,
        value: f32,
    },
    /// -1.0 to 1.0, scaled by the patch's bend range.
    PitchBend {
        amount: f32,
    },
    Sustain(bool),
    AllNotesOff,
}

/// Control-side end of the event queue.
///
/// Validates names and operator indices before anything reaches the audio
/// thread. Every method fails with [`Error::QueueFull`] instead of blocking
/// when the audio thread has fallen behind.
pub struct SynthHandle {
    tx: Producer<SynthMessage>,
}

impl SynthHandle {
    pub fn new(tx: Producer<SynthMessage>) -> Self {
        Self { tx }
    }

    pub fn send(&mut self, message: SynthMessage) -> Result<(), Error> {
        self.tx.push(message).map_err(|err| {
            log::warn!("Dropping {message:?}: event queue is full");
            Error::from(err)
        })
    }

    pub fn note_on(
        &mut self,
        note_id: NoteId,
        pitch: f32,
        velocity: f32,
        channel: u8,
    ) -> Result<(), Error> {
        self.send(SynthMessage::NoteOn {
            note_id,
            pitch,
            velocity,
            channel,
        })
    }

    pub fn note_off(&mut self, note_id: NoteId) -> Result<(), Error> {
        self.send(SynthMessage::NoteOff { note_id })
    }

    /// Change a parameter in the shared table, e.g. `set_param(3, "ratio", 2.0)`.
    pub fn set_param(&mut self, operator: usize, name: &str, value: f32) -> Result<(), Error> {
        let key = parse_key(operator, name)?;
        self.send(SynthMessage::ControlChange {
            target: ControlTarget::Global,
            key,
            value,
        })
    }

    /// Change a parameter on the voice playing `note_id` only.
    pub fn set_note_param(
        &mut self,
        note_id: NoteId,
        operator: usize,
        name: &str,
        value: f32,
    ) -> Result<(), Error> {
        let key = parse_key(operator, name)?;
        self.send(SynthMessage::ControlChange {
            target: ControlTarget::Note(note_id),
            key,
            value,
        })
    }

    pub fn set_global(&mut self, name: &str, value: f32) -> Result<(), Error> {
        let param = name.parse::<GlobalParam>().map_err(|err| {
            log::warn!("{err}");
            err
        })?;
        self.send(SynthMessage::SetGlobal { param, value })
    }

    pub fn aftertouch(&mut self, note_id: NoteId, value: f32) -> Result<(), Error> {
        self.send(SynthMessage::Aftertouch { note_id, value })
    }

    pub fn pitch_bend(&mut self, amount: f32) -> Result<(), Error> {
        self.send(SynthMessage::PitchBend { amount })
    }

    pub fn sustain(&mut self, down: bool) -> Result<(), Error> {
        self.send(SynthMessage::Sustain(down))
    }

    pub fn all_notes_off(&mut self) -> Result<(), Error> {
        self.send(SynthMessage::AllNotesOff)
    }

    /// Free space in the queue.
    pub fn slots(&self) -> usize {
        self.tx.slots()
    }
}

fn parse_key(operator: usize, name: &str) -> Result<ParamKey, Error> {
    ParamKey::parse(operator, name).map_err(|err| {
        log::warn!("Rejecting parameter change: {err}");
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtrb::RingBuffer;

    #[test]
    fn full_queue_reports_error() {
        let (tx, mut rx) = RingBuffer::new(2);
        let mut handle = SynthHandle::new(tx);

        assert!(handle.note_on(1, 60.0, 1.0, 0).is_ok());
        assert!(handle.note_off(1).is_ok());
        assert_eq!(handle.all_notes_off(), Err(Error::QueueFull));

        assert!(matches!(rx.pop(), Ok(SynthMessage::NoteOn { note_id: 1, .. })));
        assert_eq!(handle.slots(), 1);
    }

    #[test]
    fn bad_names_never_reach_the_queue() {
        let (tx, rx) = RingBuffer::new(8);
        let mut handle = SynthHandle::new(tx);

        assert!(matches!(
            handle.set_param(0, "nope", 1.0),
            Err(Error::UnknownParameter(_))
        ));
        assert_eq!(
            handle.set_param(9, "ratio", 1.0),
            Err(Error::InvalidOperator(9))
        );
        assert!(handle.set_global("nope", 1.0).is_err());
        assert_eq!(rx.slots(), 0);
    }

    #[test]
    fn parameter_changes_are_addressed() {
        let (tx, mut rx) = RingBuffer::new(8);
        let mut handle = SynthHandle::new(tx);

        handle.set_param(3, "ratio", 2.0).unwrap();
        handle.set_note_param(42, 4, "amp_sustain", 0.2).unwrap();

        match rx.pop() {
            Ok(SynthMessage::ControlChange { target, key, value }) => {
                assert_eq!(target, ControlTarget::Global);
                assert_eq!(key, ParamKey::parse(3, "ratio").unwrap());
                assert_eq!(value, 2.0);
            }
            other => panic!("unexpected message: {other:?}"),
        }
        assert!(matches!(
            rx.pop(),
            Ok(SynthMessage::ControlChange {
                target: ControlTarget::Note(42),
                ..
            })
        ));
    }
}
