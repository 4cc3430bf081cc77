//! Maps note events onto a fixed pool of voices.

/*
Voice Allocation
================

The pool is a fixed array of voices, allocated once. A note-on takes the
lowest free slot. When every slot is busy, one is STOLEN:

    1. a voice already releasing (key up)           oldest first
    2. a voice holding in sustain (key down)        oldest first
    3. any voice                                    oldest first

"Oldest" is the trigger serial: every note-on stamps its voice with a
strictly increasing counter, so there is always exactly one oldest voice.
Ties that could only come from equal serials fall back to the lowest slot
index. The outcome depends only on the event sequence, never on timing.

A stolen voice is retriggered, not reset: its envelopes attack from their
current level, so the steal does not click.

The allocator owns the parameter table. Every time a slot is bound to a NEW
note id (free slot, steal, or a mono retrigger) the table is pushed into the
graph first, wiping per-note changes the previous note received. Retriggering
the same note id keeps them.

A note-off for a note that is no longer bound (stolen, or never seen) is
ignored. Late and duplicate events are normal for a transport.


Sustain Pedal
-------------

While the pedal is down, note-offs only mark the voice. Lifting the pedal
releases every marked voice.


Monophonic Mode
---------------

All notes share slot 0. Held keys are kept on a small last-note-priority
stack:

    key down, nothing held    retrigger (envelopes restart from current level)
    key down, others held     legato: rebind to the new pitch, no retrigger
    key up, others held       legato back to the most recent held key
    key up, nothing held      release

The stack has a fixed capacity; when it overflows the oldest key is dropped.
*/

use crate::{
    config::PlayMode,
    error::Error,
    graph::node::GraphNode,
    patch::{GlobalParam, ParamKey, Patch},
    synth::{message::NoteId, voice::Voice},
};

/// Held keys remembered in monophonic mode.
pub const NOTE_STACK_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeldNote {
    note_id: NoteId,
    pitch: f32,
}

/// Fixed-capacity last-note-priority stack.
#[derive(Debug, Clone)]
struct NoteStack {
    notes: [HeldNote; NOTE_STACK_CAPACITY],
    len: usize,
}

impl NoteStack {
    fn new() -> Self {
        Self {
            notes: [HeldNote {
                note_id: 0,
                pitch: 0.0,
            }; NOTE_STACK_CAPACITY],
            len: 0,
        }
    }

    fn push(&mut self, note: HeldNote) {
        self.remove(note.note_id);
        if self.len == NOTE_STACK_CAPACITY {
            self.notes.copy_within(1.., 0);
            self.len -= 1;
        }
        self.notes[self.len] = note;
        self.len += 1;
    }

    fn remove(&mut self, note_id: NoteId) -> bool {
        let Some(index) = self.notes[..self.len]
            .iter()
            .position(|n| n.note_id == note_id)
        else {
            return false;
        };
        self.notes.copy_within(index + 1..self.len, index);
        self.len -= 1;
        true
    }

    fn top(&self) -> Option<HeldNote> {
        self.len.checked_sub(1).map(|i| self.notes[i])
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn clear(&mut self) {
        self.len = 0;
    }
}

pub struct VoiceAllocator<T: GraphNode> {
    voices: Vec<Voice<T>>,
    patch: Patch,
    play_mode: PlayMode,
    next_age: u64,
    sustain_pedal: bool,
    held: NoteStack,
}

impl<T: GraphNode> VoiceAllocator<T> {
    pub fn new(mut voices: Vec<Voice<T>>, play_mode: PlayMode, patch: Patch) -> Result<Self, Error> {
        if voices.is_empty() {
            return Err(Error::NoVoices);
        }
        for voice in &mut voices {
            voice.graph_mut().apply_patch(&patch);
        }
        Ok(Self {
            voices,
            patch,
            play_mode,
            next_age: 0,
            sustain_pedal: false,
            held: NoteStack::new(),
        })
    }

    /// Bind a note to a voice and trigger it. Returns the slot used.
    pub fn note_on(&mut self, note_id: NoteId, pitch: f32, velocity: f32, channel: u8) -> usize {
        match self.play_mode {
            PlayMode::Poly => self.poly_note_on(note_id, pitch, velocity, channel),
            PlayMode::Mono => self.mono_note_on(note_id, pitch, velocity, channel),
        }
    }

    /// Release the voice bound to `note_id`, if any.
    pub fn note_off(&mut self, note_id: NoteId) {
        match self.play_mode {
            PlayMode::Poly => {
                if let Some(slot) = self.slot_for_note(note_id) {
                    self.release_slot(slot);
                }
            }
            PlayMode::Mono => self.mono_note_off(note_id),
        }
    }

    pub fn set_sustain(&mut self, down: bool) {
        self.sustain_pedal = down;
        if !down {
            for voice in &mut self.voices {
                if voice.is_release_deferred() {
                    voice.release();
                }
            }
        }
    }

    /// Release every sounding voice, pedal or not.
    pub fn all_notes_off(&mut self) {
        self.held.clear();
        for voice in &mut self.voices {
            voice.release();
        }
    }

    /// Route pressure to the voice bound to `note_id`.
    pub fn aftertouch(&mut self, note_id: NoteId, pressure: f32) {
        if let Some(slot) = self.slot_for_note(note_id) {
            self.voices[slot].graph_mut().set_pressure(pressure);
        }
    }

    /// Live parameter change on the voice bound to `note_id` only.
    pub fn set_note_param(&mut self, note_id: NoteId, key: ParamKey, value: f32) {
        if let Some(slot) = self.slot_for_note(note_id) {
            self.voices[slot].graph_mut().set_param(key, value);
        }
    }

    /// Write the table, then hand the clamped value to every voice, sounding or not.
    pub fn set_param(&mut self, key: ParamKey, value: f32) {
        self.patch.set(key, value);
        let value = self.patch.get(key);
        for voice in &mut self.voices {
            voice.graph_mut().set_param(key, value);
        }
    }

    pub fn set_global(&mut self, param: GlobalParam, value: f32) {
        self.patch.set_global(param, value);
        let value = self.patch.get_global(param);
        for voice in &mut self.voices {
            voice.graph_mut().set_global(param, value);
        }
    }

    /// The parameter table every fresh note starts from.
    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    /// Return every voice whose graph has gone silent to the free pool.
    pub fn reclaim_silent(&mut self) -> usize {
        let mut reclaimed = 0;
        for voice in &mut self.voices {
            if !voice.is_free() && voice.graph().is_silent() {
                voice.free();
                reclaimed += 1;
            }
        }
        if self.play_mode == PlayMode::Mono && self.voices[0].is_free() {
            self.held.clear();
        }
        reclaimed
    }

    pub fn voices(&self) -> &[Voice<T>] {
        &self.voices
    }

    pub fn voices_mut(&mut self) -> &mut [Voice<T>] {
        &mut self.voices
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_free()).count()
    }

    /// Slot currently bound to `note_id`.
    pub fn slot_for_note(&self, note_id: NoteId) -> Option<usize> {
        self.voices
            .iter()
            .position(|v| v.is_active() && v.note_id() == Some(note_id))
    }

    fn poly_note_on(&mut self, note_id: NoteId, pitch: f32, velocity: f32, channel: u8) -> usize {
        let slot = self
            .slot_for_note(note_id)
            .or_else(|| self.voices.iter().position(Voice::is_free))
            .unwrap_or_else(|| self.steal_candidate());

        self.bind(slot, note_id, pitch, velocity, channel);
        slot
    }

    fn mono_note_on(&mut self, note_id: NoteId, pitch: f32, velocity: f32, channel: u8) -> usize {
        let legato = !self.held.is_empty() && self.voices[0].is_active();
        self.held.push(HeldNote { note_id, pitch });

        if legato {
            self.voices[0].retune(note_id, pitch);
        } else {
            self.bind(0, note_id, pitch, velocity, channel);
        }
        0
    }

    fn bind(&mut self, slot: usize, note_id: NoteId, pitch: f32, velocity: f32, channel: u8) {
        let age = self.next_age();
        let voice = &mut self.voices[slot];
        if voice.note_id() != Some(note_id) {
            voice.graph_mut().apply_patch(&self.patch);
        }
        voice.start(note_id, pitch, velocity, channel, age);
    }

    fn mono_note_off(&mut self, note_id: NoteId) {
        if !self.held.remove(note_id) {
            return;
        }
        if self.voices[0].note_id() != Some(note_id) {
            return;
        }
        match self.held.top() {
            Some(previous) => self.voices[0].retune(previous.note_id, previous.pitch),
            None => self.release_slot(0),
        }
    }

    fn release_slot(&mut self, slot: usize) {
        if self.sustain_pedal {
            self.voices[slot].defer_release();
        } else {
            self.voices[slot].release();
        }
    }

    /// Pick the voice to steal: releasing, then sustaining, then any; oldest first.
    fn steal_candidate(&self) -> usize {
        let oldest = |filter: &dyn Fn(&Voice<T>) -> bool| {
            self.voices
                .iter()
                .enumerate()
                .filter(|(_, v)| filter(v))
                .min_by_key(|(slot, v)| (v.age(), *slot))
                .map(|(slot, _)| slot)
        };

        oldest(&|v| v.is_releasing())
            .or_else(|| oldest(&|v| v.is_active() && v.graph().is_sustaining()))
            .or_else(|| oldest(&|_| true))
            .unwrap_or(0)
    }

    fn next_age(&mut self) -> u64 {
        let age = self.next_age;
        self.next_age += 1;
        age
    }
}
