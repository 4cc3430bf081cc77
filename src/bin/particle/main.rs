//! particle - plays a short phrase through the default output device
//!
//! Run with: cargo run [-- mono]
//! Set RUST_LOG=debug for engine details.

mod app;

use app::Player;
use particle_synth::{io::midi::MidiEvent, PlayMode};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    let play_mode = match std::env::args().nth(1).as_deref() {
        Some("mono") => PlayMode::Mono,
        _ => PlayMode::Poly,
    };

    // (milliseconds after the previous event, event)
    let phrase = [
        (0, note_on(57, 100)),
        (120, note_on(60, 90)),
        (120, note_on(64, 90)),
        (600, aftertouch(57, 110)),
        (400, pitch_bend(4096)),
        (300, pitch_bend(0)),
        (200, note_off(57)),
        (0, note_off(60)),
        (0, note_off(64)),
        (400, note_on(69, 110)),
        (200, note_on(72, 80)),
        (800, note_off(69)),
        (0, note_off(72)),
    ];

    Player::new(play_mode).tail_ms(3000).play(&phrase)
}

fn note_on(key: u8, velocity: u8) -> MidiEvent {
    MidiEvent::NoteOn {
        channel: 0,
        key,
        velocity,
    }
}

fn note_off(key: u8) -> MidiEvent {
    MidiEvent::NoteOff {
        channel: 0,
        key,
        velocity: 0,
    }
}

fn aftertouch(key: u8, pressure: u8) -> MidiEvent {
    MidiEvent::PolyPressure {
        channel: 0,
        key,
        pressure,
    }
}

fn pitch_bend(value: i16) -> MidiEvent {
    MidiEvent::PitchBend { channel: 0, value }
}
