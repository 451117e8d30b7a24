//! Raw MIDI bytes → normalized [`NoteEvent`]s.
//!
//! Only channel voice note messages matter to the recognizer. Everything
//! else (controllers, pressure, pitch bend, system messages) is dropped.
//! Running status is not supported: every message must carry its status byte.

use crate::types::*;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;

/// Decode one complete MIDI message received at `tick`.
pub fn decode(bytes: &[u8], tick: Tick) -> Option<NoteEvent> {
    let (&status, data) = bytes.split_first()?;
    if status & 0x80 == 0 {
        return None;
    }
    let channel = status & 0x0F;

    let event = match (status & 0xF0, data) {
        (NOTE_ON, &[pitch, velocity, ..]) if velocity != 0 => NoteEvent {
            kind: NoteKind::On,
            pitch: pitch & 0x7F,
            velocity: velocity & 0x7F,
            tick,
            channel,
        },
        // Note-on with velocity 0 is a note-off
        (NOTE_ON, &[pitch, _, ..]) | (NOTE_OFF, &[pitch, _, ..]) => NoteEvent {
            kind: NoteKind::Off,
            pitch: pitch & 0x7F,
            velocity: 0,
            tick,
            channel,
        },
        _ => return None,
    };
    Some(event)
}
