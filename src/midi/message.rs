//! Raw MIDI channel messages to and from parser events.
//!
//! Message layout:
//! - Note Off:  [0x80 | channel, note, velocity]
//! - Note On:   [0x90 | channel, note, velocity], velocity 0 means Note Off
//! - Poly AT:   [0xA0 | channel, key, pressure]
//! - CC:        [0xB0 | channel, controller, value]
//! - Program:   [0xC0 | channel, program]
//! - Chan AT:   [0xD0 | channel, pressure]
//! - Bend:      [0xE0 | channel, lsb, msb]

use crate::event::ParserEvent;
use crate::theory::Note;

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const POLY_PRESSURE: u8 = 0xA0;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const PROGRAM_CHANGE: u8 = 0xC0;
pub const CHANNEL_PRESSURE: u8 = 0xD0;
pub const PITCH_BEND: u8 = 0xE0;
pub const SYSEX_START: u8 = 0xF0;

fn status(kind: u8, channel: u8) -> u8 {
    kind | (channel & 0x0F)
}

pub fn note_on(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [status(NOTE_ON, channel), note & 0x7F, velocity & 0x7F]
}

pub fn note_off(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [status(NOTE_OFF, channel), note & 0x7F, velocity & 0x7F]
}

pub fn poly_pressure(channel: u8, key: u8, pressure: u8) -> [u8; 3] {
    [status(POLY_PRESSURE, channel), key & 0x7F, pressure & 0x7F]
}

pub fn control_change(channel: u8, controller: u8, value: u8) -> [u8; 3] {
    [status(CONTROL_CHANGE, channel), controller & 0x7F, value & 0x7F]
}

pub fn program_change(channel: u8, program: u8) -> [u8; 2] {
    [status(PROGRAM_CHANGE, channel), program & 0x7F]
}

pub fn channel_pressure(channel: u8, pressure: u8) -> [u8; 2] {
    [status(CHANNEL_PRESSURE, channel), pressure & 0x7F]
}

/// `value` is 14-bit, split into 7-bit halves.
pub fn pitch_bend(channel: u8, value: u16) -> [u8; 3] {
    let value = value.min(0x3FFF);
    [
        status(PITCH_BEND, channel),
        (value & 0x7F) as u8,
        (value >> 7) as u8,
    ]
}

/// Decode a raw message into the channel it arrived on and a parser event.
///
/// System exclusive messages report channel 0. Returns None for truncated
/// messages and for system real-time/common messages.
pub fn decode(msg: &[u8]) -> Option<(u8, ParserEvent)> {
    let first = *msg.first()?;
    if first == SYSEX_START {
        return Some((0, ParserEvent::SystemExclusiveParsed(msg.to_vec())));
    }
    let kind = first & 0xF0;
    let channel = first & 0x0F;
    let data = |i: usize| msg.get(i).map(|b| b & 0x7F);

    let event = match kind {
        NOTE_ON if data(2)? > 0 => {
            ParserEvent::NotePressed(Note::new(data(1)?).with_velocities(data(2)?, 0))
        }
        NOTE_ON => ParserEvent::NoteReleased(Note::new(data(1)?).with_velocities(0, 0)),
        NOTE_OFF => ParserEvent::NoteReleased(Note::new(data(1)?).with_velocities(0, data(2)?)),
        POLY_PRESSURE => ParserEvent::PolyphonicPressureParsed {
            key: data(1)?,
            pressure: data(2)?,
        },
        CONTROL_CHANGE => ParserEvent::ControllerEventParsed {
            controller: data(1)?,
            value: data(2)?,
        },
        PROGRAM_CHANGE => ParserEvent::InstrumentParsed(data(1)?),
        CHANNEL_PRESSURE => ParserEvent::ChannelPressureParsed(data(1)?),
        PITCH_BEND => ParserEvent::PitchWheelParsed {
            lsb: data(1)?,
            msb: data(2)?,
        },
        _ => return None,
    };
    Some((channel, event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_with_velocity_is_a_press() {
        let (channel, event) = decode(&note_on(3, 60, 100)).unwrap();
        assert_eq!(channel, 3);
        match event {
            ParserEvent::NotePressed(note) => {
                assert_eq!(note.value, 60);
                assert_eq!(note.on_velocity, 100);
            }
            other => panic!("expected a press, got {other:?}"),
        }
    }

    #[test]
    fn zero_velocity_note_on_is_a_release() {
        let (_, event) = decode(&[0x90, 60, 0]).unwrap();
        assert!(matches!(event, ParserEvent::NoteReleased(ref n) if n.value == 60));
        let (_, event) = decode(&note_off(0, 61, 40)).unwrap();
        assert!(matches!(event, ParserEvent::NoteReleased(ref n) if n.off_velocity == 40));
    }

    #[test]
    fn pitch_bend_splits_fourteen_bits() {
        assert_eq!(pitch_bend(0, 8192), [0xE0, 0, 64]);
        assert_eq!(pitch_bend(1, 0xFFFF), [0xE1, 0x7F, 0x7F]);
        let (_, event) = decode(&pitch_bend(0, 9000)).unwrap();
        assert_eq!(event.pitch_wheel_value(), Some(9000));
    }

    #[test]
    fn controller_and_program() {
        assert_eq!(
            decode(&control_change(2, 7, 100)),
            Some((2, ParserEvent::ControllerEventParsed {
                controller: 7,
                value: 100
            }))
        );
        assert_eq!(
            decode(&program_change(9, 5)),
            Some((9, ParserEvent::InstrumentParsed(5)))
        );
    }

    #[test]
    fn truncated_and_unknown_messages() {
        assert_eq!(decode(&[]), None);
        assert_eq!(decode(&[0x90, 60]), None);
        assert_eq!(decode(&[0xF8]), None);
    }
}
