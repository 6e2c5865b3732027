//! Offline materialization: parser events become tick-stamped MIDI-style
//! events on per-track sequences.
//!
//! [`SequenceListener`] drives any [`SequenceSink`]; [`Sequence`] is the
//! in-memory sink. [`SequenceParser`] goes the other way, firing parser
//! events from a sequence so it can be re-serialized to notation.

pub mod listener;
pub mod memory;
pub mod parser;

pub use listener::SequenceListener;
pub use memory::{Sequence, SequencedNote, TimedEvent};
pub use parser::SequenceParser;

use crate::error::Result;
use crate::parser::StaccatoParser;
use crate::time::Tick;

pub const META_LYRIC: u8 = 0x05;
pub const META_MARKER: u8 = 0x06;
pub const META_END_OF_TRACK: u8 = 0x2F;
pub const META_TEMPO: u8 = 0x51;
pub const META_TIME_SIGNATURE: u8 = 0x58;
pub const META_KEY_SIGNATURE: u8 = 0x59;

/// One timed event on a track. The channel is the track number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceEvent {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ProgramChange { channel: u8, program: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, lsb: u8, msb: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    PolyPressure { channel: u8, key: u8, pressure: u8 },
    Meta { kind: u8, data: Vec<u8> },
    SysEx(Vec<u8>),
}

impl SequenceEvent {
    pub fn meta(kind: u8, data: impl Into<Vec<u8>>) -> Self {
        Self::Meta {
            kind,
            data: data.into(),
        }
    }

    pub fn is_end_of_track(&self) -> bool {
        matches!(self, Self::Meta { kind: META_END_OF_TRACK, .. })
    }
}

/// Destination of an offline materialization.
pub trait SequenceSink {
    fn create_track(&mut self, track: u8);

    fn add_event(&mut self, track: u8, tick: Tick, event: SequenceEvent);
}

/// Parse `notation` with `parser` into a fresh sequence at `resolution`.
///
/// The sequence listener is attached for this call only.
pub fn materialize(parser: &mut StaccatoParser, notation: &str, resolution: u32) -> Result<Sequence> {
    let mut listener = SequenceListener::new(Sequence::new(resolution));
    listener.set_default_duration(parser.config().settings.notes.default_duration);
    let (id, listener) = parser.bus().add(listener);
    let parsed = parser.parse(notation);
    parser.bus().unsubscribe(id);
    parsed?;

    let mut listener = listener.borrow_mut();
    listener.finish();
    Ok(listener.sink().clone())
}

/// Convenience for [`materialize`] when the caller keeps no parser.
pub fn materialize_default(notation: &str) -> Result<Sequence> {
    let mut parser = StaccatoParser::new();
    materialize(&mut parser, notation, crate::time::DEFAULT_RESOLUTION)
}
