//! Parser events and the bus that delivers them.
//!
//! Every musical fact the parser discovers becomes a [`ParserEvent`]. Sinks
//! implement the single-method [`Listener`] trait and match on the kinds they
//! care about, ignoring the rest.

pub mod bus;
pub mod chaining;
pub mod diagnostic;

pub use bus::{EventBus, ListenerId, SharedListener};
pub use chaining::ChainingListener;
pub use diagnostic::DiagnosticListener;

use crate::theory::{Chord, Mode, Note};

/// A structured event fired while parsing notation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParserEvent {
    BeforeParsingStarts,
    AfterParsingFinished,
    TrackChanged(u8),
    LayerChanged(u8),
    InstrumentParsed(u8),
    /// Tempo in beats per minute.
    TempoChanged(u32),
    /// Sharps (positive) or flats (negative) and the mode.
    KeySignatureParsed { signature: i8, mode: Mode },
    /// Numerator and log2 of the denominator.
    TimeSignatureParsed { numerator: u8, power_of_two: u8 },
    BarLineParsed(u64),
    TrackBeatTimeBookmarked(String),
    TrackBeatTimeBookmarkRequested(String),
    /// Absolute time in whole notes.
    TrackBeatTimeRequested(f64),
    PitchWheelParsed { lsb: u8, msb: u8 },
    ChannelPressureParsed(u8),
    PolyphonicPressureParsed { key: u8, pressure: u8 },
    SystemExclusiveParsed(Vec<u8>),
    ControllerEventParsed { controller: u8, value: u8 },
    LyricParsed(String),
    MarkerParsed(String),
    /// A function call with no dedicated event kind.
    FunctionParsed { id: String, message: String },
    /// Live key-down, sounding until the matching release.
    NotePressed(Note),
    NoteReleased(Note),
    NoteParsed(Note),
    ChordParsed(Chord),
}

impl ParserEvent {
    /// Short kind name, used for logging and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ParserEvent::BeforeParsingStarts => "before-parsing-starts",
            ParserEvent::AfterParsingFinished => "after-parsing-finished",
            ParserEvent::TrackChanged(_) => "track-changed",
            ParserEvent::LayerChanged(_) => "layer-changed",
            ParserEvent::InstrumentParsed(_) => "instrument-parsed",
            ParserEvent::TempoChanged(_) => "tempo-changed",
            ParserEvent::KeySignatureParsed { .. } => "key-signature-parsed",
            ParserEvent::TimeSignatureParsed { .. } => "time-signature-parsed",
            ParserEvent::BarLineParsed(_) => "bar-line-parsed",
            ParserEvent::TrackBeatTimeBookmarked(_) => "bookmarked",
            ParserEvent::TrackBeatTimeBookmarkRequested(_) => "bookmark-requested",
            ParserEvent::TrackBeatTimeRequested(_) => "time-requested",
            ParserEvent::PitchWheelParsed { .. } => "pitch-wheel-parsed",
            ParserEvent::ChannelPressureParsed(_) => "channel-pressure-parsed",
            ParserEvent::PolyphonicPressureParsed { .. } => "polyphonic-pressure-parsed",
            ParserEvent::SystemExclusiveParsed(_) => "sysex-parsed",
            ParserEvent::ControllerEventParsed { .. } => "controller-parsed",
            ParserEvent::LyricParsed(_) => "lyric-parsed",
            ParserEvent::MarkerParsed(_) => "marker-parsed",
            ParserEvent::FunctionParsed { .. } => "function-parsed",
            ParserEvent::NotePressed(_) => "note-pressed",
            ParserEvent::NoteReleased(_) => "note-released",
            ParserEvent::NoteParsed(_) => "note-parsed",
            ParserEvent::ChordParsed(_) => "chord-parsed",
        }
    }

    /// Combined 14-bit pitch wheel value, if this is a pitch wheel event.
    pub fn pitch_wheel_value(&self) -> Option<u16> {
        match self {
            ParserEvent::PitchWheelParsed { lsb, msb } => {
                Some(((*msb as u16) << 7) | (*lsb as u16 & 0x7F))
            }
            _ => None,
        }
    }
}

/// Receives parser events.
pub trait Listener {
    fn on_event(&mut self, event: &ParserEvent);
}

impl<F> Listener for F
where
    F: FnMut(&ParserEvent),
{
    fn on_event(&mut self, event: &ParserEvent) {
        self(event)
    }
}

/// Listener that keeps every event it sees, in order.
///
/// Useful for inspecting what a piece of notation produces, and as the
/// simplest listener to attach when testing code built on the bus:
///
/// ```
/// use staccato::event::EventCollector;
/// use staccato::StaccatoParser;
///
/// let mut parser = StaccatoParser::new();
/// let (_, collector) = parser.bus().add(EventCollector::new());
/// parser.parse("C D").unwrap();
/// assert_eq!(collector.borrow().notes().len(), 2);
/// ```
#[derive(Debug, Default, Clone)]
pub struct EventCollector {
    pub events: Vec<ParserEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed notes, with chords expanded to their notes.
    pub fn notes(&self) -> Vec<Note> {
        let mut notes = Vec::new();
        for event in &self.events {
            match event {
                ParserEvent::NoteParsed(note) => notes.push(note.clone()),
                ParserEvent::ChordParsed(chord) => notes.extend(chord.notes()),
                _ => {}
            }
        }
        notes
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(ParserEvent::kind).collect()
    }
}

impl Listener for EventCollector {
    fn on_event(&mut self, event: &ParserEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_wheel_combines_bytes() {
        let event = ParserEvent::PitchWheelParsed { lsb: 0, msb: 64 };
        assert_eq!(event.pitch_wheel_value(), Some(8192));
        assert_eq!(ParserEvent::TempoChanged(120).pitch_wheel_value(), None);
    }

    #[test]
    fn closures_are_listeners() {
        let mut seen = Vec::new();
        {
            let mut listener = |e: &ParserEvent| seen.push(e.kind());
            listener.on_event(&ParserEvent::BarLineParsed(1));
        }
        assert_eq!(seen, vec!["bar-line-parsed"]);
    }

    #[test]
    fn collector_expands_chords() {
        let mut collector = EventCollector::new();
        let chord = crate::theory::Chord::parse("Cmaj").unwrap();
        collector.on_event(&ParserEvent::ChordParsed(chord));
        collector.on_event(&ParserEvent::NoteParsed(Note::new(72)));
        let values: Vec<u8> = collector.notes().iter().map(|n| n.value).collect();
        assert_eq!(values, vec![48, 52, 55, 72]);
    }
}
