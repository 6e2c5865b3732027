//! Atoms: a voice, layer, instrument and note in one fragment,
//! `~V0,L1,I40,C5Q`.

use crate::error::{Result, StaccatoError};
use crate::time::{MAX_LAYERS, MAX_TRACKS};

use super::ivl::read_value;
use super::note::NoteElement;
use super::{ParseContext, Subparser};

pub struct AtomSubparser;

impl Subparser for AtomSubparser {
    fn matches(&self, fragment: &str) -> bool {
        fragment.starts_with('~')
    }

    fn parse(&self, fragment: &str, context: &mut ParseContext<'_>) -> Result<usize> {
        let parts: Vec<&str> = fragment[1..].split(',').collect();
        let Some((note_text, prefixes)) = parts.split_last() else {
            return Err(StaccatoError::syntax("empty atom", fragment));
        };

        for part in prefixes {
            match part.as_bytes().first() {
                Some(b'V') => {
                    let (v, _) = read_value(part, "voice", context)?;
                    let track = StaccatoError::check_u8("voice", v, 0, MAX_TRACKS as u8 - 1)?;
                    context.bus.fire_track_changed(track);
                }
                Some(b'L') => {
                    let (v, _) = read_value(part, "layer", context)?;
                    let layer = StaccatoError::check_u8("layer", v, 0, MAX_LAYERS as u8 - 1)?;
                    context.bus.fire_layer_changed(layer);
                }
                Some(b'I') => {
                    let (v, _) = read_value(part, "instrument", context)?;
                    let instrument = StaccatoError::check_u8("instrument", v, 0, 127)?;
                    context.bus.fire_instrument_parsed(instrument);
                }
                _ => return Err(StaccatoError::syntax("bad atom part", fragment)),
            }
        }

        let (elements, consumed) = context.note_reader().read(note_text)?;
        if consumed != note_text.len() {
            return Err(StaccatoError::syntax("bad atom note", fragment));
        }
        for element in elements {
            match element {
                NoteElement::Note(note) => context.bus.fire_note_parsed(note),
                NoteElement::Chord(chord) => context.bus.fire_chord_parsed(chord),
            }
        }
        Ok(fragment.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ParserEvent;
    use crate::parser::context::TestContext;

    #[test]
    fn fires_track_layer_instrument_then_note() {
        let mut t = TestContext::new();
        AtomSubparser.parse("~V2,L1,I40,C5Q", &mut t.context()).unwrap();
        let events = t.events();
        assert_eq!(events[0], ParserEvent::TrackChanged(2));
        assert_eq!(events[1], ParserEvent::LayerChanged(1));
        assert_eq!(events[2], ParserEvent::InstrumentParsed(40));
        assert!(matches!(&events[3], ParserEvent::NoteParsed(n) if n.value == 60 && n.is_first));
    }

    #[test]
    fn rejects_malformed_atoms() {
        let mut t = TestContext::new();
        assert!(AtomSubparser.parse("~X1,C", &mut t.context()).is_err());
        assert!(AtomSubparser.parse("~V1,C5Z", &mut t.context()).is_err());
    }
}
