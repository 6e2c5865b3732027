//! Writes parser events back out as notation.

use log::debug;

use crate::dictionary::{INSTRUMENT_NAMES, PERCUSSION_TRACK};
use crate::event::{Listener, ParserEvent};
use crate::theory::{Key, Note, TimeSignature};

use super::Pattern;

/// Re-serializes events into a [`Pattern`].
#[derive(Debug, Default)]
pub struct StaccatoListener {
    pattern: Pattern,
    track: u8,
}

impl StaccatoListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn into_pattern(self) -> Pattern {
        self.pattern
    }

    fn push(&mut self, fragment: String) {
        self.pattern.push(fragment);
    }

    /// Attach harmonic and melodic notes to the previous fragment.
    fn push_note(&mut self, text: String, note: &Note) {
        let connector = if note.is_harmonic {
            Some('+')
        } else if note.is_melodic {
            Some('_')
        } else {
            None
        };
        match (connector, self.pattern.last_mut()) {
            (Some(connector), Some(last)) => {
                last.push(connector);
                last.push_str(&text);
            }
            _ => self.push(text),
        }
    }

    fn note_text(&self, note: &Note) -> String {
        if self.track == PERCUSSION_TRACK {
            note.percussion_pattern()
        } else {
            note.pattern()
        }
    }
}

/// `&word`, or `&(several words)` when the text has spaces.
fn text_fragment(prefix: char, text: &str) -> String {
    if text.contains(char::is_whitespace) {
        format!("{prefix}({text})")
    } else {
        format!("{prefix}{text}")
    }
}

impl Listener for StaccatoListener {
    fn on_event(&mut self, event: &ParserEvent) {
        match event {
            ParserEvent::TrackChanged(track) => {
                self.track = *track;
                self.push(format!("V{track}"));
            }
            ParserEvent::LayerChanged(layer) => self.push(format!("L{layer}")),
            ParserEvent::InstrumentParsed(program) => {
                let fragment = match INSTRUMENT_NAMES.get(*program as usize) {
                    Some(name) => format!("I[{name}]"),
                    None => format!("I{program}"),
                };
                self.push(fragment);
            }
            ParserEvent::TempoChanged(bpm) => self.push(format!("T{bpm}")),
            ParserEvent::KeySignatureParsed { signature, mode } => {
                self.push(format!("KEY:{}", Key::from_signature(*signature, *mode)))
            }
            ParserEvent::TimeSignatureParsed {
                numerator,
                power_of_two,
            } => {
                let time = TimeSignature::from_power_of_two(*numerator, *power_of_two);
                self.push(format!("TIME:{time}"));
            }
            ParserEvent::BarLineParsed(0) => self.push("|".to_string()),
            ParserEvent::BarLineParsed(id) => self.push(format!("|{id}")),
            ParserEvent::TrackBeatTimeBookmarkRequested(name) => self.push(format!("@#{name}")),
            ParserEvent::TrackBeatTimeRequested(time) => self.push(format!("@{time}")),
            ParserEvent::PitchWheelParsed { .. } => {
                if let Some(value) = event.pitch_wheel_value() {
                    self.push(format!(":PW({value})"));
                }
            }
            ParserEvent::ChannelPressureParsed(pressure) => self.push(format!(":CP({pressure})")),
            ParserEvent::PolyphonicPressureParsed { key, pressure } => {
                self.push(format!(":PP({key},{pressure})"))
            }
            ParserEvent::SystemExclusiveParsed(bytes) => {
                let bytes: Vec<String> = bytes.iter().map(u8::to_string).collect();
                self.push(format!(":SX({})", bytes.join(",")));
            }
            ParserEvent::ControllerEventParsed { controller, value } => {
                self.push(format!(":CE({controller},{value})"))
            }
            ParserEvent::LyricParsed(text) => self.push(text_fragment('&', text)),
            ParserEvent::MarkerParsed(text) => self.push(text_fragment('!', text)),
            ParserEvent::FunctionParsed { id, message } => self.push(format!(":{id}({message})")),
            ParserEvent::NoteParsed(note) => {
                let text = self.note_text(note);
                self.push_note(text, note);
            }
            ParserEvent::ChordParsed(chord) => self.push_note(chord.pattern(), &chord.root),
            // Markers already carry their bookmark when read back.
            ParserEvent::TrackBeatTimeBookmarked(_)
            | ParserEvent::BeforeParsingStarts
            | ParserEvent::AfterParsingFinished => {}
            other => debug!("staccato listener ignores {}", other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::StaccatoParser;

    fn rewrite(notation: &str) -> String {
        let mut parser = StaccatoParser::new();
        let (_, listener) = parser.bus().add(StaccatoListener::new());
        parser.parse(notation).unwrap();
        let text = listener.borrow().pattern().to_string();
        text
    }

    #[test]
    fn header_events() {
        assert_eq!(
            rewrite("V1 L2 I[FLUTE] T90 KEY:DMIN TIME:3/4"),
            "V1 L2 I[FLUTE] T90 KEY:DMIN TIME:3/4"
        );
    }

    #[test]
    fn notes_and_connectors() {
        assert_eq!(rewrite("C5Q E5Q+G5Q"), "C5q E5q+G5q");
        assert_eq!(rewrite("C5Q+E5Q_G5Q"), "C5q+E5q_G5q");
    }

    #[test]
    fn functions_and_text() {
        assert_eq!(
            rewrite(":CE(7,100) :PW(8192) &(la la) !verse :FOO(x)"),
            ":CE(7,100) :PW(8192) &(la la) !verse :FOO(x)"
        );
    }

    #[test]
    fn bars_and_time_requests() {
        assert_eq!(rewrite("| |4 @1.5 @#verse"), "| |4 @1.5 @#verse");
    }

    #[test]
    fn percussion_track_uses_names() {
        let mut listener = StaccatoListener::new();
        listener.on_event(&ParserEvent::TrackChanged(9));
        let mut note = Note::new(36).with_duration(0.25);
        note.is_first = true;
        listener.on_event(&ParserEvent::NoteParsed(note));
        assert_eq!(listener.pattern().to_string(), "V9 [BASS_DRUM]q");
    }

    #[test]
    fn instrument_out_of_table_uses_number() {
        let mut listener = StaccatoListener::new();
        listener.on_event(&ParserEvent::InstrumentParsed(200));
        assert_eq!(listener.pattern().to_string(), "I200");
    }
}
