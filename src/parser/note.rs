//! Notes, rests and chords: `C5Q`, `EB4MAJ^^H.A80`, `[BASS_DRUM]I`, `C+E_G`.
//!
//! A fragment is one or more note elements joined by `+` (harmonic) or `_`
//! (melodic) connectors. The reader expects upper-case input.

use crate::config::NoteSettings;
use crate::dictionary::{percussion_name, Dictionary};
use crate::error::{Result, StaccatoError};
use crate::theory::note::OCTAVE;
use crate::theory::{Chord, ChordTable, Key, Note};

use super::{ParseContext, Subparser};

/// Semitone position of each natural note letter.
fn letter_position(letter: u8) -> Option<u8> {
    match letter {
        b'C' => Some(0),
        b'D' => Some(2),
        b'E' => Some(4),
        b'F' => Some(5),
        b'G' => Some(7),
        b'A' => Some(9),
        b'B' => Some(11),
        _ => None,
    }
}

/// Whole-note fraction of a duration letter.
pub(crate) fn letter_duration(letter: u8) -> Option<f64> {
    match letter {
        b'W' => Some(1.0),
        b'H' => Some(0.5),
        b'Q' => Some(0.25),
        b'I' => Some(0.125),
        b'S' => Some(0.0625),
        b'T' => Some(0.03125),
        b'X' => Some(0.015625),
        b'O' => Some(0.0078125),
        _ => None,
    }
}

/// A note or chord read from notation.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteElement {
    Note(Note),
    Chord(Chord),
}

impl NoteElement {
    /// The note carrying duration, velocity and connector roles.
    pub fn lead(&self) -> &Note {
        match self {
            NoteElement::Note(note) => note,
            NoteElement::Chord(chord) => &chord.root,
        }
    }

    fn lead_mut(&mut self) -> &mut Note {
        match self {
            NoteElement::Note(note) => note,
            NoteElement::Chord(chord) => &mut chord.root,
        }
    }
}

/// Reads note fragments against a set of defaults, a key and lookup tables.
#[derive(Debug, Clone, Copy)]
pub struct NoteReader<'a> {
    settings: NoteSettings,
    key: Key,
    dictionary: &'a Dictionary,
    chords: &'a ChordTable,
}

impl<'a> NoteReader<'a> {
    pub fn new(
        settings: NoteSettings,
        key: Key,
        dictionary: &'a Dictionary,
        chords: &'a ChordTable,
    ) -> Self {
        Self {
            settings,
            key,
            dictionary,
            chords,
        }
    }

    /// Read connected note elements from the start of `text`.
    ///
    /// Returns the elements and the number of bytes consumed. Reading stops
    /// at the first character that cannot continue a note.
    pub fn read(&self, text: &str) -> Result<(Vec<NoteElement>, usize)> {
        let mut scanner = Scanner::new(text);
        let mut elements = Vec::new();
        let mut connector = None;
        loop {
            let mut element = self.read_element(&mut scanner, text)?;
            let lead = element.lead_mut();
            match connector {
                None => lead.is_first = true,
                Some(b'+') => lead.is_harmonic = true,
                Some(_) => lead.is_melodic = true,
            }
            elements.push(element);

            match scanner.peek() {
                Some(c @ (b'+' | b'_')) if scanner.peek_at(1).is_some_and(starts_note) => {
                    scanner.bump();
                    connector = Some(c);
                }
                _ => break,
            }
        }
        Ok((elements, scanner.pos))
    }

    fn read_element(&self, scanner: &mut Scanner<'_>, text: &str) -> Result<NoteElement> {
        let start = scanner.pos;
        let Some(first) = scanner.peek() else {
            return Err(StaccatoError::syntax("expected a note", text));
        };

        let mut note = match first {
            b'R' => {
                scanner.bump();
                let mut rest = Note::new(0);
                rest.is_rest = true;
                rest.original = Some("R".to_string());
                rest
            }
            b'[' => self.read_bracketed(scanner, text)?,
            b'0'..=b'9' => {
                let digits = scanner.take_digits();
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| StaccatoError::syntax("bad note number", text))?;
                let mut note = Note::new(StaccatoError::check_u8("note", value, 0, 127)?);
                note.octave_explicit = true;
                note
            }
            _ => self.read_letter(scanner, text)?,
        };
        note.on_velocity = self.settings.default_on_velocity;
        note.off_velocity = self.settings.default_off_velocity;

        let chord = if note.is_rest {
            None
        } else {
            self.chords
                .match_prefix(scanner.rest())
                .map(|(name, intervals)| (name.to_string(), intervals.clone()))
        };

        let mut inversion = None;
        if let Some((name, _)) = &chord {
            scanner.pos += name.len();
            if !note.octave_explicit {
                let shift = (self.settings.default_chord_octave as i64
                    - self.settings.default_octave as i64)
                    * OCTAVE as i64;
                note.value = StaccatoError::check_u8("note", note.value as i64 + shift, 0, 127)?;
            }
            inversion = Some(self.read_inversion(scanner, text)?);
        }

        self.read_duration(scanner, &mut note, text)?;
        self.read_velocities(scanner, &mut note, text)?;
        if scanner.pos == start {
            return Err(StaccatoError::syntax("expected a note", text));
        }

        Ok(match chord {
            Some((name, intervals)) => {
                let mut chord = Chord::named(note, name, intervals);
                match inversion {
                    Some(Inversion::Count(n)) => {
                        chord.set_inversion(n);
                    }
                    Some(Inversion::Bass(bass)) => {
                        chord.set_bass_note(&bass);
                    }
                    None => {}
                }
                NoteElement::Chord(chord)
            }
            None => NoteElement::Note(note),
        })
    }

    fn read_bracketed(&self, scanner: &mut Scanner<'_>, text: &str) -> Result<Note> {
        scanner.bump();
        let inner = scanner.take_while(|c| c != b']');
        if !scanner.eat(b']') {
            return Err(StaccatoError::syntax("unclosed '['", text));
        }
        let value = if inner.bytes().all(|c| c.is_ascii_digit()) && !inner.is_empty() {
            inner
                .parse::<i64>()
                .map_err(|_| StaccatoError::syntax("bad note number", text))?
        } else {
            self.dictionary.require("note", inner)? as i64
        };
        let mut note = Note::new(StaccatoError::check_u8("note", value, 0, 127)?);
        note.octave_explicit = true;
        note.is_percussion = percussion_name(note.value).is_some_and(|name| name == inner);
        Ok(note)
    }

    fn read_letter(&self, scanner: &mut Scanner<'_>, text: &str) -> Result<Note> {
        let start = scanner.pos;
        let letter = scanner
            .peek()
            .ok_or_else(|| StaccatoError::syntax("expected a note", text))?;
        let position = letter_position(letter)
            .ok_or_else(|| StaccatoError::syntax("expected a note letter", text))?;
        scanner.bump();

        let offset = match scanner.peek() {
            Some(b'#') => {
                scanner.bump();
                1
            }
            Some(b'B') => {
                scanner.bump();
                -1
            }
            Some(b'N') => {
                scanner.bump();
                0
            }
            _ if self.settings.adjust_for_key => self.key.accidental_for(letter as char) as i64,
            _ => 0,
        };

        let octave = scanner.take_octave();
        let octave_explicit = octave.is_some();
        let octave = octave.unwrap_or(self.settings.default_octave) as i64;
        let value = octave * OCTAVE as i64 + position as i64 + offset;
        let mut note = Note::new(StaccatoError::check_u8("note", value, 0, 127)?);
        note.octave_explicit = octave_explicit;
        note.original = Some(text[start..scanner.pos].to_string());
        Ok(note)
    }

    fn read_inversion(&self, scanner: &mut Scanner<'_>, text: &str) -> Result<Inversion> {
        let mut carets = 0;
        while scanner.eat(b'^') {
            if scanner.peek().is_some_and(|c| letter_position(c).is_some()) {
                let bass = self.read_letter(scanner, text)?;
                return Ok(Inversion::Bass(bass));
            }
            carets += 1;
        }
        Ok(Inversion::Count(carets))
    }

    fn read_duration(&self, scanner: &mut Scanner<'_>, note: &mut Note, text: &str) -> Result<()> {
        if scanner.peek() == Some(b'-') && !note.is_rest {
            scanner.bump();
            note.is_end_of_tie = true;
        }

        let mut duration = 0.0;
        let mut found = false;
        if scanner.eat(b'/') {
            let literal = scanner.take_while(|c| c.is_ascii_digit() || c == b'.');
            duration = literal
                .parse::<f64>()
                .map_err(|_| StaccatoError::syntax("bad duration", text))?;
            found = true;
        } else {
            while let Some(base) = scanner.peek().and_then(letter_duration) {
                scanner.bump();
                let mut value = base;
                let digits = scanner.take_digits();
                if !digits.is_empty() {
                    value *= digits
                        .parse::<f64>()
                        .map_err(|_| StaccatoError::syntax("bad duration", text))?;
                }
                while scanner.eat(b'.') {
                    value *= 1.5;
                }
                duration += value;
                found = true;
            }
        }

        if found && scanner.eat(b'*') {
            let numerator = scanner.take_digits();
            let (n, m) = if numerator.is_empty() {
                (3.0, 2.0)
            } else {
                let n = numerator
                    .parse::<f64>()
                    .map_err(|_| StaccatoError::syntax("bad tuplet", text))?;
                if !scanner.eat(b':') {
                    return Err(StaccatoError::syntax("tuplet needs n:m", text));
                }
                let m = scanner
                    .take_digits()
                    .parse::<f64>()
                    .map_err(|_| StaccatoError::syntax("bad tuplet", text))?;
                (n, m)
            };
            if n == 0.0 {
                return Err(StaccatoError::syntax("bad tuplet", text));
            }
            duration *= m / n;
        }

        if found {
            note.set_duration(duration);
            if scanner.peek() == Some(b'-') && !note.is_rest {
                scanner.bump();
                note.is_start_of_tie = true;
            }
        }
        Ok(())
    }

    fn read_velocities(&self, scanner: &mut Scanner<'_>, note: &mut Note, text: &str) -> Result<()> {
        loop {
            let which = match scanner.peek() {
                Some(c @ (b'A' | b'D')) if scanner.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => c,
                _ => return Ok(()),
            };
            scanner.bump();
            let value = scanner
                .take_digits()
                .parse::<i64>()
                .map_err(|_| StaccatoError::syntax("bad velocity", text))?;
            let value = StaccatoError::check_u8("velocity", value, 0, 127)?;
            if which == b'A' {
                note.on_velocity = value;
            } else {
                note.off_velocity = value;
            }
        }
    }
}

enum Inversion {
    Count(usize),
    Bass(Note),
}

/// Whether a fragment starting with `c` can be a note, chord or rest.
pub(crate) fn starts_note(c: u8) -> bool {
    matches!(c, b'A'..=b'G' | b'R' | b'[' | b'0'..=b'9')
}

struct Scanner<'s> {
    text: &'s str,
    pos: usize,
}

impl<'s> Scanner<'s> {
    fn new(text: &'s str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + n).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn rest(&self) -> &'s str {
        self.text.get(self.pos..).unwrap_or_default()
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'s str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }

    fn take_digits(&mut self) -> &'s str {
        self.take_while(|c| c.is_ascii_digit())
    }

    /// An octave of 0-10.
    fn take_octave(&mut self) -> Option<u8> {
        let first = self.peek().filter(u8::is_ascii_digit)?;
        if first == b'1' && self.peek_at(1) == Some(b'0') {
            self.pos += 2;
            return Some(10);
        }
        self.pos += 1;
        Some(first - b'0')
    }
}

/// Notes, rests and chords.
pub struct NoteSubparser;

impl Subparser for NoteSubparser {
    fn matches(&self, fragment: &str) -> bool {
        fragment.bytes().next().is_some_and(starts_note)
    }

    fn parse(&self, fragment: &str, context: &mut ParseContext<'_>) -> Result<usize> {
        let (elements, consumed) = context.note_reader().read(fragment)?;
        for element in elements {
            match element {
                NoteElement::Note(note) => context.bus.fire_note_parsed(note),
                NoteElement::Chord(chord) => context.bus.fire_chord_parsed(chord),
            }
        }
        Ok(consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn read(text: &str) -> Vec<NoteElement> {
        read_with(text, Key::default())
    }

    fn read_with(text: &str, key: Key) -> Vec<NoteElement> {
        let dictionary = Dictionary::standard();
        let chords = ChordTable::standard();
        let reader = NoteReader::new(NoteSettings::default(), key, &dictionary, &chords);
        let (elements, consumed) = reader.read(text).unwrap();
        assert_eq!(consumed, text.len(), "{text}");
        elements
    }

    fn note(text: &str) -> Note {
        match read(text).remove(0) {
            NoteElement::Note(note) => note,
            other => panic!("expected a note, got {other:?}"),
        }
    }

    fn chord(text: &str) -> Chord {
        match read(text).remove(0) {
            NoteElement::Chord(chord) => chord,
            other => panic!("expected a chord, got {other:?}"),
        }
    }

    #[test]
    fn plain_letters_use_default_octave() {
        assert_eq!(note("C").value, 60);
        assert_eq!(note("A").value, 69);
        assert!(!note("C").octave_explicit);
        assert!(!note("C").duration_explicit);
        assert_eq!(note("C").duration, 0.0);
    }

    #[test]
    fn octaves_and_accidentals() {
        assert_eq!(note("C4").value, 48);
        assert_eq!(note("C10").value, 120);
        assert_eq!(note("C#5").value, 61);
        assert_eq!(note("EB4").value, 51);
        assert_eq!(note("BB").value, 70);
        assert_eq!(note("C4").original.as_deref(), Some("C4"));
        assert!(note("C4").octave_explicit);
    }

    #[test]
    fn numeric_and_bracketed_notes() {
        assert_eq!(note("60").value, 60);
        assert_eq!(note("[60]").value, 60);
        let drum = note("[BASS_DRUM]Q");
        assert_eq!(drum.value, 36);
        assert!(drum.is_percussion);
        assert_approx_eq!(drum.duration, 0.25);
    }

    #[test]
    fn unknown_bracket_name_is_lookup_error() {
        let dictionary = Dictionary::standard();
        let chords = ChordTable::standard();
        let reader = NoteReader::new(NoteSettings::default(), Key::default(), &dictionary, &chords);
        let err = reader.read("[NOPE]").unwrap_err();
        assert!(matches!(err, StaccatoError::Lookup { .. }));
    }

    #[test]
    fn note_number_out_of_range() {
        let dictionary = Dictionary::standard();
        let chords = ChordTable::standard();
        let reader = NoteReader::new(NoteSettings::default(), Key::default(), &dictionary, &chords);
        assert!(matches!(
            reader.read("128").unwrap_err(),
            StaccatoError::OutOfRange { .. }
        ));
    }

    #[test]
    fn durations() {
        assert_approx_eq!(note("CW").duration, 1.0);
        assert_approx_eq!(note("CH.").duration, 0.75);
        assert_approx_eq!(note("CHQ").duration, 0.75);
        assert_approx_eq!(note("CW3").duration, 3.0);
        assert_approx_eq!(note("C/0.125").duration, 0.125);
        assert_approx_eq!(note("CQ*").duration, 0.25 * 2.0 / 3.0);
        assert_approx_eq!(note("CQ*5:4").duration, 0.2);
        assert!(note("CQ").duration_explicit);
    }

    #[test]
    fn ties() {
        let start = note("C5Q-");
        assert!(start.is_start_of_tie && !start.is_end_of_tie);
        let end = note("C5-Q");
        assert!(end.is_end_of_tie && !end.is_start_of_tie);
        let both = note("C5-Q-");
        assert!(both.is_end_of_tie && both.is_start_of_tie);
    }

    #[test]
    fn velocities() {
        let n = note("C5QA100D20");
        assert_eq!(n.on_velocity, 100);
        assert_eq!(n.off_velocity, 20);
        assert_eq!(note("C").on_velocity, 64);
    }

    #[test]
    fn rests() {
        let r = note("RW");
        assert!(r.is_rest);
        assert_approx_eq!(r.duration, 1.0);
    }

    #[test]
    fn connectors_set_roles() {
        let elements = read("C+E_G");
        let leads: Vec<&Note> = elements.iter().map(NoteElement::lead).collect();
        assert!(leads[0].is_first && !leads[0].is_harmonic);
        assert!(leads[1].is_harmonic && !leads[1].is_first);
        assert!(leads[2].is_melodic && !leads[2].is_harmonic);
    }

    #[test]
    fn chords_use_chord_octave() {
        let c = chord("CMAJ");
        assert_eq!(c.root.value, 48);
        assert_eq!(c.chord_type(), Some("MAJ"));
        let c = chord("C5MAJ7W");
        assert_eq!(c.root.value, 60);
        assert_approx_eq!(c.root.duration, 1.0);
    }

    #[test]
    fn chord_names_win_over_durations() {
        assert_eq!(chord("CSUS4").chord_type(), Some("SUS4"));
        assert_approx_eq!(note("CS").duration, 0.0625);
        assert_eq!(chord("CDIM").chord_type(), Some("DIM"));
    }

    #[test]
    fn flat_root_before_chord_name() {
        let c = chord("BBMIN");
        assert_eq!(c.root.value, 58);
        assert_eq!(c.chord_type(), Some("MIN"));
    }

    #[test]
    fn chord_inversions() {
        assert_eq!(chord("CMAJ^^").inversion, 2);
        assert_eq!(chord("CMAJ^E").inversion, 1);
        let c = chord("CMAJ^GH");
        assert_eq!(c.inversion, 2);
        assert_approx_eq!(c.root.duration, 0.5);
    }

    #[test]
    fn key_adjusts_bare_letters() {
        let g = Key::parse("GMAJ").unwrap();
        let lead = |text: &str| read_with(text, g)[0].lead().value;
        assert_eq!(lead("F"), 66);
        assert_eq!(lead("FN"), 65);
        assert_eq!(lead("F#"), 66);
        assert_eq!(lead("C"), 60);
    }

    #[test]
    fn stops_at_unknown_characters() {
        let dictionary = Dictionary::standard();
        let chords = ChordTable::standard();
        let reader = NoteReader::new(NoteSettings::default(), Key::default(), &dictionary, &chords);
        let (elements, consumed) = reader.read("C5QZ").unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(consumed, 3);
    }
}
