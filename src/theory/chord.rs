//! Chords: a root note, an interval pattern and an inversion.

use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{Result, StaccatoError};
use crate::parser::note::NoteElement;
use crate::parser::ParserConfig;

use super::intervals::Intervals;
use super::note::{duration_string, tone_string_without_octave, Note, OCTAVE};

const STANDARD_CHORDS: &[(&str, &str)] = &[
    ("MAJ", "1 3 5"),
    ("MAJ6", "1 3 5 6"),
    ("MAJ7", "1 3 5 7"),
    ("MAJ9", "1 3 5 7 9"),
    ("ADD9", "1 3 5 9"),
    ("MAJ6%9", "1 3 5 6 9"),
    ("MAJ7%6", "1 3 5 6 7"),
    ("MAJ13", "1 3 5 7 9 13"),
    ("MIN", "1 b3 5"),
    ("MIN6", "1 b3 5 6"),
    ("MIN7", "1 b3 5 b7"),
    ("MIN9", "1 b3 5 b7 9"),
    ("MIN11", "1 b3 5 b7 9 11"),
    ("MIN7%11", "1 b3 5 b7 11"),
    ("MINADD9", "1 b3 5 9"),
    ("MIN6%9", "1 b3 5 6"),
    ("MINMAJ7", "1 b3 5 7"),
    ("MINMAJ9", "1 b3 5 7 9"),
    ("DOM7", "1 3 5 b7"),
    ("DOM7%6", "1 3 5 6 b7"),
    ("DOM7%11", "1 3 5 b7 11"),
    ("DOM7SUS", "1 4 5 b7"),
    ("DOM7%6SUS", "1 4 5 6 b7"),
    ("DOM9", "1 3 5 b7 9"),
    ("DOM11", "1 3 5 b7 9 11"),
    ("DOM13", "1 3 5 b7 9 13"),
    ("DOM13SUS", "1 3 5 b7 11 13"),
    ("DOM7%6%11", "1 3 5 b7 9 11 13"),
    ("AUG", "1 3 #5"),
    ("AUG7", "1 3 #5 b7"),
    ("DIM", "1 b3 b5"),
    ("DIM7", "1 b3 b5 6"),
    ("SUS4", "1 4 5"),
    ("SUS2", "1 2 5"),
];

const HUMAN_READABLE: &[(&str, &str)] = &[("MAJ6%9", "6/9"), ("MAJ7%6", "7/6")];

static STANDARD_TABLE: Lazy<ChordTable> = Lazy::new(ChordTable::build_standard);

/// Named chord shapes, ordered longest name first, then alphabetically.
///
/// The order decides both which name the note parser matches and which name
/// wins when several shapes share an interval pattern.
#[derive(Debug, Clone)]
pub struct ChordTable {
    entries: Vec<(String, Intervals)>,
}

impl ChordTable {
    /// The built-in chord shapes.
    pub fn standard() -> Self {
        STANDARD_TABLE.clone()
    }

    /// Shared reference to the built-in table.
    pub fn standard_ref() -> &'static ChordTable {
        &STANDARD_TABLE
    }

    fn build_standard() -> Self {
        let mut table = Self {
            entries: Vec::new(),
        };
        for (name, pattern) in STANDARD_CHORDS {
            if let Ok(intervals) = Intervals::new(pattern) {
                table.entries.push((name.to_string(), intervals));
            }
        }
        table.sort();
        table
    }

    /// Add or replace a chord shape.
    pub fn add(&mut self, name: &str, pattern: &str) -> Result<()> {
        let intervals = Intervals::new(pattern)?;
        let name = name.to_uppercase();
        self.entries.retain(|(n, _)| *n != name);
        self.entries.push((name, intervals));
        self.sort();
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        let name = name.to_uppercase();
        self.entries.retain(|(n, _)| *n != name);
        before != self.entries.len()
    }

    pub fn intervals(&self, name: &str) -> Option<&Intervals> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, intervals)| intervals)
    }

    /// First chord name (in table order) whose pattern equals `intervals`.
    pub fn chord_type(&self, intervals: &Intervals) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, i)| i == intervals)
            .map(|(n, _)| n.as_str())
    }

    /// Longest chord name that `text` starts with.
    pub fn match_prefix(&self, text: &str) -> Option<(&str, &Intervals)> {
        self.entries
            .iter()
            .find(|(n, _)| text.starts_with(n.as_str()))
            .map(|(n, i)| (n.as_str(), i))
    }

    /// Names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    fn sort(&mut self) {
        self.entries
            .sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    }
}

impl Default for ChordTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Friendlier display name for the more cryptic chord names.
pub fn human_readable_name(name: &str) -> &str {
    HUMAN_READABLE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, h)| *h)
        .unwrap_or(name)
}

/// A chord built on `root`.
#[derive(Debug, Clone)]
pub struct Chord {
    pub root: Note,
    pub intervals: Intervals,
    pub inversion: usize,
    name: Option<String>,
}

impl Chord {
    /// A chord from a root and intervals; the name is resolved against the
    /// standard table when the chord is rendered.
    pub fn new(root: Note, intervals: Intervals) -> Self {
        Self {
            root,
            intervals,
            inversion: 0,
            name: None,
        }
    }

    /// A chord whose name is already known (as written in notation).
    pub fn named(root: Note, name: impl Into<String>, intervals: Intervals) -> Self {
        Self {
            root,
            intervals,
            inversion: 0,
            name: Some(name.into()),
        }
    }

    /// Parse chord notation such as `C4maj^^` with the default configuration.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, &ParserConfig::default())
    }

    /// Parse chord notation with an explicit configuration.
    pub fn parse_with(text: &str, config: &ParserConfig) -> Result<Self> {
        let upper = text.to_uppercase();
        let reader = config.note_reader();
        let (elements, consumed) = reader.read(&upper)?;
        match elements.into_iter().next() {
            Some(NoteElement::Chord(chord)) if consumed == upper.len() => Ok(chord),
            _ => Err(StaccatoError::invalid("chord", text)),
        }
    }

    /// Identify a chord from a space-separated list of notes, e.g. `"E4 G4 C5"`.
    pub fn from_note_string(notes: &str) -> Result<Self> {
        let config = ParserConfig::default();
        let reader = config.note_reader();
        let mut parsed = Vec::new();
        for text in notes.split_whitespace() {
            let upper = text.to_uppercase();
            let (elements, _) = reader.read(&upper)?;
            for element in elements {
                if let NoteElement::Note(note) = element {
                    parsed.push(note);
                }
            }
        }
        Self::from_notes(&parsed, &config)
    }

    /// Identify the chord formed by `notes`.
    ///
    /// The lowest note is the bass. Pitch classes are tried as roots in
    /// order; the first rotation whose intervals name a chord wins, and the
    /// bass becomes an inversion when it is not the root.
    pub fn from_notes(notes: &[Note], config: &ParserConfig) -> Result<Self> {
        let text = chord_text_from_notes(notes, &config.chords)
            .ok_or_else(|| StaccatoError::invalid("chord notes", describe(notes)))?;
        Self::parse_with(&text, config)
    }

    pub fn set_inversion(&mut self, inversion: usize) -> &mut Self {
        self.inversion = inversion;
        self
    }

    /// Set the inversion from the pitch class of the desired bass note.
    pub fn set_bass_note(&mut self, bass: &Note) -> &mut Self {
        let root = self.root.value as i32;
        for (i, steps) in self.intervals.half_steps().iter().enumerate() {
            if (bass.value as i32).rem_euclid(12) == (root + steps).rem_euclid(12) {
                self.inversion = i;
            }
        }
        self
    }

    /// The lowest sounding note.
    pub fn bass_note(&self) -> Note {
        let steps = self.intervals.half_steps();
        let index = self.inversion.min(steps.len().saturating_sub(1));
        let value = (self.root.value as i32 + steps.get(index).copied().unwrap_or(0))
            .rem_euclid(OCTAVE as i32) as u8;
        let mut bass = Note::new(self.root.octave() * OCTAVE + value);
        bass.original = Some(tone_string_without_octave(value).to_string());
        bass.octave_explicit = self.root.octave_explicit;
        bass
    }

    /// The chord's notes, bass first.
    ///
    /// The first `inversion` notes are raised an octave and rotated to the
    /// end. The first returned note keeps the root's role in the harmonic
    /// group; the others are harmonic.
    pub fn notes(&self) -> Vec<Note> {
        let steps = self.intervals.half_steps();
        let mut notes = Vec::with_capacity(steps.len());
        notes.push(self.root.clone());
        for i in 1..steps.len() {
            let value = (self.root.value as i32 + steps[i]).clamp(0, 127) as u8;
            let mut note = Note::new(value);
            note.duration = self.root.duration;
            note.duration_explicit = self.root.duration_explicit;
            note.on_velocity = self.root.on_velocity;
            note.off_velocity = self.root.off_velocity;
            note.octave_explicit = self.root.octave_explicit;
            note.is_start_of_tie = self.root.is_start_of_tie;
            note.is_end_of_tie = self.root.is_end_of_tie;
            if !self.root.octave_explicit {
                note.original = Some(tone_string_without_octave(value).to_string());
            }
            notes.push(note);
        }

        for note in notes.iter_mut().take(self.inversion) {
            note.value = note.value.saturating_add(OCTAVE).min(127);
        }
        let len = notes.len();
        notes.rotate_left(self.inversion % len.max(1));

        for (i, note) in notes.iter_mut().enumerate() {
            if i == 0 {
                note.is_first = self.root.is_first;
                note.is_melodic = self.root.is_melodic;
                note.is_harmonic = self.root.is_harmonic;
            } else {
                note.is_first = false;
                note.is_melodic = false;
                note.is_harmonic = true;
            }
        }
        notes
    }

    /// Chord name as written, or as found in the standard table.
    pub fn chord_type(&self) -> Option<&str> {
        match &self.name {
            Some(name) => Some(name.as_str()),
            None => ChordTable::standard_ref().chord_type(&self.intervals),
        }
    }

    pub fn human_readable_type(&self) -> Option<&str> {
        self.chord_type().map(human_readable_name)
    }

    pub fn is_major(&self) -> bool {
        self.intervals.to_string() == "1 3 5"
    }

    pub fn is_minor(&self) -> bool {
        self.intervals.to_string() == "1 b3 5"
    }

    /// Chord notation: root, name, carets, duration and velocities.
    /// Unnamed shapes fall back to their notes joined with `+`.
    pub fn pattern(&self) -> String {
        let Some(name) = self.chord_type() else {
            return self.pattern_with_notes();
        };
        let mut out = if self.root.is_percussion {
            crate::theory::note::percussion_string(self.root.value)
        } else {
            self.root.tone_name()
        };
        out.push_str(name);
        out.push_str(&"^".repeat(self.inversion));
        if self.root.is_end_of_tie {
            out.push('-');
        }
        if self.root.duration_explicit {
            out.push_str(&duration_string(self.root.duration));
        }
        if self.root.is_start_of_tie {
            out.push('-');
        }
        out.push_str(&self.root.velocity_string());
        out
    }

    /// All notes joined with `+`.
    pub fn pattern_with_notes(&self) -> String {
        join_patterns(self.notes().iter())
    }

    /// Notes other than the root's pitch class, joined with `+`.
    pub fn pattern_without_root(&self) -> String {
        let root = self.root.position_in_octave();
        join_patterns(
            self.notes()
                .iter()
                .filter(|n| n.position_in_octave() != root),
        )
    }

    /// Notes other than the bass note's pitch class, joined with `+`.
    pub fn pattern_without_bass(&self) -> String {
        let notes = self.notes();
        let bass = notes.first().map(Note::position_in_octave);
        join_patterns(
            notes
                .iter()
                .filter(|n| Some(n.position_in_octave()) != bass),
        )
    }
}

impl PartialEq for Chord {
    fn eq(&self, other: &Self) -> bool {
        self.root.value == other.root.value
            && self.intervals == other.intervals
            && self.inversion == other.inversion
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern())
    }
}

fn join_patterns<'a>(notes: impl Iterator<Item = &'a Note>) -> String {
    notes.map(Note::pattern).collect::<Vec<_>>().join("+")
}

fn describe(notes: &[Note]) -> String {
    notes.iter().map(Note::pattern).collect::<Vec<_>>().join(" ")
}

/// Chord notation for a set of notes, or None when no rotation names a chord.
fn chord_text_from_notes(notes: &[Note], table: &ChordTable) -> Option<String> {
    let mut sorted: Vec<Note> = notes.to_vec();
    sorted.sort_by_key(|n| n.value);
    let bass = sorted.first()?.clone();
    let highest = sorted.last()?.value;
    let without_octaves = highest - bass.value > OCTAVE;

    sorted.sort_by_key(Note::position_in_octave);
    let mut classes: Vec<Note> = Vec::new();
    for note in sorted {
        if !classes
            .iter()
            .any(|n| n.position_in_octave() == note.position_in_octave())
        {
            classes.push(note);
        }
    }

    for i in 0..classes.len() {
        let mut rotation = classes.clone();
        rotation.rotate_left(i);
        let Some(name) = table.chord_type(&Intervals::from_notes(&rotation)) else {
            continue;
        };
        let root = &rotation[0];
        let mut text = if without_octaves {
            tone_string_without_octave(root.value).to_string()
        } else {
            root.pattern()
        };
        text.push_str(name);
        if root.value != bass.value {
            text.push('^');
            text.push_str(&bass.pattern());
        }
        return Some(text);
    }
    None
}
