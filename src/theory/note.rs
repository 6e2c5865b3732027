//! Note value object and its textual forms.

use std::fmt;

use crate::dictionary::percussion_name;

/// Velocity used when a note does not specify one.
pub const DEFAULT_VELOCITY: u8 = 64;

/// Semitones per octave.
pub const OCTAVE: u8 = 12;

/// Pitch-class names used when regenerating notation.
pub const NOTE_NAMES_COMMON: [&str; 12] =
    ["C", "C#", "D", "Eb", "E", "F", "F#", "G", "G#", "A", "Bb", "B"];
pub const NOTE_NAMES_SHARP: [&str; 12] =
    ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
pub const NOTE_NAMES_FLAT: [&str; 12] =
    ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B"];

/// Frequency of MIDI note 0 in Hz.
pub const MIDI_ZERO_HZ: f64 = 8.1757989156;

/// Named durations, longest first, as (suffix, whole-note fraction).
const DURATION_NAMES: [(&str, f64); 14] = [
    ("h.", 0.75),
    ("h", 0.5),
    ("q.", 0.375),
    ("q", 0.25),
    ("i.", 0.1875),
    ("i", 0.125),
    ("s.", 0.09375),
    ("s", 0.0625),
    ("t.", 0.046875),
    ("t", 0.03125),
    ("x.", 0.0234375),
    ("x", 0.015625),
    ("o.", 0.01171875),
    ("o", 0.0078125),
];

/// A single note or rest as discovered by the parser.
///
/// `duration` is a fraction of a whole note; 0.0 means "not set yet", and the
/// time manager substitutes the configured default.
#[derive(Debug, Clone)]
pub struct Note {
    pub value: u8,
    pub duration: f64,
    pub on_velocity: u8,
    pub off_velocity: u8,
    pub is_rest: bool,
    pub octave_explicit: bool,
    pub duration_explicit: bool,
    /// First note of a harmonic group (the left-most note of a fragment).
    pub is_first: bool,
    /// Follows the previous note in time (`_` connector).
    pub is_melodic: bool,
    /// Sounds together with the group's first note (`+` connector).
    pub is_harmonic: bool,
    pub is_percussion: bool,
    pub is_start_of_tie: bool,
    pub is_end_of_tie: bool,
    /// Notation the note was parsed from, without duration or dynamics.
    pub original: Option<String>,
}

impl Note {
    /// A sounding note with default velocities and no duration.
    pub fn new(value: u8) -> Self {
        Self {
            value: value.min(127),
            duration: 0.0,
            on_velocity: DEFAULT_VELOCITY,
            off_velocity: DEFAULT_VELOCITY,
            is_rest: false,
            octave_explicit: false,
            duration_explicit: false,
            is_first: false,
            is_melodic: false,
            is_harmonic: false,
            is_percussion: false,
            is_start_of_tie: false,
            is_end_of_tie: false,
            original: None,
        }
    }

    /// A rest lasting `duration`.
    pub fn rest(duration: f64) -> Self {
        let mut note = Self::new(0);
        note.is_rest = true;
        note.set_duration(duration);
        note
    }

    /// Builder form of [`Note::set_duration`].
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.set_duration(duration);
        self
    }

    /// Set an explicit duration.
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
        self.duration_explicit = true;
    }

    pub fn with_velocities(mut self, on: u8, off: u8) -> Self {
        self.on_velocity = on.min(127);
        self.off_velocity = off.min(127);
        self
    }

    /// True for notes that produce note-on/note-off messages.
    pub fn is_sounding(&self) -> bool {
        !self.is_rest
    }

    pub fn octave(&self) -> u8 {
        self.value / OCTAVE
    }

    pub fn position_in_octave(&self) -> u8 {
        if self.is_rest {
            0
        } else {
            self.value % OCTAVE
        }
    }

    /// Frequency of this note in Hz.
    pub fn frequency(&self) -> f64 {
        frequency(self.value as f64)
    }

    /// Tone name with the octave only if one was written, e.g. `Eb` or `Eb4`.
    pub fn tone_name(&self) -> String {
        if self.is_rest {
            return "R".to_string();
        }
        let name = NOTE_NAMES_COMMON[self.position_in_octave() as usize];
        if self.octave_explicit {
            format!("{name}{}", self.octave())
        } else {
            name.to_string()
        }
    }

    /// Regenerate notation: tone (or rest/percussion name), then duration,
    /// ties and non-default velocities. Connectors are not included.
    pub fn pattern(&self) -> String {
        let head = if self.is_rest {
            "R".to_string()
        } else if self.is_percussion {
            percussion_string(self.value)
        } else {
            self.original
                .clone()
                .unwrap_or_else(|| tone_string(self.value))
        };
        head + &self.decorators()
    }

    /// Like [`Note::pattern`], but names percussion notes regardless of flags.
    pub fn percussion_pattern(&self) -> String {
        if self.is_rest || percussion_name(self.value).is_none() {
            return self.pattern();
        }
        percussion_string(self.value) + &self.decorators()
    }

    /// Attack/decay suffix for velocities that differ from the default.
    pub fn velocity_string(&self) -> String {
        let mut out = String::new();
        if self.on_velocity != DEFAULT_VELOCITY {
            out.push_str(&format!("a{}", self.on_velocity));
        }
        if self.off_velocity != DEFAULT_VELOCITY {
            out.push_str(&format!("d{}", self.off_velocity));
        }
        out
    }

    fn decorators(&self) -> String {
        let mut out = String::new();
        if self.is_end_of_tie {
            out.push('-');
        }
        if self.duration_explicit {
            out.push_str(&duration_string(self.duration));
        }
        if self.is_start_of_tie {
            out.push('-');
        }
        out.push_str(&self.velocity_string());
        out
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        let originals_match = match (&self.original, &other.original) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => true,
        };
        originals_match
            && self.value == other.value
            && self.duration == other.duration
            && self.octave_explicit == other.octave_explicit
            && self.duration_explicit == other.duration_explicit
            && self.on_velocity == other.on_velocity
            && self.off_velocity == other.off_velocity
            && self.is_rest == other.is_rest
            && self.is_first == other.is_first
            && self.is_melodic == other.is_melodic
            && self.is_harmonic == other.is_harmonic
            && self.is_percussion == other.is_percussion
            && self.is_start_of_tie == other.is_start_of_tie
            && self.is_end_of_tie == other.is_end_of_tie
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern())
    }
}

/// Tone name plus octave for a MIDI value, e.g. 60 is `C5` and 57 is `A4`.
pub fn tone_string(value: u8) -> String {
    format!("{}{}", tone_string_without_octave(value), value / OCTAVE)
}

pub fn tone_string_without_octave(value: u8) -> &'static str {
    NOTE_NAMES_COMMON[(value % OCTAVE) as usize]
}

/// Pitch-class name preferring flats (`dispose < 0`) or sharps.
pub fn dispositioned_tone_string(dispose: i32, value: u8) -> &'static str {
    if dispose < 0 {
        NOTE_NAMES_FLAT[(value % OCTAVE) as usize]
    } else {
        NOTE_NAMES_SHARP[(value % OCTAVE) as usize]
    }
}

/// `[NAME]` for percussion notes 35-81, otherwise the tone string.
pub fn percussion_string(value: u8) -> String {
    match percussion_name(value) {
        Some(name) => format!("[{name}]"),
        None => tone_string(value),
    }
}

/// Notation for a whole-note duration: `w`, `w3`, `h.`, `q`, ... or `/0.3`.
pub fn duration_string(duration: f64) -> String {
    if duration >= 1.0 && duration.fract() == 0.0 {
        let wholes = duration as u64;
        return if wholes == 1 {
            "w".to_string()
        } else {
            format!("w{wholes}")
        };
    }
    DURATION_NAMES
        .iter()
        .find(|(_, value)| *value == duration)
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| format!("/{duration}"))
}

/// Frequency in Hz of a (possibly fractional) MIDI note value.
pub fn frequency(value: f64) -> f64 {
    MIDI_ZERO_HZ * 2f64.powf(value / 12.0)
}
