//! Key and time signatures.

use std::fmt;

use crate::error::{Result, StaccatoError};

/// Major keys by sharps (index 0..=7) and flats (index 0..=7).
const MAJOR_SHARP_KEYS: [&str; 8] = ["C", "G", "D", "A", "E", "B", "F#", "C#"];
const MAJOR_FLAT_KEYS: [&str; 8] = ["C", "F", "BB", "EB", "AB", "DB", "GB", "CB"];
const MINOR_SHARP_KEYS: [&str; 8] = ["A", "E", "B", "F#", "C#", "G#", "D#", "A#"];
const MINOR_FLAT_KEYS: [&str; 8] = ["A", "D", "G", "C", "F", "BB", "EB", "AB"];

/// Letters affected by each added sharp, in order; flats use the reverse.
const SHARP_ORDER: [char; 7] = ['F', 'C', 'G', 'D', 'A', 'E', 'B'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

impl Mode {
    /// Scale flag carried by key-signature events: 0 major, 1 minor.
    pub fn flag(self) -> u8 {
        match self {
            Mode::Major => 0,
            Mode::Minor => 1,
        }
    }

    pub fn from_flag(flag: u8) -> Self {
        if flag == 1 {
            Mode::Minor
        } else {
            Mode::Major
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Mode::Major => "MAJ",
            Mode::Minor => "MIN",
        }
    }
}

/// A key, stored as its signature (negative = flats) and mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Key {
    signature: i8,
    mode: Mode,
}

impl Key {
    /// Build from a sharps/flats count, clamped to -7..=7.
    pub fn from_signature(signature: i8, mode: Mode) -> Self {
        Self {
            signature: signature.clamp(-7, 7),
            mode,
        }
    }

    /// Parse `GMAJ`, `F#MIN`, `BBMAJ` or a bare root (major). Case-insensitive.
    pub fn parse(text: &str) -> Result<Self> {
        let upper = text.trim().to_uppercase();
        let (root, mode) = if let Some(root) = upper.strip_suffix("MAJ") {
            (root, Mode::Major)
        } else if let Some(root) = upper.strip_suffix("MIN") {
            (root, Mode::Minor)
        } else {
            (upper.as_str(), Mode::Major)
        };
        let (sharps, flats) = match mode {
            Mode::Major => (&MAJOR_SHARP_KEYS, &MAJOR_FLAT_KEYS),
            Mode::Minor => (&MINOR_SHARP_KEYS, &MINOR_FLAT_KEYS),
        };
        if let Some(i) = sharps.iter().position(|k| *k == root) {
            return Ok(Self::from_signature(i as i8, mode));
        }
        if let Some(i) = flats.iter().position(|k| *k == root) {
            return Ok(Self::from_signature(-(i as i8), mode));
        }
        Err(StaccatoError::invalid("key signature", text))
    }

    /// Sharps (positive) or flats (negative) in the signature.
    pub fn key_signature(&self) -> i8 {
        self.signature
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Pitch class of the tonic.
    pub fn root_position(&self) -> u8 {
        let major = (self.signature as i32 * 7).rem_euclid(12);
        match self.mode {
            Mode::Major => major as u8,
            Mode::Minor => (major - 3).rem_euclid(12) as u8,
        }
    }

    /// Half-step adjustment the signature applies to a bare note letter.
    pub fn accidental_for(&self, letter: char) -> i8 {
        let letter = letter.to_ascii_uppercase();
        if self.signature > 0 {
            if SHARP_ORDER[..self.signature as usize].contains(&letter) {
                return 1;
            }
        } else if self.signature < 0 {
            let count = self.signature.unsigned_abs() as usize;
            if SHARP_ORDER.iter().rev().take(count).any(|l| *l == letter) {
                return -1;
            }
        }
        0
    }

    fn root_name(&self) -> &'static str {
        let index = self.signature.unsigned_abs() as usize;
        match (self.mode, self.signature >= 0) {
            (Mode::Major, true) => MAJOR_SHARP_KEYS[index],
            (Mode::Major, false) => MAJOR_FLAT_KEYS[index],
            (Mode::Minor, true) => MINOR_SHARP_KEYS[index],
            (Mode::Minor, false) => MINOR_FLAT_KEYS[index],
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root_name(), self.mode.suffix())
    }
}

/// A time signature, e.g. 3/4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    pub beats_per_measure: u8,
    pub duration_for_beat: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            beats_per_measure: 4,
            duration_for_beat: 4,
        }
    }
}

impl TimeSignature {
    pub fn new(beats_per_measure: u8, duration_for_beat: u8) -> Self {
        Self {
            beats_per_measure,
            duration_for_beat,
        }
    }

    /// Build from the event form, where the denominator is a power of two.
    pub fn from_power_of_two(numerator: u8, power: u8) -> Self {
        Self::new(numerator, 1u8.checked_shl(power as u32).unwrap_or(0))
    }

    /// Parse `3/4`. The denominator must be a power of two.
    pub fn parse(text: &str) -> Result<Self> {
        let (num, den) = text
            .split_once('/')
            .ok_or_else(|| StaccatoError::invalid("time signature", text))?;
        let num: u8 = num
            .trim()
            .parse()
            .map_err(|_| StaccatoError::invalid("time signature", text))?;
        let den: u8 = den
            .trim()
            .parse()
            .map_err(|_| StaccatoError::invalid("time signature", text))?;
        if num == 0 || !den.is_power_of_two() {
            return Err(StaccatoError::invalid("time signature", text));
        }
        Ok(Self::new(num, den))
    }

    /// log2 of the denominator.
    pub fn power_of_two(&self) -> u8 {
        self.duration_for_beat.trailing_zeros() as u8
    }

    /// Length of one measure in whole notes.
    pub fn measure_duration(&self) -> f64 {
        self.beats_per_measure as f64 / self.duration_for_beat as f64
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats_per_measure, self.duration_for_beat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_major_keys() {
        assert_eq!(Key::parse("Cmaj").unwrap().key_signature(), 0);
        assert_eq!(Key::parse("GMAJ").unwrap().key_signature(), 1);
        assert_eq!(Key::parse("F#maj").unwrap().key_signature(), 6);
        assert_eq!(Key::parse("Bbmaj").unwrap().key_signature(), -2);
        assert_eq!(Key::parse("Eb").unwrap().key_signature(), -3);
    }

    #[test]
    fn parse_minor_keys_use_relative_major() {
        let key = Key::parse("Amin").unwrap();
        assert_eq!(key.key_signature(), 0);
        assert_eq!(key.mode(), Mode::Minor);
        assert_eq!(Key::parse("Emin").unwrap().key_signature(), 1);
        assert_eq!(Key::parse("Dmin").unwrap().key_signature(), -1);
        assert_eq!(Key::parse("Cmin").unwrap().key_signature(), -3);
    }

    #[test]
    fn unknown_key_is_invalid() {
        assert!(Key::parse("Hmaj").is_err());
    }

    #[test]
    fn root_positions() {
        assert_eq!(Key::parse("Gmaj").unwrap().root_position(), 7);
        assert_eq!(Key::parse("Fmaj").unwrap().root_position(), 5);
        assert_eq!(Key::parse("Emin").unwrap().root_position(), 4);
        assert_eq!(Key::parse("Cmin").unwrap().root_position(), 0);
    }

    #[test]
    fn accidentals() {
        let g = Key::parse("Gmaj").unwrap();
        assert_eq!(g.accidental_for('F'), 1);
        assert_eq!(g.accidental_for('C'), 0);
        let bb = Key::parse("Bbmaj").unwrap();
        assert_eq!(bb.accidental_for('B'), -1);
        assert_eq!(bb.accidental_for('E'), -1);
        assert_eq!(bb.accidental_for('A'), 0);
        assert_eq!(Key::default().accidental_for('F'), 0);
    }

    #[test]
    fn display_round_trips() {
        for name in ["CMAJ", "AMIN", "F#MAJ", "EBMAJ", "G#MIN", "BBMIN"] {
            assert_eq!(Key::parse(name).unwrap().to_string(), name);
        }
    }

    #[test]
    fn time_signature_parse() {
        let sig = TimeSignature::parse("6/8").unwrap();
        assert_eq!(sig.beats_per_measure, 6);
        assert_eq!(sig.power_of_two(), 3);
        assert_eq!(sig.to_string(), "6/8");
        assert!(TimeSignature::parse("3/5").is_err());
        assert!(TimeSignature::parse("3").is_err());
    }

    #[test]
    fn time_signature_from_power() {
        assert_eq!(TimeSignature::from_power_of_two(3, 2), TimeSignature::new(3, 4));
        assert_eq!(TimeSignature::default().measure_duration(), 1.0);
    }
}
