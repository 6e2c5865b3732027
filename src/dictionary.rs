//! Symbol dictionary: names usable wherever the notation accepts `[NAME]`.
//!
//! Seeded with General MIDI instrument, percussion, tempo and controller
//! names. Extra entries can be loaded from `$KEY=VALUE` definition text.

use std::collections::HashMap;

use crate::error::{Result, StaccatoError};

/// Track reserved for percussion (MIDI channel 10).
pub const PERCUSSION_TRACK: u8 = 9;

/// Lowest note with a percussion name.
pub const MIN_PERCUSSION_NOTE: u8 = 35;

/// Highest note with a percussion name.
pub const MAX_PERCUSSION_NOTE: u8 = 81;

/// General MIDI program names, indexed by program number.
pub const INSTRUMENT_NAMES: [&str; 128] = [
    "PIANO", "BRIGHT_ACOUSTIC", "ELECTRIC_GRAND", "HONKEY_TONK", "ELECTRIC_PIANO",
    "ELECTRIC_PIANO_2", "HARPSICHORD", "CLAVINET", "CELESTA", "GLOCKENSPIEL",
    "MUSIC_BOX", "VIBRAPHONE", "MARIMBA", "XYLOPHONE", "TUBULAR_BELLS", "DULCIMER",
    "DRAWBAR_ORGAN", "PERCUSSIVE_ORGAN", "ROCK_ORGAN", "CHURCH_ORGAN", "REED_ORGAN",
    "ACCORDIAN", "HARMONICA", "TANGO_ACCORDIAN", "GUITAR", "STEEL_STRING_GUITAR",
    "ELECTRIC_JAZZ_GUITAR", "ELECTRIC_CLEAN_GUITAR", "ELECTRIC_MUTED_GUITAR",
    "OVERDRIVEN_GUITAR", "DISTORTION_GUITAR", "GUITAR_HARMONICS", "ACOUSTIC_BASS",
    "ELECTRIC_BASS_FINGER", "ELECTRIC_BASS_PICK", "FRETLESS_BASS", "SLAP_BASS_1",
    "SLAP_BASS_2", "SYNTH_BASS_1", "SYNTH_BASS_2", "VIOLIN", "VIOLA", "CELLO",
    "CONTRABASS", "TREMOLO_STRINGS", "PIZZICATO_STRINGS", "ORCHESTRAL_STRINGS",
    "TIMPANI", "STRING_ENSEMBLE_1", "STRING_ENSEMBLE_2", "SYNTH_STRINGS_1",
    "SYNTH_STRINGS_2", "CHOIR_AAHS", "VOICE_OOHS", "SYNTH_VOICE", "ORCHESTRA_HIT",
    "TRUMPET", "TROMBONE", "TUBA", "MUTED_TRUMPET", "FRENCH_HORN", "BRASS_SECTION",
    "SYNTHBRASS_1", "SYNTHBRASS_2", "SOPRANO_SAX", "ALTO_SAX", "TENOR_SAX",
    "BARITONE_SAX", "OBOE", "ENGLISH_HORN", "BASSOON", "CLARINET", "PICCOLO", "FLUTE",
    "RECORDER", "PAN_FLUTE", "BLOWN_BOTTLE", "SKAKUHACHI", "WHISTLE", "OCARINA",
    "SQUARE", "SAWTOOTH", "CALLIOPE", "CHIFF", "CHARANG", "VOICE", "FIFTHS",
    "BASSLEAD", "NEW_AGE", "WARM", "POLYSYNTH", "CHOIR", "BOWED", "METALLIC", "HALO",
    "SWEEP", "RAIN", "SOUNDTRACK", "CRYSTAL", "ATMOSPHERE", "BRIGHTNESS", "GOBLIN",
    "ECHOES", "SCI-FI", "SITAR", "BANJO", "SHAMISEN", "KOTO", "KALIMBA", "BAGPIPE",
    "FIDDLE", "SHANAI", "TINKLE_BELL", "AGOGO", "STEEL_DRUMS", "WOODBLOCK",
    "TAIKO_DRUM", "MELODIC_TOM", "SYNTH_DRUM", "REVERSE_CYMBAL", "GUITAR_FRET_NOISE",
    "BREATH_NOISE", "SEASHORE", "BIRD_TWEET", "TELEPHONE_RING", "HELICOPTER",
    "APPLAUSE", "GUNSHOT",
];

/// Alternate spellings accepted for some programs.
const INSTRUMENT_ALIASES: &[(&str, i32)] = &[
    ("ACOUSTIC_GRAND", 0),
    ("BRIGHT_ACOUSTIC_PIANO", 1),
    ("ELECTRIC_GRAND_PIANO", 2),
    ("HONKY_TONK", 3),
    ("NYLON_STRING_GUITAR", 24),
    ("ELECTRIC_BASS", 33),
    ("STRINGS", 48),
    ("SYNTH_CALLIOPE", 82),
    ("SYNTH_CHARANG", 84),
];

/// Percussion instrument names for notes 35 through 81.
pub const PERCUSSION_NAMES: [&str; 47] = [
    "ACOUSTIC_BASS_DRUM", "BASS_DRUM", "SIDE_STICK", "ACOUSTIC_SNARE", "HAND_CLAP",
    "ELECTRIC_SNARE", "LO_FLOOR_TOM", "CLOSED_HI_HAT", "HIGH_FLOOR_TOM", "PEDAL_HI_HAT",
    "LO_TOM", "OPEN_HI_HAT", "LO_MID_TOM", "HI_MID_TOM", "CRASH_CYMBAL_1", "HI_TOM",
    "RIDE_CYMBAL_1", "CHINESE_CYMBAL", "RIDE_BELL", "TAMBOURINE", "SPLASH_CYMBAL",
    "COWBELL", "CRASH_CYMBAL_2", "VIBRASLAP", "RIDE_CYMBAL_2", "HI_BONGO", "LO_BONGO",
    "MUTE_HI_CONGA", "OPEN_HI_CONGA", "LO_CONGA", "HI_TIMBALE", "LO_TIMBALE",
    "HI_AGOGO", "LO_AGOGO", "CABASA", "MARACAS", "SHORT_WHISTLE", "LONG_WHISTLE",
    "SHORT_GUIRO", "LONG_GUIRO", "CLAVES", "HI_WOOD_BLOCK", "LO_WOOD_BLOCK",
    "MUTE_CUICA", "OPEN_CUICA", "MUTE_TRIANGLE", "OPEN_TRIANGLE",
];

/// Named tempos in beats per minute.
pub const TEMPO_NAMES: &[(&str, i32)] = &[
    ("GRAVE", 40),
    ("LARGO", 45),
    ("LARGHETTO", 50),
    ("LENTO", 55),
    ("ADAGIO", 60),
    ("ADAGIETTO", 65),
    ("ANDANTE", 70),
    ("ANDANTINO", 80),
    ("MODERATO", 95),
    ("ALLEGRETTO", 110),
    ("ALLEGRO", 120),
    ("VIVACE", 145),
    ("PRESTO", 180),
    ("PRESTISSIMO", 220),
];

/// Controller names. Values above 127 combine a coarse and fine controller
/// as `coarse * 128 + fine`.
pub const CONTROLLER_NAMES: &[(&str, i32)] = &[
    ("BANK_SELECT_COARSE", 0),
    ("MOD_WHEEL_COARSE", 1),
    ("BREATH_COARSE", 2),
    ("FOOT_PEDAL_COARSE", 4),
    ("PORTAMENTO_TIME_COARSE", 5),
    ("DATA_ENTRY_COARSE", 6),
    ("VOLUME_COARSE", 7),
    ("BALANCE_COARSE", 8),
    ("PAN_POSITION_COARSE", 10),
    ("EXPRESSION_COARSE", 11),
    ("EFFECT_CONTROL_1_COARSE", 12),
    ("EFFECT_CONTROL_2_COARSE", 13),
    ("BANK_SELECT_FINE", 32),
    ("MOD_WHEEL_FINE", 33),
    ("BREATH_FINE", 34),
    ("FOOT_PEDAL_FINE", 36),
    ("PORTAMENTO_TIME_FINE", 37),
    ("DATA_ENTRY_FINE", 38),
    ("VOLUME_FINE", 39),
    ("BALANCE_FINE", 40),
    ("PAN_POSITION_FINE", 42),
    ("EXPRESSION_FINE", 43),
    ("EFFECT_CONTROL_1_FINE", 44),
    ("EFFECT_CONTROL_2_FINE", 45),
    ("HOLD_PEDAL", 64),
    ("HOLD", 64),
    ("PORTAMENTO", 65),
    ("SUSTENUTO_PEDAL", 66),
    ("SUSTENUTO", 66),
    ("SOFT_PEDAL", 67),
    ("SOFT", 67),
    ("LEGATO_PEDAL", 68),
    ("LEGATO", 68),
    ("HOLD_2_PEDAL", 69),
    ("HOLD_2", 69),
    ("SOUND_VARIATION", 70),
    ("VARIATION", 70),
    ("SOUND_TIMBRE", 71),
    ("TIMBRE", 71),
    ("SOUND_RELEASE_TIME", 72),
    ("RELEASE_TIME", 72),
    ("SOUND_ATTACK_TIME", 73),
    ("ATTACK_TIME", 73),
    ("SOUND_BRIGHTNESS", 74),
    ("BRIGHTNESS_CONTROL", 74),
    ("EFFECTS_LEVEL", 91),
    ("TREMULO_LEVEL", 92),
    ("CHORUS_LEVEL", 93),
    ("CELESTE_LEVEL", 94),
    ("PHASER_LEVEL", 95),
    ("DATA_BUTTON_INCREMENT", 96),
    ("DATA_BUTTON_DECREMENT", 97),
    ("ALL_SOUND_OFF", 120),
    ("RESET_ALL_CONTROLLERS", 121),
    ("LOCAL_CONTROL", 122),
    ("ALL_NOTES_OFF", 123),
    ("OMNI_MODE_OFF", 124),
    ("OMNI_MODE_ON", 125),
    ("MONO_OPERATION", 126),
    ("POLY_OPERATION", 127),
    ("MOD_WHEEL", 161),
    ("BREATH", 290),
    ("FOOT_PEDAL", 548),
    ("PORTAMENTO_TIME", 677),
    ("DATA_ENTRY", 806),
    ("VOLUME", 935),
    ("BALANCE", 1064),
    ("PAN_POSITION", 1322),
    ("EXPRESSION", 1451),
    ("ON", 127),
    ("OFF", 0),
    ("DEFAULT", 64),
];

/// Name to numeric value map shared by the subparsers of one parser.
#[derive(Debug, Clone)]
pub struct Dictionary {
    entries: HashMap<String, i32>,
}

impl Dictionary {
    /// A dictionary with no entries at all.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The standard dictionary: instruments, percussion, tempos and controllers.
    pub fn standard() -> Self {
        let mut dict = Self::empty();
        dict.insert("PERCUSSION", PERCUSSION_TRACK as i32);
        for (program, name) in INSTRUMENT_NAMES.iter().enumerate() {
            dict.insert(*name, program as i32);
        }
        for (name, program) in INSTRUMENT_ALIASES {
            dict.insert(*name, *program);
        }
        for (offset, name) in PERCUSSION_NAMES.iter().enumerate() {
            dict.insert(*name, MIN_PERCUSSION_NOTE as i32 + offset as i32);
        }
        for (name, bpm) in TEMPO_NAMES {
            dict.insert(*name, *bpm);
        }
        for (name, controller) in CONTROLLER_NAMES {
            dict.insert(*name, *controller);
        }
        dict
    }

    /// Insert or replace an entry. Keys are stored upper-cased.
    pub fn insert(&mut self, name: impl AsRef<str>, value: i32) {
        self.entries.insert(name.as_ref().to_uppercase(), value);
    }

    /// Look up a name, ignoring case.
    pub fn get(&self, name: &str) -> Option<i32> {
        self.entries
            .get(name)
            .or_else(|| self.entries.get(&name.to_uppercase()))
            .copied()
    }

    /// Look up a name, failing with a lookup error naming `kind`.
    pub fn require(&self, kind: &'static str, name: &str) -> Result<i32> {
        self.get(name)
            .ok_or_else(|| StaccatoError::lookup(kind, name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load `$KEY=VALUE` definitions. Lines starting with `#` and blank
    /// lines are skipped; returns the number of entries loaded.
    pub fn load_definitions(&mut self, text: &str) -> Result<usize> {
        let mut loaded = 0;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(definition) = line.strip_prefix('$') else {
                return Err(StaccatoError::invalid("definition", line));
            };
            let (key, value) = definition
                .split_once('=')
                .ok_or_else(|| StaccatoError::invalid("definition", line))?;
            let value: i32 = value
                .trim()
                .parse()
                .map_err(|_| StaccatoError::invalid("definition value", value.trim()))?;
            self.insert(key.trim(), value);
            loaded += 1;
        }
        Ok(loaded)
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::standard()
    }
}

/// Name of a percussion note, or None outside 35..=81.
pub fn percussion_name(note: u8) -> Option<&'static str> {
    if (MIN_PERCUSSION_NOTE..=MAX_PERCUSSION_NOTE).contains(&note) {
        Some(PERCUSSION_NAMES[(note - MIN_PERCUSSION_NOTE) as usize])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_entries() {
        let dict = Dictionary::standard();
        assert_eq!(dict.get("PERCUSSION"), Some(9));
        assert_eq!(dict.get("PIANO"), Some(0));
        assert_eq!(dict.get("GUNSHOT"), Some(127));
        assert_eq!(dict.get("ALLEGRO"), Some(120));
        assert_eq!(dict.get("BASS_DRUM"), Some(36));
        assert_eq!(dict.get("OPEN_TRIANGLE"), Some(81));
        assert_eq!(dict.get("VOLUME"), Some(935));
    }

    #[test]
    fn lookup_ignores_case() {
        let dict = Dictionary::standard();
        assert_eq!(dict.get("flute"), Some(73));
    }

    #[test]
    fn combined_controllers_split_into_coarse_and_fine() {
        for (name, id) in CONTROLLER_NAMES.iter().filter(|(_, id)| *id > 127) {
            let dict = Dictionary::standard();
            let coarse = id >> 7;
            let fine = id & 0x7F;
            assert!(coarse < 32, "{name}");
            assert_eq!(fine, coarse + 32, "{name}");
            assert_eq!(dict.get(name), Some(*id));
        }
    }

    #[test]
    fn require_reports_missing_name() {
        let dict = Dictionary::standard();
        let err = dict.require("instrument", "KAZOO").unwrap_err();
        assert_eq!(err.to_string(), "unknown instrument 'KAZOO'");
    }

    #[test]
    fn load_definitions_skips_comments() {
        let mut dict = Dictionary::empty();
        let loaded = dict
            .load_definitions("# my instruments\n\n$LEAD=80\n$pad = 88\n")
            .unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(dict.get("LEAD"), Some(80));
        assert_eq!(dict.get("PAD"), Some(88));
    }

    #[test]
    fn load_definitions_rejects_non_numeric() {
        let mut dict = Dictionary::empty();
        assert!(dict.load_definitions("$LEAD=loud").is_err());
        assert!(dict.load_definitions("LEAD=80").is_err());
    }

    #[test]
    fn percussion_names_cover_range() {
        assert_eq!(percussion_name(35), Some("ACOUSTIC_BASS_DRUM"));
        assert_eq!(percussion_name(42), Some("CLOSED_HI_HAT"));
        assert_eq!(percussion_name(34), None);
        assert_eq!(percussion_name(82), None);
    }
}
