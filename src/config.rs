//! Configuration loaded from ~/.staccato/config.yaml.
//!
//! Every field has a default, so a partial file (or no file at all) is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StaccatoError};

/// Defaults applied to notes that do not spell out every attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteSettings {
    /// Octave used for a note letter without an explicit octave.
    pub default_octave: u8,
    /// Octave used for a chord root without an explicit octave.
    pub default_chord_octave: u8,
    /// Duration (in whole notes) used when a note has none.
    pub default_duration: f64,
    pub default_on_velocity: u8,
    pub default_off_velocity: u8,
    /// Sharpen/flatten bare note letters according to the active key.
    pub adjust_for_key: bool,
}

impl Default for NoteSettings {
    fn default() -> Self {
        Self {
            default_octave: 5,
            default_chord_octave: 4,
            default_duration: 0.25,
            default_on_velocity: 64,
            default_off_velocity: 64,
            adjust_for_key: true,
        }
    }
}

/// Parser behaviour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Fail on fragments no subparser recognizes instead of skipping them.
    pub strict: bool,
    pub notes: NoteSettings,
}

/// Playback and sequencing behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Preferred MIDI output device name (substring match). None = first available.
    pub device_name: Option<String>,
    /// MIDI input device to echo through the player (substring match).
    pub input_device: Option<String>,
    /// Only accept input on this MIDI channel (0-15). None = all channels.
    pub channel_filter: Option<u8>,
    /// Ticks per beat for offline sequences.
    pub resolution: u32,
    /// Starting tempo in beats per minute.
    pub tempo: u32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            device_name: None,
            input_device: None,
            channel_filter: None,
            resolution: crate::time::DEFAULT_RESOLUTION,
            tempo: crate::time::DEFAULT_TEMPO,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaccatoConfig {
    pub parser: ParserSettings,
    pub player: PlayerSettings,
}

impl StaccatoConfig {
    /// Standard config path (~/.staccato/config.yaml).
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::home_dir()?.join(".staccato").join("config.yaml"))
    }

    /// Load config from the standard path.
    /// Returns None if the file doesn't exist or can't be parsed.
    pub fn load() -> Option<Self> {
        let path = Self::default_path()?;
        let content = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Load config from an explicit path, reporting IO and YAML errors.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make timing conversions meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.player.resolution == 0 {
            return Err(StaccatoError::Config("resolution must be positive".into()));
        }
        if self.player.tempo == 0 {
            return Err(StaccatoError::Config("tempo must be positive".into()));
        }
        if self.player.channel_filter.is_some_and(|c| c > 15) {
            return Err(StaccatoError::Config("channel_filter must be 0-15".into()));
        }
        let notes = &self.parser.notes;
        if notes.default_on_velocity > 127 || notes.default_off_velocity > 127 {
            return Err(StaccatoError::Config("velocities must be 0-127".into()));
        }
        if notes.default_octave > 10 || notes.default_chord_octave > 10 {
            return Err(StaccatoError::Config("octaves must be 0-10".into()));
        }
        Ok(())
    }
}
