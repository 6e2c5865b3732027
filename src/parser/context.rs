//! Configuration and mutable state shared by the subparsers.

use std::fmt;

use crate::config::ParserSettings;
use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::event::EventBus;
use crate::functions::FunctionRegistry;
use crate::theory::{ChordTable, Key, TimeSignature};

use super::note::NoteReader;

/// Providers and settings a parser is built with.
///
/// [`ParserConfig::default`] gives the standard dictionary, chord table and
/// built-in functions with default settings.
#[derive(Clone)]
pub struct ParserConfig {
    pub settings: ParserSettings,
    pub chords: ChordTable,
    pub functions: FunctionRegistry,
    /// Symbols the parser starts with; definitions added while parsing go
    /// into the parser's own copy.
    pub dictionary: Dictionary,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::from_settings(ParserSettings::default())
    }
}

impl ParserConfig {
    pub fn from_settings(settings: ParserSettings) -> Self {
        Self {
            settings,
            chords: ChordTable::standard(),
            functions: FunctionRegistry::standard(),
            dictionary: Dictionary::standard(),
        }
    }

    /// A note reader in C major with this configuration's tables.
    pub fn note_reader(&self) -> NoteReader<'_> {
        NoteReader::new(
            self.settings.notes,
            Key::default(),
            &self.dictionary,
            &self.chords,
        )
    }
}

impl fmt::Debug for ParserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserConfig")
            .field("settings", &self.settings)
            .field("dictionary", &self.dictionary.len())
            .finish_non_exhaustive()
    }
}

/// State that persists across parse calls.
#[derive(Debug, Clone, Default)]
pub struct ParseState {
    pub dictionary: Dictionary,
    pub key: Key,
    pub time_signature: TimeSignature,
}

impl ParseState {
    pub fn new(dictionary: Dictionary) -> Self {
        Self {
            dictionary,
            key: Key::default(),
            time_signature: TimeSignature::default(),
        }
    }
}

/// Everything a subparser, preprocessor or function may read or change
/// while handling one fragment.
pub struct ParseContext<'a> {
    pub config: &'a ParserConfig,
    pub bus: &'a EventBus,
    pub state: &'a mut ParseState,
}

impl<'a> ParseContext<'a> {
    pub fn new(config: &'a ParserConfig, bus: &'a EventBus, state: &'a mut ParseState) -> Self {
        Self { config, bus, state }
    }

    /// A note reader using the current key and dictionary.
    pub fn note_reader(&self) -> NoteReader<'_> {
        NoteReader::new(
            self.config.settings.notes,
            self.state.key,
            &self.state.dictionary,
            &self.config.chords,
        )
    }

    /// Dictionary lookup that fails with a lookup error naming `kind`.
    pub fn lookup(&self, kind: &'static str, name: &str) -> Result<i32> {
        self.state.dictionary.require(kind, name)
    }
}

/// Owns a config, bus and state so unit tests can build contexts cheaply.
#[cfg(test)]
pub(crate) struct TestContext {
    pub config: ParserConfig,
    pub bus: EventBus,
    pub state: ParseState,
    pub events: std::rc::Rc<std::cell::RefCell<crate::event::EventCollector>>,
}

#[cfg(test)]
impl TestContext {
    pub fn new() -> Self {
        let config = ParserConfig::default();
        let bus = EventBus::new();
        let (_, events) = bus.add(crate::event::EventCollector::new());
        let state = ParseState::new(config.dictionary.clone());
        Self {
            config,
            bus,
            state,
            events,
        }
    }

    pub fn context(&mut self) -> ParseContext<'_> {
        ParseContext::new(&self.config, &self.bus, &mut self.state)
    }

    pub fn events(&self) -> Vec<crate::event::ParserEvent> {
        self.events.borrow().events.clone()
    }
}
