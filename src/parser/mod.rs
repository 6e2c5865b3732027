//! The Staccato parser: preprocess, split on spaces, dispatch each fragment
//! to the first subparser that claims it.

pub mod atom;
pub mod bar_line;
pub mod beat_time;
pub mod context;
pub mod function;
pub mod ivl;
pub mod lyric_marker;
pub mod note;
pub mod signature;
pub mod tempo;

pub use context::{ParseContext, ParseState, ParserConfig};
pub use note::{NoteElement, NoteReader};

use std::rc::Rc;

use log::{trace, warn};

use crate::dictionary::Dictionary;
use crate::error::{Result, StaccatoError};
use crate::event::EventBus;
use crate::preprocess::PreprocessorChain;
use crate::theory::{Key, TimeSignature};
use crate::token::Token;

/// Handles one family of fragments.
pub trait Subparser {
    /// Whether this subparser claims `fragment`.
    fn matches(&self, fragment: &str) -> bool;

    /// Parse the start of `fragment`, firing events and updating the context.
    /// Returns the number of bytes consumed; any remainder is dispatched again.
    fn parse(&self, fragment: &str, context: &mut ParseContext<'_>) -> Result<usize>;
}

/// Subparsers in dispatch priority order.
fn standard_subparsers() -> Vec<Box<dyn Subparser>> {
    vec![
        Box::new(atom::AtomSubparser),
        Box::new(note::NoteSubparser),
        Box::new(bar_line::BarLineSubparser),
        Box::new(ivl::IvlSubparser),
        Box::new(signature::SignatureSubparser),
        Box::new(tempo::TempoSubparser),
        Box::new(beat_time::BeatTimeSubparser),
        Box::new(lyric_marker::LyricMarkerSubparser),
        Box::new(function::FunctionSubparser),
    ]
}

/// Parses Staccato notation and fires events on its bus.
pub struct StaccatoParser {
    config: ParserConfig,
    state: ParseState,
    bus: Rc<EventBus>,
    preprocessors: PreprocessorChain,
    subparsers: Vec<Box<dyn Subparser>>,
}

impl Default for StaccatoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StaccatoParser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        let state = ParseState::new(config.dictionary.clone());
        Self {
            config,
            state,
            bus: Rc::new(EventBus::new()),
            preprocessors: PreprocessorChain::standard(),
            subparsers: standard_subparsers(),
        }
    }

    /// The bus events are fired on. Subscribe listeners here.
    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.config.settings.strict = strict;
    }

    pub fn is_strict(&self) -> bool {
        self.config.settings.strict
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.state.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.state.dictionary
    }

    /// Key in effect after the last parse.
    pub fn key(&self) -> Key {
        self.state.key
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.state.time_signature
    }

    pub fn preprocessors(&self) -> &PreprocessorChain {
        &self.preprocessors
    }

    pub fn preprocessors_mut(&mut self) -> &mut PreprocessorChain {
        &mut self.preprocessors
    }

    /// Run the preprocessor chain without parsing.
    pub fn preprocess(&mut self, text: &str) -> Result<String> {
        let mut context = ParseContext::new(&self.config, &self.bus, &mut self.state);
        self.preprocessors.run(text, &mut context)
    }

    /// Classify the preprocessed fragments of `text` without firing events.
    pub fn tokens(&mut self, text: &str) -> Result<Vec<Token>> {
        let processed = self.preprocess(text)?;
        Ok(processed
            .split(' ')
            .filter(|f| !f.is_empty())
            .map(Token::classify)
            .collect())
    }

    /// Parse `text`, bracketing all events with before/after notifications.
    pub fn parse(&mut self, text: &str) -> Result<()> {
        self.bus.fire_before_parsing_starts();
        let result = self.parse_fragments(text);
        self.bus.fire_after_parsing_finished();
        result
    }

    fn parse_fragments(&mut self, text: &str) -> Result<()> {
        let mut context = ParseContext::new(&self.config, &self.bus, &mut self.state);
        let processed = self.preprocessors.run(text, &mut context)?;
        let strict = context.config.settings.strict;

        let mut position = 0;
        for fragment in processed.split(' ') {
            if !fragment.is_empty() {
                dispatch(&self.subparsers, fragment, position, strict, &mut context)?;
            }
            position += fragment.chars().count() + 1;
        }
        Ok(())
    }
}

/// Feed `fragment` to the subparsers until it is used up.
fn dispatch(
    subparsers: &[Box<dyn Subparser>],
    fragment: &str,
    position: usize,
    strict: bool,
    context: &mut ParseContext<'_>,
) -> Result<()> {
    let mut rest = fragment;
    while !rest.is_empty() {
        let Some(subparser) = subparsers.iter().find(|s| s.matches(rest)) else {
            return unrecognized(fragment, rest, position, strict);
        };
        trace!("parsing '{rest}'");
        let consumed = subparser.parse(rest, context)?;
        match rest.get(consumed..) {
            Some(remaining) if consumed > 0 => rest = remaining,
            _ => return unrecognized(fragment, rest, position, strict),
        }
    }
    Ok(())
}

/// The unparsed tail `rest` of `fragment` is an error in strict mode and
/// skipped otherwise.
fn unrecognized(fragment: &str, rest: &str, position: usize, strict: bool) -> Result<()> {
    if strict {
        let offset = fragment.len() - rest.len();
        return Err(StaccatoError::UnrecognizedToken {
            token: rest.to_string(),
            position: Some(position + fragment[..offset].chars().count()),
        });
    }
    warn!("no parser for '{rest}', skipping");
    Ok(())
}
