//! Text-to-text stages run over notation before it is split into fragments.
//!
//! The standard chain runs, in order: replacement map, instructions, upper
//! casing, collected notes, paren spaces, preprocessor functions, microtones
//! and broken chords. Extra stages pushed by the caller run last.

pub mod broken_chord;
pub mod collected;
pub mod function;
pub mod instruction;
pub mod microtone;
pub mod paren;
pub mod replacement;
pub mod uppercase;

pub use broken_chord::BrokenChordPreprocessor;
pub use collected::CollectedNotesPreprocessor;
pub use function::FunctionPreprocessor;
pub use instruction::{Instruction, InstructionPreprocessor};
pub use microtone::MicrotonePreprocessor;
pub use paren::ParenSpacesPreprocessor;
pub use replacement::ReplacementMapPreprocessor;
pub use uppercase::UppercasePreprocessor;

use log::trace;

use crate::error::Result;
use crate::parser::ParseContext;

/// One stage of the chain.
pub trait Preprocessor {
    fn preprocess(&self, text: &str, context: &mut ParseContext<'_>) -> Result<String>;
}

/// The ordered preprocessor stages a parser runs.
#[derive(Default)]
pub struct PreprocessorChain {
    /// User replacement map, empty by default.
    pub replacement: ReplacementMapPreprocessor,
    /// User instructions, none by default.
    pub instructions: InstructionPreprocessor,
    extra: Vec<Box<dyn Preprocessor>>,
}

impl PreprocessorChain {
    pub fn standard() -> Self {
        Self::default()
    }

    /// Append a stage that runs after the standard ones.
    pub fn push(&mut self, stage: impl Preprocessor + 'static) {
        self.extra.push(Box::new(stage));
    }

    pub fn run(&self, text: &str, context: &mut ParseContext<'_>) -> Result<String> {
        let standard: [&dyn Preprocessor; 8] = [
            &self.replacement,
            &self.instructions,
            &UppercasePreprocessor,
            &CollectedNotesPreprocessor,
            &ParenSpacesPreprocessor,
            &FunctionPreprocessor,
            &MicrotonePreprocessor,
            &BrokenChordPreprocessor,
        ];
        let extra = self.extra.iter().map(|stage| stage.as_ref());

        let mut text = text.to_string();
        for stage in standard.into_iter().chain(extra) {
            text = stage.preprocess(&text, context)?;
        }
        trace!("preprocessed: {text}");
        Ok(text)
    }
}

/// Whether the byte at `index` starts a whitespace-delimited fragment.
pub(crate) fn at_fragment_start(text: &str, index: usize) -> bool {
    text[..index]
        .chars()
        .next_back()
        .map_or(true, char::is_whitespace)
}
