//! `{...}` instructions: registered phrases expanded into notation.
//!
//! The longest registered key that prefixes the brace contents wins. The
//! contents split on spaces are handed to the instruction, which usually
//! reads the last word as its argument, e.g. `{Sustain ON}`.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, StaccatoError};
use crate::parser::ParseContext;

use super::Preprocessor;

static BRACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").unwrap());

/// Placeholder replaced by the argument in `Switch` and `LastIsValue`.
pub const VALUE_MARK: char = '$';

/// Turns a parameter into (placeholder, replacement) pairs.
pub type Splitter = Box<dyn Fn(&str) -> Vec<(String, String)>>;

/// What an instruction expands to.
pub enum Instruction {
    /// Always the same text.
    Constant(String),
    /// The choice indexed by the last word (decimal or `0x` hex).
    Choice(Vec<String>),
    /// The template with `$` replaced by `on` or `off` according to the last
    /// word; any other word leaves the `$` in place.
    Switch {
        template: String,
        off: String,
        on: String,
    },
    /// The template with `$` replaced by the last word.
    LastIsValue(String),
    /// The template with every placeholder the splitter derives from the
    /// last word replaced.
    LastIsValueToSplit { template: String, splitter: Splitter },
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(text) => f.debug_tuple("Constant").field(text).finish(),
            Self::Choice(choices) => f.debug_tuple("Choice").field(choices).finish(),
            Self::Switch { template, off, on } => f
                .debug_struct("Switch")
                .field("template", template)
                .field("off", off)
                .field("on", on)
                .finish(),
            Self::LastIsValue(template) => f.debug_tuple("LastIsValue").field(template).finish(),
            Self::LastIsValueToSplit { template, .. } => f
                .debug_struct("LastIsValueToSplit")
                .field("template", template)
                .finish_non_exhaustive(),
        }
    }
}

impl Instruction {
    pub fn choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self::Choice(choices.into_iter().map(|c| c.to_string()).collect())
    }

    pub fn switch(template: impl Into<String>, off: impl ToString, on: impl ToString) -> Self {
        Self::Switch {
            template: template.into(),
            off: off.to_string(),
            on: on.to_string(),
        }
    }

    /// Expand for the space-separated `words` of the brace contents.
    pub fn expand(&self, words: &[&str]) -> Result<String> {
        let last = words.last().copied().unwrap_or("");
        match self {
            Self::Constant(text) => Ok(text.clone()),
            Self::Choice(choices) => {
                let index = parse_index(last)?;
                choices.get(index).cloned().ok_or(StaccatoError::OutOfRange {
                    what: "choice",
                    value: index as i64,
                    min: 0,
                    max: choices.len() as i64 - 1,
                })
            }
            Self::Switch { template, off, on } => {
                let value = if last.eq_ignore_ascii_case("ON") {
                    on.as_str()
                } else if last.eq_ignore_ascii_case("OFF") {
                    off.as_str()
                } else {
                    return Ok(template.clone());
                };
                Ok(template.replacen(VALUE_MARK, value, 1))
            }
            Self::LastIsValue(template) => Ok(template.replacen(VALUE_MARK, last, 1)),
            Self::LastIsValueToSplit { template, splitter } => Ok(splitter(last)
                .into_iter()
                .fold(template.clone(), |text, (key, value)| text.replace(&key, &value))),
        }
    }
}

fn parse_index(word: &str) -> Result<usize> {
    let parsed = match word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => word.parse(),
    };
    parsed.map_err(|_| StaccatoError::invalid("choice index", word))
}

/// Expands `{...}` spans using registered instructions.
#[derive(Debug, Default)]
pub struct InstructionPreprocessor {
    instructions: HashMap<String, Instruction>,
}

impl InstructionPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, instruction: Instruction) {
        self.instructions.insert(key.into(), instruction);
    }

    /// Register a constant expansion.
    pub fn add_text(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.add(key, Instruction::Constant(text.into()));
    }

    pub fn remove(&mut self, key: &str) -> Option<Instruction> {
        self.instructions.remove(key)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Registered key with the longest match at the start of `contents`.
    fn longest_prefix(&self, contents: &str) -> Option<&Instruction> {
        self.instructions
            .iter()
            .filter(|(key, _)| contents.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, instruction)| instruction)
    }
}

impl Preprocessor for InstructionPreprocessor {
    fn preprocess(&self, text: &str, _context: &mut ParseContext<'_>) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for span in BRACES.find_iter(text) {
            out.push_str(&text[last..span.start()]);
            let contents = &text[span.start() + 1..span.end() - 1];
            match self.longest_prefix(contents) {
                Some(instruction) => {
                    let words: Vec<&str> = contents.split(' ').collect();
                    out.push_str(&instruction.expand(&words)?);
                }
                None => out.push_str(contents),
            }
            last = span.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::context::TestContext;

    fn run(pre: &InstructionPreprocessor, text: &str) -> Result<String> {
        let mut t = TestContext::new();
        let out = pre.preprocess(text, &mut t.context());
        out
    }

    #[test]
    fn constant() {
        let mut pre = InstructionPreprocessor::new();
        pre.add_text("Intro", "C D E");
        assert_eq!(run(&pre, "{Intro} F").unwrap(), "C D E F");
    }

    #[test]
    fn longest_key_wins() {
        let mut pre = InstructionPreprocessor::new();
        pre.add_text("Sus", "A");
        pre.add("Sustain", Instruction::switch(":CE(64,$)", 0, 127));
        assert_eq!(run(&pre, "{Sustain ON} C").unwrap(), ":CE(64,127) C");
        assert_eq!(run(&pre, "{Sustain off}").unwrap(), ":CE(64,0)");
        assert_eq!(run(&pre, "{Sus}").unwrap(), "A");
    }

    #[test]
    fn switch_with_unknown_word_keeps_placeholder() {
        let mut pre = InstructionPreprocessor::new();
        pre.add("Pedal", Instruction::switch(":CE(64,$)", 0, 127));
        assert_eq!(run(&pre, "{Pedal maybe}").unwrap(), ":CE(64,$)");
    }

    #[test]
    fn choice_by_index() {
        let mut pre = InstructionPreprocessor::new();
        pre.add("Pick", Instruction::choice(["C", "D", "E"]));
        assert_eq!(run(&pre, "{Pick 2} {Pick 0x1}").unwrap(), "E D");
        assert!(matches!(
            run(&pre, "{Pick 3}"),
            Err(StaccatoError::OutOfRange { value: 3, .. })
        ));
        assert!(run(&pre, "{Pick x}").is_err());
    }

    #[test]
    fn last_is_value() {
        let mut pre = InstructionPreprocessor::new();
        pre.add("Volume", Instruction::LastIsValue(":CE(7,$)".into()));
        assert_eq!(run(&pre, "{Volume 100}").unwrap(), ":CE(7,100)");
    }

    #[test]
    fn last_is_value_to_split() {
        let mut pre = InstructionPreprocessor::new();
        let splitter: Splitter = Box::new(|param| {
            let mut parts = param.split('-');
            vec![
                ("$1".to_string(), parts.next().unwrap_or("").to_string()),
                ("$2".to_string(), parts.next().unwrap_or("").to_string()),
            ]
        });
        pre.add(
            "Pair",
            Instruction::LastIsValueToSplit {
                template: "$1q $2q".into(),
                splitter,
            },
        );
        assert_eq!(run(&pre, "{Pair C-E}").unwrap(), "Cq Eq");
    }

    #[test]
    fn unknown_instruction_keeps_contents() {
        let mut pre = InstructionPreprocessor::new();
        pre.add_text("Intro", "C");
        assert_eq!(run(&pre, "D {Outro} {Intro}").unwrap(), "D Outro C");
    }
}
