//! `(C E G)Q` becomes `CQ+EQ+GQ`: each collected note gets the suffix and
//! the notes sound together.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::Result;
use crate::parser::ParseContext;

use super::Preprocessor;

static COLLECTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|\s)\(([^()]*)\)(\S*)").unwrap());

pub struct CollectedNotesPreprocessor;

impl Preprocessor for CollectedNotesPreprocessor {
    fn preprocess(&self, text: &str, _context: &mut ParseContext<'_>) -> Result<String> {
        let expanded = COLLECTED.replace_all(text, |caps: &Captures<'_>| {
            let suffix = &caps[3];
            let notes: Vec<String> = caps[2]
                .split_whitespace()
                .map(|note| format!("{note}{suffix}"))
                .collect();
            format!("{}{}", &caps[1], notes.join("+"))
        });
        Ok(expanded.into_owned())
    }
}
