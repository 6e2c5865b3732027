//! User-supplied text substitution: `<KEY>` (or bare `KEY`) becomes its value.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::Result;
use crate::parser::ParseContext;

use super::Preprocessor;

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(\S+?)>").unwrap());
static BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").unwrap());

/// Replaces keys found in the text with values from a map.
///
/// Keys without a value are left exactly as written, brackets included.
#[derive(Debug, Clone)]
pub struct ReplacementMapPreprocessor {
    map: HashMap<String, String>,
    requires_angle_brackets: bool,
    case_sensitive: bool,
    iterations: usize,
}

impl Default for ReplacementMapPreprocessor {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            requires_angle_brackets: true,
            case_sensitive: true,
            iterations: 1,
        }
    }
}

impl ReplacementMapPreprocessor {
    pub fn new(map: HashMap<String, String>) -> Self {
        Self {
            map,
            ..Self::default()
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.insert(key.into(), value.into());
    }

    pub fn set_map(&mut self, map: HashMap<String, String>) {
        self.map = map;
    }

    pub fn map(&self) -> &HashMap<String, String> {
        &self.map
    }

    /// With brackets off, every whitespace-separated word is a candidate key.
    pub fn set_requires_angle_brackets(&mut self, required: bool) {
        self.requires_angle_brackets = required;
    }

    /// When off, found keys are upper-cased before lookup, so map keys
    /// should be upper case.
    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.case_sensitive = case_sensitive;
    }

    /// Number of passes; more than one resolves values that contain keys.
    pub fn set_iterations(&mut self, iterations: usize) {
        self.iterations = iterations;
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn replace_once(&self, text: &str) -> String {
        let pattern: &Regex = if self.requires_angle_brackets {
            &BRACKETED
        } else {
            &BARE
        };
        pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let key = caps.get(1).or_else(|| caps.get(0)).map_or("", |m| m.as_str());
                let found = if self.case_sensitive {
                    self.map.get(key)
                } else {
                    self.map.get(&key.to_uppercase())
                };
                match found {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

impl Preprocessor for ReplacementMapPreprocessor {
    fn preprocess(&self, text: &str, _context: &mut ParseContext<'_>) -> Result<String> {
        if self.map.is_empty() {
            return Ok(text.to_string());
        }
        let mut text = text.to_string();
        for _ in 0..self.iterations {
            text = self.replace_once(&text);
        }
        Ok(text)
    }
}
