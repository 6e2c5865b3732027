//! Notation as a list of fragments, and the listener that writes it.

pub mod staccato;

pub use staccato::StaccatoListener;

use std::fmt;
use std::str::FromStr;

use crate::error::StaccatoError;
use crate::token::Token;

/// Space-separated notation fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    fragments: Vec<String>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append notation; it is split on whitespace.
    pub fn add(&mut self, notation: &str) -> &mut Self {
        self.fragments
            .extend(notation.split_whitespace().map(str::to_string));
        self
    }

    /// Append another pattern `times` times.
    pub fn repeat(&mut self, other: &Pattern, times: usize) -> &mut Self {
        for _ in 0..times {
            self.fragments.extend(other.fragments.iter().cloned());
        }
        self
    }

    /// Put `notation` in front of the pattern.
    pub fn prepend(&mut self, notation: &str) -> &mut Self {
        let mut head: Vec<String> = notation.split_whitespace().map(str::to_string).collect();
        head.append(&mut self.fragments);
        self.fragments = head;
        self
    }

    pub fn set_voice(&mut self, voice: u8) -> &mut Self {
        self.prepend(&format!("V{voice}"))
    }

    pub fn set_instrument(&mut self, instrument: &str) -> &mut Self {
        self.prepend(&format!("I[{instrument}]"))
    }

    pub fn set_tempo(&mut self, bpm: u32) -> &mut Self {
        self.prepend(&format!("T{bpm}"))
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// The last fragment, for joining notes with connectors.
    pub(crate) fn last_mut(&mut self) -> Option<&mut String> {
        self.fragments.last_mut()
    }

    pub(crate) fn push(&mut self, fragment: String) {
        self.fragments.push(fragment);
    }

    /// Fragments classified by kind, without preprocessing.
    pub fn tokens(&self) -> Vec<Token> {
        self.fragments.iter().map(|f| Token::classify(f)).collect()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fragments.join(" "))
    }
}

impl FromStr for Pattern {
    type Err = StaccatoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut pattern = Self::new();
        pattern.add(s);
        Ok(pattern)
    }
}

impl From<&str> for Pattern {
    fn from(notation: &str) -> Self {
        let mut pattern = Self::new();
        pattern.add(notation);
        pattern
    }
}
