//! Keeps parenthesized text in one fragment.
//!
//! Spaces inside function parentheses are dropped. Spaces inside lyric or
//! marker parentheses become [`PROTECTED_SPACE`], which the lyric subparser
//! turns back into spaces.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::Result;
use crate::parser::lyric_marker::PROTECTED_SPACE;
use crate::parser::ParseContext;

use super::Preprocessor;

static FUNCTION_PARENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":[A-Za-z0-9_]+\([^)]*\)").unwrap());
static LYRIC_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|\s)([&!])\(([^)]*)\)").unwrap());

pub struct ParenSpacesPreprocessor;

impl Preprocessor for ParenSpacesPreprocessor {
    fn preprocess(&self, text: &str, _context: &mut ParseContext<'_>) -> Result<String> {
        let text = FUNCTION_PARENS.replace_all(text, |caps: &Captures<'_>| {
            caps[0].chars().filter(|c| !c.is_whitespace()).collect::<String>()
        });
        let text = LYRIC_PARENS.replace_all(&text, |caps: &Captures<'_>| {
            let protected = caps[3].replace(' ', &PROTECTED_SPACE.to_string());
            format!("{}{}({protected})", &caps[1], &caps[2])
        });
        Ok(text.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::context::TestContext;

    fn run(text: &str) -> String {
        let mut t = TestContext::new();
        let out = ParenSpacesPreprocessor.preprocess(text, &mut t.context()).unwrap();
        out
    }

    #[test]
    fn function_parameters_lose_spaces() {
        assert_eq!(run("C :CE(7, 100) D"), "C :CE(7,100) D");
    }

    #[test]
    fn lyric_spaces_are_protected() {
        assert_eq!(run("C &(la la la) D"), "C &(la\u{a0}la\u{a0}la) D");
        assert_eq!(run("!(the end)"), "!(the\u{a0}end)");
    }

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(run("C D &word"), "C D &word");
    }
}
