//! Upper-cases notation, leaving lyric and marker text, bookmark names and
//! function parameters as written.

use crate::error::Result;
use crate::parser::ParseContext;

use super::{at_fragment_start, Preprocessor};

pub struct UppercasePreprocessor;

impl Preprocessor for UppercasePreprocessor {
    fn preprocess(&self, text: &str, _context: &mut ParseContext<'_>) -> Result<String> {
        Ok(uppercase(text))
    }
}

fn uppercase(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut index = 0;
    while let Some(c) = text[index..].chars().next() {
        let protected = match c {
            '&' | '!' if at_fragment_start(text, index) => Some(lyric_end(text, index + 1)),
            '@' if at_fragment_start(text, index) && text[index + 1..].starts_with('#') => {
                Some(lyric_end(text, index + 2))
            }
            '(' if function_name_before(text, index) => Some(closing_paren(text, index)),
            _ => None,
        };
        match protected {
            Some(end) => {
                out.push_str(&text[index..end]);
                index = end;
            }
            None => {
                out.extend(c.to_uppercase());
                index += c.len_utf8();
            }
        }
    }
    out
}

/// End of a lyric or marker payload starting at `start`.
fn lyric_end(text: &str, start: usize) -> usize {
    if text[start..].starts_with('(') {
        return closing_paren(text, start);
    }
    text[start..]
        .find(char::is_whitespace)
        .map_or(text.len(), |offset| start + offset)
}

/// Byte just past the `)` closing the `(` at `open`, or the end of the text.
fn closing_paren(text: &str, open: usize) -> usize {
    text[open..]
        .find(')')
        .map_or(text.len(), |offset| open + offset + 1)
}

/// Whether the `(` at `open` follows `:NAME`.
fn function_name_before(text: &str, open: usize) -> bool {
    let head = &text[..open];
    let name_start = head
        .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(0);
    head[name_start..].starts_with(':') && name_start + 1 < open
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_are_upper_cased() {
        assert_eq!(uppercase("v0 i[piano] c5q eb"), "V0 I[PIANO] C5Q EB");
    }

    #[test]
    fn lyrics_and_markers_keep_case() {
        assert_eq!(uppercase("c &hello d"), "C &hello D");
        assert_eq!(uppercase("c &(Hello there) d"), "C &(Hello there) D");
        assert_eq!(uppercase("!verse e"), "!verse E");
    }

    #[test]
    fn function_parameters_keep_case() {
        assert_eq!(uppercase(":foo(Some Text) c"), ":FOO(Some Text) C");
        assert_eq!(uppercase(":trill(c5q)"), ":TRILL(c5q)");
    }

    #[test]
    fn bookmark_requests_keep_case() {
        assert_eq!(uppercase("!chorus c @#chorus @0.5"), "!chorus C @#chorus @0.5");
    }

    #[test]
    fn ampersand_inside_fragment_is_not_a_lyric() {
        assert_eq!(uppercase("c&d"), "C&D");
    }

    #[test]
    fn collected_notes_are_upper_cased() {
        assert_eq!(uppercase("(c e g)q"), "(C E G)Q");
    }
}
