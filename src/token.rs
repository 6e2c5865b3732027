//! Classified notation fragments.

use std::fmt;

/// What a fragment of preprocessed notation denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Voice,
    Layer,
    Instrument,
    Tempo,
    KeySignature,
    TimeSignature,
    BarLine,
    BeatTimeBookmark,
    BeatTimeBookmarkRequest,
    Lyric,
    Marker,
    Function,
    Note,
    Whitespace,
    Atom,
    Unknown,
}

impl TokenKind {
    /// Classify by prefix, in the same priority order the parser dispatches.
    pub fn of(fragment: &str) -> Self {
        let mut chars = fragment.chars();
        let Some(first) = chars.next() else {
            return TokenKind::Whitespace;
        };
        match first {
            c if c.is_whitespace() => TokenKind::Whitespace,
            '~' => TokenKind::Atom,
            'A'..='G' | 'R' | '[' | '0'..='9' => TokenKind::Note,
            '|' => TokenKind::BarLine,
            'V' => TokenKind::Voice,
            'L' => TokenKind::Layer,
            'I' => TokenKind::Instrument,
            'K' if fragment.starts_with("K:") || fragment.starts_with("KEY:") => {
                TokenKind::KeySignature
            }
            'T' if fragment.starts_with("TIME:") => TokenKind::TimeSignature,
            'T' => TokenKind::Tempo,
            '@' if fragment.starts_with("@#") => TokenKind::BeatTimeBookmarkRequest,
            '@' => TokenKind::BeatTimeBookmark,
            '&' => TokenKind::Lyric,
            '!' => TokenKind::Marker,
            ':' => TokenKind::Function,
            _ => TokenKind::Unknown,
        }
    }
}

/// A fragment of notation and its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    text: String,
    kind: TokenKind,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn classify(text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = TokenKind::of(&text);
        Self { text, kind }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_prefixes() {
        let cases = [
            ("V1", TokenKind::Voice),
            ("L2", TokenKind::Layer),
            ("I[PIANO]", TokenKind::Instrument),
            ("T120", TokenKind::Tempo),
            ("TIME:3/4", TokenKind::TimeSignature),
            ("K:GMAJ", TokenKind::KeySignature),
            ("KEY:GMAJ", TokenKind::KeySignature),
            ("|", TokenKind::BarLine),
            ("@2.5", TokenKind::BeatTimeBookmark),
            ("@#VERSE", TokenKind::BeatTimeBookmarkRequest),
            ("&la", TokenKind::Lyric),
            ("!VERSE", TokenKind::Marker),
            (":PW(8192)", TokenKind::Function),
            ("C5Q", TokenKind::Note),
            ("RW", TokenKind::Note),
            ("[BASS_DRUM]Q", TokenKind::Note),
            ("60", TokenKind::Note),
            ("~V0,L0,I0,C5", TokenKind::Atom),
            ("", TokenKind::Whitespace),
            ("ZZZ", TokenKind::Unknown),
            ("K", TokenKind::Unknown),
        ];
        for (text, kind) in cases {
            assert_eq!(Token::classify(text).kind(), kind, "{text}");
        }
    }

    #[test]
    fn display_is_raw_text() {
        assert_eq!(Token::new("C5Q", TokenKind::Note).to_string(), "C5Q");
    }
}
