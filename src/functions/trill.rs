//! `:TRILL(note[,semitones[,piece]])` expands into alternating notes.
//!
//! The note alternates with the note `semitones` above it (default 2) in
//! pieces of the given duration letter (default `T`, a 32nd) until the
//! note's duration is filled.

use crate::error::{Result, StaccatoError};
use crate::parser::note::{letter_duration, NoteElement};
use crate::parser::ParseContext;
use crate::theory::note::duration_string;

use super::{split_params, PreprocessorFunction};

const DEFAULT_INTERVAL: i64 = 2;
const DEFAULT_PIECE: u8 = b'T';

pub struct TrillFunction;

impl PreprocessorFunction for TrillFunction {
    fn names(&self) -> &'static [&'static str] {
        &["TRILL", "TR"]
    }

    fn apply(&self, params: &str, context: &ParseContext<'_>) -> Result<String> {
        let parts = split_params(params);
        let Some(note_text) = parts.first() else {
            return Err(StaccatoError::syntax("trill needs a note", params));
        };
        let note_text = note_text.to_uppercase();
        let (elements, consumed) = context.note_reader().read(&note_text)?;
        let note = match elements.as_slice() {
            [NoteElement::Note(note)] if consumed == note_text.len() && !note.is_rest => note,
            _ => return Err(StaccatoError::invalid("trill note", note_text.as_str())),
        };

        let interval = match parts.get(1) {
            Some(text) => text
                .parse::<i64>()
                .map_err(|_| StaccatoError::invalid("trill interval", *text))?,
            None => DEFAULT_INTERVAL,
        };
        let piece_letter = match parts.get(2) {
            Some(text) => match text.to_uppercase().as_bytes() {
                [letter] => *letter,
                _ => return Err(StaccatoError::invalid("trill piece", *text)),
            },
            None => DEFAULT_PIECE,
        };
        let piece = letter_duration(piece_letter)
            .ok_or_else(|| StaccatoError::invalid("trill piece", params))?;

        let upper = StaccatoError::check_u8("trill note", note.value as i64 + interval, 0, 127)?;
        let duration = if note.duration_explicit {
            note.duration
        } else {
            context.config.settings.notes.default_duration
        };
        let count = ((duration / piece).round() as usize).max(1);
        let suffix = duration_string(piece).to_uppercase() + &note.velocity_string().to_uppercase();

        let pieces: Vec<String> = (0..count)
            .map(|i| {
                let value = if i % 2 == 0 { note.value } else { upper };
                format!("[{value}]{suffix}")
            })
            .collect();
        Ok(pieces.join(" "))
    }
}
