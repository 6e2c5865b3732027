//! Broken chords: `CMAJW:0,1,2,1` plays chord notes one after another.
//!
//! Indexes count from the bass note. The chord's duration is shared evenly
//! by the listed notes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, StaccatoError};
use crate::parser::note::starts_note;
use crate::parser::{NoteElement, ParseContext};
use crate::theory::note::duration_string;

use super::Preprocessor;

static BROKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^:]+):(\d+(?:,\d+)*)$").unwrap());

pub struct BrokenChordPreprocessor;

impl Preprocessor for BrokenChordPreprocessor {
    fn preprocess(&self, text: &str, context: &mut ParseContext<'_>) -> Result<String> {
        let fragments = text
            .split(' ')
            .map(|fragment| match BROKEN.captures(fragment) {
                Some(caps) if caps[1].bytes().next().is_some_and(starts_note) => {
                    expand(&caps[1], &caps[2], context)
                }
                _ => Ok(fragment.to_string()),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(fragments.join(" "))
    }
}

fn expand(chord_text: &str, indexes: &str, context: &ParseContext<'_>) -> Result<String> {
    let (elements, consumed) = context.note_reader().read(chord_text)?;
    let chord = match elements.as_slice() {
        [NoteElement::Chord(chord)] if consumed == chord_text.len() => chord,
        _ => return Err(StaccatoError::syntax("broken chord needs a chord", chord_text)),
    };
    let notes = chord.notes();
    let indexes: Vec<usize> = indexes
        .split(',')
        .map(|index| {
            index
                .parse::<usize>()
                .ok()
                .filter(|i| *i < notes.len())
                .ok_or_else(|| StaccatoError::invalid("broken chord index", index))
        })
        .collect::<Result<_>>()?;

    let root = &chord.root;
    let duration = if root.duration_explicit {
        root.duration
    } else {
        context.config.settings.notes.default_duration
    };
    let suffix = (duration_string(duration / indexes.len() as f64) + &root.velocity_string())
        .to_uppercase();
    let pieces: Vec<String> = indexes
        .iter()
        .map(|&i| format!("[{}]{suffix}", notes[i].value))
        .collect();
    Ok(pieces.join(" "))
}
