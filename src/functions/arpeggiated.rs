//! `:ARPEGGIATED(chord)` plays a chord's notes one after another within the
//! chord's duration.

use crate::error::{Result, StaccatoError};
use crate::parser::note::NoteElement;
use crate::parser::ParseContext;
use crate::theory::note::duration_string;

use super::PreprocessorFunction;

pub struct ArpeggiatedFunction;

impl PreprocessorFunction for ArpeggiatedFunction {
    fn names(&self) -> &'static [&'static str] {
        &["ARPEGGIATED", "ARP"]
    }

    fn apply(&self, params: &str, context: &ParseContext<'_>) -> Result<String> {
        let text = params.trim().to_uppercase();
        let (elements, consumed) = context.note_reader().read(&text)?;
        let chord = match elements.as_slice() {
            [NoteElement::Chord(chord)] if consumed == text.len() => chord,
            _ => return Err(StaccatoError::invalid("arpeggiated chord", text.as_str())),
        };
        let notes = chord.notes();
        let duration = if chord.root.duration_explicit {
            chord.root.duration
        } else {
            context.config.settings.notes.default_duration
        };
        let each = duration / notes.len() as f64;
        let suffix = duration_string(each).to_uppercase() + &chord.root.velocity_string().to_uppercase();
        Ok(notes
            .iter()
            .map(|n| format!("[{}]{suffix}", n.value))
            .collect::<Vec<_>>()
            .join("_"))
    }
}
