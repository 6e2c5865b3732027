//! Tempo changes: `T120`, `T[ALLEGRO]`.

use crate::error::{Result, StaccatoError};

use super::ivl::read_value;
use super::{ParseContext, Subparser};

pub struct TempoSubparser;

impl Subparser for TempoSubparser {
    fn matches(&self, fragment: &str) -> bool {
        fragment.starts_with('T')
    }

    fn parse(&self, fragment: &str, context: &mut ParseContext<'_>) -> Result<usize> {
        let (bpm, consumed) = read_value(fragment, "tempo", context)?;
        if !(1..=u32::MAX as i64).contains(&bpm) {
            return Err(StaccatoError::OutOfRange {
                what: "tempo",
                value: bpm,
                min: 1,
                max: u32::MAX as i64,
            });
        }
        context.bus.fire_tempo_changed(bpm as u32);
        Ok(consumed)
    }
}
