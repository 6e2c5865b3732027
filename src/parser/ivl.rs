//! Voice (`V`), layer (`L`) and instrument (`I`) changes.

use crate::error::{Result, StaccatoError};
use crate::time::{MAX_LAYERS, MAX_TRACKS};

use super::{ParseContext, Subparser};

pub struct IvlSubparser;

/// Read the value after a one-letter prefix: digits, `[NAME]`, or a bare name
/// running to the end of the fragment. Returns the value and bytes consumed.
pub(crate) fn read_value(
    fragment: &str,
    kind: &'static str,
    context: &ParseContext<'_>,
) -> Result<(i64, usize)> {
    let body = &fragment[1..];
    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        let value = body[..digits]
            .parse::<i64>()
            .map_err(|_| StaccatoError::invalid(kind, fragment))?;
        return Ok((value, digits + 1));
    }
    if let Some(inner) = body.strip_prefix('[') {
        let end = inner
            .find(']')
            .ok_or_else(|| StaccatoError::syntax("unclosed '['", fragment))?;
        let value = context.lookup(kind, &inner[..end])?;
        return Ok((value as i64, end + 3));
    }
    if body.is_empty() {
        return Err(StaccatoError::syntax(format!("{kind} needs a value"), fragment));
    }
    Ok((context.lookup(kind, body)? as i64, fragment.len()))
}

impl Subparser for IvlSubparser {
    fn matches(&self, fragment: &str) -> bool {
        matches!(fragment.as_bytes().first(), Some(b'V' | b'L' | b'I'))
    }

    fn parse(&self, fragment: &str, context: &mut ParseContext<'_>) -> Result<usize> {
        match fragment.as_bytes()[0] {
            b'V' => {
                let (value, consumed) = read_value(fragment, "voice", context)?;
                let track = StaccatoError::check_u8("voice", value, 0, MAX_TRACKS as u8 - 1)?;
                context.bus.fire_track_changed(track);
                Ok(consumed)
            }
            b'L' => {
                let (value, consumed) = read_value(fragment, "layer", context)?;
                let layer = StaccatoError::check_u8("layer", value, 0, MAX_LAYERS as u8 - 1)?;
                context.bus.fire_layer_changed(layer);
                Ok(consumed)
            }
            _ => {
                let (value, consumed) = read_value(fragment, "instrument", context)?;
                let instrument = StaccatoError::check_u8("instrument", value, 0, 127)?;
                context.bus.fire_instrument_parsed(instrument);
                Ok(consumed)
            }
        }
    }
}
