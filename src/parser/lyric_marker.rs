//! Lyrics (`&text`, `&(two words)`) and markers (`!name`, `!(a name)`).
//!
//! A marker also bookmarks the current time under its own name.

use crate::error::Result;

use super::{ParseContext, Subparser};

/// Stand-in for spaces inside parenthesized lyric and marker text, so the
/// space split keeps the text in one fragment.
pub const PROTECTED_SPACE: char = '\u{00A0}';

pub struct LyricMarkerSubparser;

fn payload(body: &str) -> String {
    let text = body
        .strip_prefix('(')
        .and_then(|b| b.strip_suffix(')'))
        .unwrap_or(body);
    text.replace(PROTECTED_SPACE, " ")
}

impl Subparser for LyricMarkerSubparser {
    fn matches(&self, fragment: &str) -> bool {
        fragment.starts_with('&') || fragment.starts_with('!')
    }

    fn parse(&self, fragment: &str, context: &mut ParseContext<'_>) -> Result<usize> {
        let text = payload(&fragment[1..]);
        if fragment.starts_with('&') {
            context.bus.fire_lyric_parsed(&text);
        } else {
            context.bus.fire_marker_parsed(&text);
            context.bus.fire_track_beat_time_bookmarked(&text);
        }
        Ok(fragment.len())
    }
}
