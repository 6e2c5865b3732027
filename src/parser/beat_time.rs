//! Time requests (`@2.5`) and bookmark requests (`@#chorus`).

use crate::error::{Result, StaccatoError};

use super::{ParseContext, Subparser};

pub struct BeatTimeSubparser;

impl Subparser for BeatTimeSubparser {
    fn matches(&self, fragment: &str) -> bool {
        fragment.starts_with('@')
    }

    fn parse(&self, fragment: &str, context: &mut ParseContext<'_>) -> Result<usize> {
        if let Some(name) = fragment.strip_prefix("@#") {
            if name.is_empty() {
                return Err(StaccatoError::syntax("bookmark needs a name", fragment));
            }
            context.bus.fire_track_beat_time_bookmark_requested(name);
            return Ok(fragment.len());
        }
        let time: f64 = fragment[1..]
            .parse()
            .map_err(|_| StaccatoError::invalid("beat time", fragment))?;
        if time < 0.0 || !time.is_finite() {
            return Err(StaccatoError::invalid("beat time", fragment));
        }
        context.bus.fire_track_beat_time_requested(time);
        Ok(fragment.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ParserEvent;
    use crate::parser::context::TestContext;

    #[test]
    fn time_and_bookmark_requests() {
        let mut t = TestContext::new();
        BeatTimeSubparser.parse("@2.5", &mut t.context()).unwrap();
        BeatTimeSubparser.parse("@#CHORUS", &mut t.context()).unwrap();
        assert_eq!(
            t.events(),
            vec![
                ParserEvent::TrackBeatTimeRequested(2.5),
                ParserEvent::TrackBeatTimeBookmarkRequested("CHORUS".into()),
            ]
        );
    }

    #[test]
    fn malformed_times() {
        let mut t = TestContext::new();
        assert!(BeatTimeSubparser.parse("@X", &mut t.context()).is_err());
        assert!(BeatTimeSubparser.parse("@-1", &mut t.context()).is_err());
        assert!(BeatTimeSubparser.parse("@#", &mut t.context()).is_err());
    }
}
