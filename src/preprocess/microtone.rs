//! `M<hz>` plays the nearest MIDI note bent to the requested frequency.
//!
//! `M445Q` becomes `:PITCHWHEEL(9795) [69]Q :PITCHWHEEL(8192)`.
//!
//! Only plain spaces start a microtone, so words inside protected lyric and
//! marker text are left alone.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, StaccatoError};
use crate::parser::ParseContext;
use crate::theory::note::MIDI_ZERO_HZ;

use super::Preprocessor;

static MICROTONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^| )M(\d+(?:\.\d+)?)(\S*)").unwrap());

/// Centre of the 14-bit pitch wheel.
pub const PITCH_BEND_CENTER: i64 = 8192;
const PITCH_BEND_MAX: i64 = 16383;

pub struct MicrotonePreprocessor;

/// Nearest MIDI note and the pitch wheel value reaching `frequency`.
pub fn note_and_bend(frequency: f64) -> Result<(u8, u16)> {
    if !(frequency > 0.0) {
        return Err(StaccatoError::invalid("microtone frequency", frequency.to_string()));
    }
    let exact = 12.0 * (frequency / MIDI_ZERO_HZ).log2();
    let note = exact.round();
    let note = StaccatoError::check_u8("microtone note", note as i64, 0, 127)?;
    let bend = (PITCH_BEND_CENTER as f64 + (exact - note as f64) * 8192.0).round() as i64;
    Ok((note, bend.clamp(0, PITCH_BEND_MAX) as u16))
}

impl Preprocessor for MicrotonePreprocessor {
    fn preprocess(&self, text: &str, _context: &mut ParseContext<'_>) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in MICROTONE.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let frequency: f64 = caps[2]
                .parse()
                .map_err(|_| StaccatoError::invalid("microtone frequency", &caps[2]))?;
            let (note, bend) = note_and_bend(frequency)?;
            out.push_str(&text[last..whole.start()]);
            out.push_str(&format!(
                "{}:PITCHWHEEL({bend}) [{note}]{} :PITCHWHEEL({PITCH_BEND_CENTER})",
                &caps[1], &caps[3]
            ));
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::context::TestContext;
    use crate::parser::lyric_marker::PROTECTED_SPACE;

    fn run(text: &str) -> Result<String> {
        let mut t = TestContext::new();
        let out = MicrotonePreprocessor.preprocess(text, &mut t.context());
        out
    }

    #[test]
    fn concert_a_needs_no_bend() {
        assert_eq!(note_and_bend(440.0).unwrap(), (69, 8192));
    }

    #[test]
    fn bend_up_and_down() {
        assert_eq!(note_and_bend(445.0).unwrap(), (69, 9795));
        assert_eq!(note_and_bend(430.0).unwrap(), (69, 4932));
    }

    #[test]
    fn expands_with_duration() {
        assert_eq!(
            run("C M445Q D").unwrap(),
            "C :PITCHWHEEL(9795) [69]Q :PITCHWHEEL(8192) D"
        );
    }

    #[test]
    fn expands_without_duration() {
        assert_eq!(
            run("M261.63").unwrap(),
            ":PITCHWHEEL(8194) [60] :PITCHWHEEL(8192)"
        );
    }

    // Rounds to the nearest note, so the bend can pull downwards: 512.3 Hz
    // is note 72 bent down, not 71 bent up. Note values carry no octave
    // offset, and a microtone without a duration keeps the default one.
    #[test]
    fn nearest_note_is_rounded() {
        assert_eq!(note_and_bend(512.3).unwrap(), (72, 5192));
        assert_eq!(note_and_bend(500.0).unwrap(), (71, 9938));
        assert_eq!(
            run("A M512.3 E").unwrap(),
            "A :PITCHWHEEL(5192) [72] :PITCHWHEEL(8192) E"
        );
    }

    #[test]
    fn words_with_m_untouched() {
        assert_eq!(run("TIME:44/2 KEY:C").unwrap(), "TIME:44/2 KEY:C");
    }

    #[test]
    fn protected_lyric_text_untouched() {
        let take = format!("C5Q &(Take{PROTECTED_SPACE}M1) D5Q");
        assert_eq!(run(&take).unwrap(), take);
        let exit = format!("!(Exit{PROTECTED_SPACE}M440)");
        assert_eq!(run(&exit).unwrap(), exit);
    }

    #[test]
    fn inaudible_frequency_is_rejected() {
        assert!(run("M0").is_err());
        assert!(run("M99999").is_err());
    }
}
