//! Key (`K:GMAJ`, `KEY:GMAJ`) and time (`TIME:3/4`) signatures.

use crate::error::Result;
use crate::theory::{Key, TimeSignature};

use super::{ParseContext, Subparser};

const KEY_PREFIXES: [&str; 2] = ["KEY:", "K:"];
const TIME_PREFIX: &str = "TIME:";

pub struct SignatureSubparser;

impl Subparser for SignatureSubparser {
    fn matches(&self, fragment: &str) -> bool {
        fragment.starts_with(TIME_PREFIX) || KEY_PREFIXES.iter().any(|p| fragment.starts_with(p))
    }

    fn parse(&self, fragment: &str, context: &mut ParseContext<'_>) -> Result<usize> {
        if let Some(body) = fragment.strip_prefix(TIME_PREFIX) {
            let signature = TimeSignature::parse(body)?;
            context.state.time_signature = signature;
            context
                .bus
                .fire_time_signature_parsed(signature.beats_per_measure, signature.power_of_two());
            return Ok(fragment.len());
        }
        let body = KEY_PREFIXES
            .iter()
            .find_map(|p| fragment.strip_prefix(p))
            .unwrap_or(fragment);
        let key = Key::parse(body)?;
        context.state.key = key;
        context
            .bus
            .fire_key_signature_parsed(key.key_signature(), key.mode());
        Ok(fragment.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ParserEvent;
    use crate::parser::context::TestContext;
    use crate::theory::Mode;

    #[test]
    fn key_signature_updates_context() {
        let mut t = TestContext::new();
        SignatureSubparser.parse("K:EBMAJ", &mut t.context()).unwrap();
        assert_eq!(t.state.key.key_signature(), -3);
        SignatureSubparser.parse("KEY:EMIN", &mut t.context()).unwrap();
        assert_eq!(
            t.events(),
            vec![
                ParserEvent::KeySignatureParsed {
                    signature: -3,
                    mode: Mode::Major
                },
                ParserEvent::KeySignatureParsed {
                    signature: 1,
                    mode: Mode::Minor
                },
            ]
        );
    }

    #[test]
    fn time_signature_updates_context() {
        let mut t = TestContext::new();
        SignatureSubparser.parse("TIME:6/8", &mut t.context()).unwrap();
        assert_eq!(t.state.time_signature, TimeSignature::new(6, 8));
        assert_eq!(
            t.events(),
            vec![ParserEvent::TimeSignatureParsed {
                numerator: 6,
                power_of_two: 3
            }]
        );
    }

    #[test]
    fn bad_signatures() {
        let mut t = TestContext::new();
        assert!(SignatureSubparser.parse("TIME:6/7", &mut t.context()).is_err());
        assert!(SignatureSubparser.parse("K:HMAJ", &mut t.context()).is_err());
        assert!(!SignatureSubparser.matches("KQ"));
    }
}
