//! `:SYSEX(0xF0,0x43,...,0xF7)`: decimal or `0x` hex bytes.

use crate::error::{Result, StaccatoError};
use crate::parser::ParseContext;

use super::{split_params, SubparserFunction};

pub struct SysexFunction;

fn parse_byte(text: &str) -> Result<u8> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => text.parse::<u8>(),
    };
    parsed.map_err(|_| StaccatoError::invalid("sysex byte", text))
}

impl SubparserFunction for SysexFunction {
    fn names(&self) -> &'static [&'static str] {
        &["SYSEX", "SX"]
    }

    fn apply(&self, params: &str, context: &mut ParseContext<'_>) -> Result<()> {
        let bytes = split_params(params)
            .into_iter()
            .map(parse_byte)
            .collect::<Result<Vec<u8>>>()?;
        if bytes.is_empty() {
            return Err(StaccatoError::syntax("sysex needs at least one byte", params));
        }
        context.bus.fire_system_exclusive_parsed(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ParserEvent;
    use crate::parser::context::TestContext;

    #[test]
    fn hex_and_decimal_bytes() {
        let mut t = TestContext::new();
        SysexFunction.apply("0xF0,67,0x10,0xf7", &mut t.context()).unwrap();
        assert_eq!(
            t.events(),
            vec![ParserEvent::SystemExclusiveParsed(vec![0xF0, 67, 0x10, 0xF7])]
        );
    }

    #[test]
    fn bad_bytes() {
        let mut t = TestContext::new();
        assert!(SysexFunction.apply("0x100", &mut t.context()).is_err());
        assert!(SysexFunction.apply("", &mut t.context()).is_err());
        assert!(SysexFunction.apply("ZZ", &mut t.context()).is_err());
    }
}
