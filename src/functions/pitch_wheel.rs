//! `:PW(value)` or `:PW(lsb,msb)`.

use crate::error::{Result, StaccatoError};
use crate::parser::ParseContext;

use super::{int_param, split_params, SubparserFunction};

pub struct PitchWheelFunction;

impl SubparserFunction for PitchWheelFunction {
    fn names(&self) -> &'static [&'static str] {
        &["PW", "PITCHWHEEL", "PB", "PITCHBEND"]
    }

    fn apply(&self, params: &str, context: &mut ParseContext<'_>) -> Result<()> {
        match split_params(params).as_slice() {
            [value] => {
                let value = int_param(value, None, context)?;
                if !(0..=16383).contains(&value) {
                    return Err(StaccatoError::OutOfRange {
                        what: "pitch wheel",
                        value,
                        min: 0,
                        max: 16383,
                    });
                }
                context
                    .bus
                    .fire_pitch_wheel_parsed((value & 0x7F) as u8, (value >> 7) as u8);
            }
            [lsb, msb] => {
                let lsb = int_param(lsb, None, context)?;
                let lsb = StaccatoError::check_u8("pitch wheel lsb", lsb, 0, 127)?;
                let msb = int_param(msb, None, context)?;
                let msb = StaccatoError::check_u8("pitch wheel msb", msb, 0, 127)?;
                context.bus.fire_pitch_wheel_parsed(lsb, msb);
            }
            _ => {
                return Err(StaccatoError::syntax(
                    "pitch wheel takes 1 or 2 parameters",
                    params,
                ))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ParserEvent;
    use crate::parser::context::TestContext;

    #[test]
    fn single_value_is_split() {
        let mut t = TestContext::new();
        PitchWheelFunction.apply("8192", &mut t.context()).unwrap();
        PitchWheelFunction.apply("16383", &mut t.context()).unwrap();
        assert_eq!(
            t.events(),
            vec![
                ParserEvent::PitchWheelParsed { lsb: 0, msb: 64 },
                ParserEvent::PitchWheelParsed { lsb: 127, msb: 127 },
            ]
        );
    }

    #[test]
    fn explicit_bytes() {
        let mut t = TestContext::new();
        PitchWheelFunction.apply("5,10", &mut t.context()).unwrap();
        assert_eq!(t.events(), vec![ParserEvent::PitchWheelParsed { lsb: 5, msb: 10 }]);
    }

    #[test]
    fn range_checked() {
        let mut t = TestContext::new();
        assert!(PitchWheelFunction.apply("16384", &mut t.context()).is_err());
        assert!(PitchWheelFunction.apply("1,128", &mut t.context()).is_err());
        assert!(PitchWheelFunction.apply("", &mut t.context()).is_err());
    }
}
