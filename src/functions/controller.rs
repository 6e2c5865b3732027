//! `:CE(controller,value)`, with controller and value given as numbers or
//! dictionary names such as `VOLUME` and `ON`.
//!
//! Names above 127 are combined 14-bit controllers (`coarse * 128 + fine`).
//! Those fire the fine controller with the low seven bits of the value, then
//! the coarse controller with the high seven bits.

use crate::error::{Result, StaccatoError};
use crate::parser::ParseContext;

use super::{expect_params, int_param, SubparserFunction};

pub struct ControllerFunction;

impl SubparserFunction for ControllerFunction {
    fn names(&self) -> &'static [&'static str] {
        &["CE", "CON", "CONTROLLER", "CONTROLLEREVENT"]
    }

    fn apply(&self, params: &str, context: &mut ParseContext<'_>) -> Result<()> {
        let parts = expect_params("controller", params, 2)?;
        let controller = int_param(parts[0], Some("controller"), context)?;
        let value = int_param(parts[1], Some("controller value"), context)?;

        if controller > 127 {
            let coarse = StaccatoError::check_u8("controller", controller >> 7, 0, 127)?;
            let fine = (controller & 0x7F) as u8;
            if !(0..=16383).contains(&value) {
                return Err(StaccatoError::OutOfRange {
                    what: "controller value",
                    value,
                    min: 0,
                    max: 16383,
                });
            }
            context
                .bus
                .fire_controller_event_parsed(fine, (value & 0x7F) as u8);
            context
                .bus
                .fire_controller_event_parsed(coarse, (value >> 7) as u8);
        } else {
            let controller = StaccatoError::check_u8("controller", controller, 0, 127)?;
            let value = StaccatoError::check_u8("controller value", value, 0, 127)?;
            context.bus.fire_controller_event_parsed(controller, value);
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
    fn numeric_controller() {
        let mut t = TestContext::new();
        ControllerFunction.apply("7,100", &mut t.context()).unwrap();
        assert_eq!(
            t.events(),
            vec![ParserEvent::ControllerEventParsed {
                controller: 7,
                value: 100
            }]
        );
    }

    #[test]
    fn named_controller_and_value() {
        let mut t = TestContext::new();
        ControllerFunction.apply("HOLD_PEDAL,ON", &mut t.context()).unwrap();
        ControllerFunction.apply("[hold_pedal],off", &mut t.context()).unwrap();
        assert_eq!(
            t.events(),
            vec![
                ParserEvent::ControllerEventParsed {
                    controller: 64,
                    value: 127
                },
                ParserEvent::ControllerEventParsed {
                    controller: 64,
                    value: 0
                },
            ]
        );
    }

    #[test]
    fn combined_controller_fires_fine_then_coarse() {
        // VOLUME = 7 * 128 + 39
        let mut t = TestContext::new();
        ControllerFunction.apply("VOLUME,16383", &mut t.context()).unwrap();
        ControllerFunction.apply("VOLUME,8192", &mut t.context()).unwrap();
        assert_eq!(
            t.events(),
            vec![
                ParserEvent::ControllerEventParsed {
                    controller: 39,
                    value: 127
                },
                ParserEvent::ControllerEventParsed {
                    controller: 7,
                    value: 127
                },
                ParserEvent::ControllerEventParsed {
                    controller: 39,
                    value: 0
                },
                ParserEvent::ControllerEventParsed {
                    controller: 7,
                    value: 64
                },
            ]
        );
    }

    #[test]
    fn errors() {
        let mut t = TestContext::new();
        assert!(matches!(
            ControllerFunction.apply("NOPE,1", &mut t.context()),
            Err(StaccatoError::Lookup { .. })
        ));
        assert!(ControllerFunction.apply("7,128", &mut t.context()).is_err());
        assert!(ControllerFunction.apply("7", &mut t.context()).is_err());
    }
}
