//! Aftertouch: `:CP(pressure)` and `:PP(key,pressure)`.

use crate::error::{Result, StaccatoError};
use crate::parser::ParseContext;

use super::{expect_params, int_param, SubparserFunction};

pub struct ChannelPressureFunction;

impl SubparserFunction for ChannelPressureFunction {
    fn names(&self) -> &'static [&'static str] {
        &["CP", "CHANNELPRESSURE"]
    }

    fn apply(&self, params: &str, context: &mut ParseContext<'_>) -> Result<()> {
        let parts = expect_params("channel pressure", params, 1)?;
        let pressure = int_param(parts[0], None, context)?;
        let pressure = StaccatoError::check_u8("pressure", pressure, 0, 127)?;
        context.bus.fire_channel_pressure_parsed(pressure);
        Ok(())
    }
}

pub struct PolyPressureFunction;

impl SubparserFunction for PolyPressureFunction {
    fn names(&self) -> &'static [&'static str] {
        &["PP", "POLYPRESSURE"]
    }

    fn apply(&self, params: &str, context: &mut ParseContext<'_>) -> Result<()> {
        let parts = expect_params("poly pressure", params, 2)?;
        let key = StaccatoError::check_u8("key", int_param(parts[0], None, context)?, 0, 127)?;
        let pressure = int_param(parts[1], None, context)?;
        let pressure = StaccatoError::check_u8("pressure", pressure, 0, 127)?;
        context.bus.fire_polyphonic_pressure_parsed(key, pressure);
        Ok(())
    }
}
