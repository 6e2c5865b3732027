//! Function calls: `:NAME(p1,p2,...)`.
//!
//! Registered subparser functions fire their own events; any other name is
//! reported as a generic function event carrying the raw parameters.

use crate::error::{Result, StaccatoError};

use super::{ParseContext, Subparser};

pub struct FunctionSubparser;

/// Split `:NAME(params)` into name, parameters and bytes consumed.
pub(crate) fn split_call(fragment: &str) -> Result<(&str, &str, usize)> {
    let body = fragment.strip_prefix(':').unwrap_or(fragment);
    let Some(open) = body.find('(') else {
        if body.is_empty() {
            return Err(StaccatoError::syntax("function needs a name", fragment));
        }
        return Ok((body, "", fragment.len()));
    };
    let close = body
        .rfind(')')
        .filter(|close| *close > open)
        .ok_or_else(|| StaccatoError::syntax("unclosed '('", fragment))?;
    let consumed = fragment.len() - body.len() + close + 1;
    Ok((&body[..open], &body[open + 1..close], consumed))
}

impl Subparser for FunctionSubparser {
    fn matches(&self, fragment: &str) -> bool {
        fragment.starts_with(':')
    }

    fn parse(&self, fragment: &str, context: &mut ParseContext<'_>) -> Result<usize> {
        let (name, params, consumed) = split_call(fragment)?;
        let name = name.to_uppercase();
        let config = context.config;
        match config.functions.subparser_function(&name) {
            Some(function) => function.apply(params, context)?,
            None => context.bus.fire_function_parsed(&name, params),
        }
        Ok(consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ParserEvent;
    use crate::parser::context::TestContext;

    #[test]
    fn split_call_forms() {
        assert_eq!(split_call(":PW(8192)").unwrap(), ("PW", "8192", 9));
        assert_eq!(split_call(":FOO").unwrap(), ("FOO", "", 4));
        assert_eq!(split_call(":CE(7,100)C").unwrap(), ("CE", "7,100", 10));
        assert!(split_call(":PW(1").is_err());
    }

    #[test]
    fn registered_function_fires_its_event() {
        let mut t = TestContext::new();
        FunctionSubparser.parse(":PW(8192)", &mut t.context()).unwrap();
        assert_eq!(t.events(), vec![ParserEvent::PitchWheelParsed { lsb: 0, msb: 64 }]);
    }

    #[test]
    fn unknown_function_is_generic() {
        let mut t = TestContext::new();
        FunctionSubparser.parse(":Swing(Medium,2)", &mut t.context()).unwrap();
        assert_eq!(
            t.events(),
            vec![ParserEvent::FunctionParsed {
                id: "SWING".into(),
                message: "Medium,2".into()
            }]
        );
    }
}
