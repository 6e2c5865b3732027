//! Named functions invoked from notation as `:NAME(params)`.
//!
//! Subparser functions run while parsing and fire events. Preprocessor
//! functions run in the preprocessor chain and expand into notation.

pub mod arpeggiated;
pub mod controller;
pub mod pitch_wheel;
pub mod pressure;
pub mod sysex;
pub mod trill;

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Result, StaccatoError};
use crate::parser::ParseContext;

/// A function handled during dispatch; it fires events.
pub trait SubparserFunction {
    /// Names the function answers to, upper-case.
    fn names(&self) -> &'static [&'static str];

    fn apply(&self, params: &str, context: &mut ParseContext<'_>) -> Result<()>;
}

/// A function expanded during preprocessing; it returns replacement notation.
pub trait PreprocessorFunction {
    fn names(&self) -> &'static [&'static str];

    fn apply(&self, params: &str, context: &ParseContext<'_>) -> Result<String>;
}

/// Function lookup by (case-insensitive) name.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    subparser: HashMap<String, Rc<dyn SubparserFunction>>,
    preprocessor: HashMap<String, Rc<dyn PreprocessorFunction>>,
}

impl FunctionRegistry {
    /// A registry with no functions.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in functions.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add_subparser_function(pitch_wheel::PitchWheelFunction);
        registry.add_subparser_function(controller::ControllerFunction);
        registry.add_subparser_function(pressure::ChannelPressureFunction);
        registry.add_subparser_function(pressure::PolyPressureFunction);
        registry.add_subparser_function(sysex::SysexFunction);
        registry.add_preprocessor_function(trill::TrillFunction);
        registry.add_preprocessor_function(arpeggiated::ArpeggiatedFunction);
        registry
    }

    pub fn add_subparser_function(&mut self, function: impl SubparserFunction + 'static) {
        let function: Rc<dyn SubparserFunction> = Rc::new(function);
        for name in function.names() {
            self.subparser.insert(name.to_uppercase(), function.clone());
        }
    }

    pub fn add_preprocessor_function(&mut self, function: impl PreprocessorFunction + 'static) {
        let function: Rc<dyn PreprocessorFunction> = Rc::new(function);
        for name in function.names() {
            self.preprocessor.insert(name.to_uppercase(), function.clone());
        }
    }

    /// Remove a function name from both tables. Returns false if unknown.
    pub fn remove(&mut self, name: &str) -> bool {
        let name = name.to_uppercase();
        let from_subparsers = self.subparser.remove(&name).is_some();
        let from_preprocessors = self.preprocessor.remove(&name).is_some();
        from_subparsers || from_preprocessors
    }

    pub fn subparser_function(&self, name: &str) -> Option<&Rc<dyn SubparserFunction>> {
        self.subparser.get(&name.to_uppercase())
    }

    pub fn preprocessor_function(&self, name: &str) -> Option<&Rc<dyn PreprocessorFunction>> {
        self.preprocessor.get(&name.to_uppercase())
    }
}

/// Comma-separated parameters, trimmed. An empty string has no parameters.
pub(crate) fn split_params(params: &str) -> Vec<&str> {
    if params.trim().is_empty() {
        return Vec::new();
    }
    params.split(',').map(str::trim).collect()
}

/// An integer parameter, or a dictionary name when `lookup_kind` is given.
pub(crate) fn int_param(
    param: &str,
    lookup_kind: Option<&'static str>,
    context: &ParseContext<'_>,
) -> Result<i64> {
    if let Ok(value) = param.parse::<i64>() {
        return Ok(value);
    }
    match lookup_kind {
        Some(kind) => {
            let name = param
                .strip_prefix('[')
                .and_then(|p| p.strip_suffix(']'))
                .unwrap_or(param);
            Ok(context.lookup(kind, &name.to_uppercase())? as i64)
        }
        None => Err(StaccatoError::invalid("function parameter", param)),
    }
}

/// Exactly `count` parameters, or a syntax error naming the function.
pub(crate) fn expect_params<'p>(
    function: &str,
    params: &'p str,
    count: usize,
) -> Result<Vec<&'p str>> {
    let parts = split_params(params);
    if parts.len() != count {
        return Err(StaccatoError::syntax(
            format!("{function} takes {count} parameter(s)"),
            params,
        ));
    }
    Ok(parts)
}
