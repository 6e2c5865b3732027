//! Expands calls to preprocessor functions (`:TRILL(...)`, `:ARP(...)`).
//! Calls to other functions stay for the function subparser.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::parser::ParseContext;

use super::Preprocessor;

static CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r":([A-Za-z][A-Za-z0-9_]*)\(([^)]*)\)").unwrap());

pub struct FunctionPreprocessor;

impl Preprocessor for FunctionPreprocessor {
    fn preprocess(&self, text: &str, context: &mut ParseContext<'_>) -> Result<String> {
        let config = context.config;
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in CALL.captures_iter(text) {
            let Some(function) = config.functions.preprocessor_function(&caps[1]) else {
                continue;
            };
            let Some(call) = caps.get(0) else {
                continue;
            };
            out.push_str(&text[last..call.start()]);
            out.push_str(&function.apply(&caps[2], context)?);
            last = call.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }
}
