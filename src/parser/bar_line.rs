//! Bar lines: `|` or `|<measure>`.

use crate::error::{Result, StaccatoError};

use super::{ParseContext, Subparser};

pub struct BarLineSubparser;

impl Subparser for BarLineSubparser {
    fn matches(&self, fragment: &str) -> bool {
        fragment.starts_with('|')
    }

    fn parse(&self, fragment: &str, context: &mut ParseContext<'_>) -> Result<usize> {
        let digits = fragment[1..].bytes().take_while(u8::is_ascii_digit).count();
        let id = if digits == 0 {
            0
        } else {
            fragment[1..=digits]
                .parse::<u64>()
                .map_err(|_| StaccatoError::invalid("bar line", fragment))?
        };
        context.bus.fire_bar_line_parsed(id);
        Ok(digits + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ParserEvent;
    use crate::parser::context::TestContext;

    #[test]
    fn plain_and_numbered() {
        let mut t = TestContext::new();
        assert_eq!(BarLineSubparser.parse("|", &mut t.context()).unwrap(), 1);
        assert_eq!(BarLineSubparser.parse("|12", &mut t.context()).unwrap(), 3);
        assert_eq!(
            t.events(),
            vec![ParserEvent::BarLineParsed(0), ParserEvent::BarLineParsed(12)]
        );
    }
}
