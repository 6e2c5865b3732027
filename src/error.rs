//! Error types for parsing and materializing Staccato notation.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StaccatoError>;

/// An error raised while preprocessing, parsing, or playing notation.
#[derive(Debug, Error)]
pub enum StaccatoError {
    /// No subparser claimed a fragment while the parser was in strict mode.
    #[error("No parser was found for the following element: {token}{}", position_suffix(.position))]
    UnrecognizedToken {
        token: String,
        position: Option<usize>,
    },

    /// A named symbol was absent from the dictionary.
    #[error("unknown {kind} '{name}'")]
    Lookup { kind: &'static str, name: String },

    /// A value could not be interpreted.
    #[error("invalid {context}: '{value}'")]
    InvalidValue { context: &'static str, value: String },

    /// A numeric value fell outside its documented range.
    #[error("{what} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        what: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Malformed notation inside an otherwise recognized token.
    #[error("{message} in '{token}'")]
    Syntax { message: String, token: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("MIDI error: {0}")]
    Midi(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

fn position_suffix(position: &Option<usize>) -> String {
    match position {
        Some(p) => format!(" (Position {p})"),
        None => String::new(),
    }
}

impl StaccatoError {
    pub fn lookup(kind: &'static str, name: impl Into<String>) -> Self {
        Self::Lookup {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid(context: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            context,
            value: value.into(),
        }
    }

    pub fn syntax(message: impl Into<String>, token: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
            token: token.into(),
        }
    }

    /// Check `value` against an inclusive range, returning it narrowed to `u8`.
    pub fn check_u8(what: &'static str, value: i64, min: u8, max: u8) -> Result<u8> {
        if value < min as i64 || value > max as i64 {
            return Err(Self::OutOfRange {
                what,
                value,
                min: min as i64,
                max: max as i64,
            });
        }
        Ok(value as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_token_message_with_position() {
        let err = StaccatoError::UnrecognizedToken {
            token: "ZZZ".into(),
            position: Some(4),
        };
        assert_eq!(
            err.to_string(),
            "No parser was found for the following element: ZZZ (Position 4)"
        );
    }

    #[test]
    fn unrecognized_token_message_without_position() {
        let err = StaccatoError::UnrecognizedToken {
            token: "ZZZ".into(),
            position: None,
        };
        assert_eq!(
            err.to_string(),
            "No parser was found for the following element: ZZZ"
        );
    }

    #[test]
    fn check_u8_accepts_bounds() {
        assert_eq!(StaccatoError::check_u8("velocity", 0, 0, 127).unwrap(), 0);
        assert_eq!(StaccatoError::check_u8("velocity", 127, 0, 127).unwrap(), 127);
    }

    #[test]
    fn check_u8_rejects_overflow() {
        let err = StaccatoError::check_u8("velocity", 128, 0, 127).unwrap_err();
        assert!(matches!(err, StaccatoError::OutOfRange { value: 128, .. }));
    }
}
