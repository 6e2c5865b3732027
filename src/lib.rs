//! Staccato: a compact text notation for music, parsed into events that can
//! be sequenced offline, played live over MIDI, or written back as notation.
//!
//! ```no_run
//! use staccato::sequence::materialize_default;
//!
//! let sequence = materialize_default("V0 I[PIANO] C5Q E5Q G5H").unwrap();
//! assert_eq!(sequence.notes(0).len(), 3);
//! ```

pub mod config;
pub mod dictionary;
pub mod error;
pub mod event;
pub mod functions;
pub mod midi;
pub mod parser;
pub mod pattern;
pub mod preprocess;
pub mod realtime;
pub mod sequence;
pub mod temporal;
pub mod theory;
pub mod time;
pub mod token;

pub use config::StaccatoConfig;
pub use error::{Result, StaccatoError};
pub use event::{EventBus, Listener, ParserEvent};
pub use parser::StaccatoParser;
pub use pattern::{Pattern, StaccatoListener};
