//! Music-theory value objects produced and consumed by the parser.

pub mod chord;
pub mod intervals;
pub mod key;
pub mod note;

pub use chord::{Chord, ChordTable};
pub use intervals::Intervals;
pub use key::{Key, Mode, TimeSignature};
pub use note::Note;
