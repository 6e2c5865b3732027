//! MIDI devices: live output, controller input and the raw message codec.

pub mod input;
pub mod message;
pub mod output;

pub use input::MidiInputReceiver;
pub use output::MidirSink;
