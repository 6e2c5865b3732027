//! Beat, tick and millisecond time, and the track/layer time manager.

pub mod beat;
pub mod tracks;

pub use beat::{
    beats_to_millis, bpm_to_mpqn, millis_to_beats, mpqn_to_bpm, Tick, DEFAULT_RESOLUTION,
    DEFAULT_TEMPO,
};
pub use tracks::{NotePlacement, TrackTimeManager, MAX_LAYERS, MAX_TRACKS};
