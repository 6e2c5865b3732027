//! Musical time conversions.
//!
//! Note durations are fractions of a whole note (a quarter note is 0.25), so
//! one beat in the usual sense is 0.25 here. Offline sequences count integer
//! ticks at a fixed resolution; real-time playback counts milliseconds at the
//! current tempo.

use std::cmp::Ordering;
use std::ops::{Add, Sub};

/// Default ticks per beat for offline sequences.
pub const DEFAULT_RESOLUTION: u32 = 128;

/// Default tempo in beats per minute.
pub const DEFAULT_TEMPO: u32 = 120;

/// Sequence position measured in integer ticks.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct Tick(u64);

impl Tick {
    /// The start of a track.
    pub const ZERO: Tick = Tick(0);

    pub fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Convert a whole-note duration into ticks: `resolution * beats * 4`, truncated.
    pub fn from_beats(beats: f64, resolution: u32) -> Self {
        Self((resolution as f64 * beats * 4.0).max(0.0) as u64)
    }

    /// Raw tick count.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Convert back into a whole-note duration.
    pub fn as_beats(self, resolution: u32) -> f64 {
        self.0 as f64 / (resolution as f64 * 4.0)
    }
}

impl Ord for Tick {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Tick {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Tick {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Tick {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

/// Milliseconds taken by a whole-note duration at `bpm`: `beats * 4 * 60000 / bpm`.
pub fn beats_to_millis(beats: f64, bpm: u32) -> f64 {
    beats * 4.0 * 60_000.0 / bpm.max(1) as f64
}

/// Inverse of [`beats_to_millis`].
pub fn millis_to_beats(millis: f64, bpm: u32) -> f64 {
    millis * bpm.max(1) as f64 / (4.0 * 60_000.0)
}

/// Microseconds per quarter note, the payload of a tempo meta event.
pub fn bpm_to_mpqn(bpm: u32) -> u32 {
    60_000_000 / bpm.max(1)
}

/// Inverse of [`bpm_to_mpqn`], rounded to the nearest whole BPM.
pub fn mpqn_to_bpm(mpqn: u32) -> u32 {
    (60_000_000.0 / mpqn.max(1) as f64).round() as u32
}
