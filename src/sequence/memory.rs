//! In-memory sequence: per-track event lists kept in tick order.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::time::{Tick, DEFAULT_RESOLUTION};

use super::{SequenceEvent, SequenceSink};

/// An event and the tick it happens at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEvent {
    pub tick: Tick,
    pub event: SequenceEvent,
}

/// A note-on paired with its note-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencedNote {
    pub note: u8,
    pub on_velocity: u8,
    pub off_velocity: u8,
    pub start: Tick,
    pub end: Tick,
}

impl SequencedNote {
    pub fn length(&self) -> Tick {
        self.end - self.start
    }
}

/// Tracks of tick-sorted events at a fixed resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    resolution: u32,
    tracks: Vec<Vec<TimedEvent>>,
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}

impl Sequence {
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution: resolution.max(1),
            tracks: Vec::new(),
        }
    }

    /// Ticks per beat.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn tracks(&self) -> &[Vec<TimedEvent>] {
        &self.tracks
    }

    /// Events of `track`, empty if the track was never created.
    pub fn track(&self, track: usize) -> &[TimedEvent] {
        self.tracks.get(track).map_or(&[], Vec::as_slice)
    }

    /// Tick of the last event on `track`.
    pub fn end_tick(&self, track: usize) -> Tick {
        self.track(track).last().map_or(Tick::ZERO, |e| e.tick)
    }

    /// Notes on `track`, each note-on matched with the next note-off of the
    /// same pitch. Ordered by start tick; unterminated notes are dropped.
    pub fn notes(&self, track: usize) -> Vec<SequencedNote> {
        let mut open: HashMap<u8, VecDeque<(Tick, u8)>> = HashMap::new();
        let mut notes = Vec::new();
        for timed in self.track(track) {
            match timed.event {
                SequenceEvent::NoteOn { note, velocity, .. } => {
                    open.entry(note).or_default().push_back((timed.tick, velocity));
                }
                SequenceEvent::NoteOff { note, velocity, .. } => {
                    if let Some((start, on_velocity)) =
                        open.get_mut(&note).and_then(VecDeque::pop_front)
                    {
                        notes.push(SequencedNote {
                            note,
                            on_velocity,
                            off_velocity: velocity,
                            start,
                            end: timed.tick,
                        });
                    }
                }
                _ => {}
            }
        }
        notes.sort_by_key(|n| n.start);
        notes
    }

    fn ensure_track(&mut self, track: u8) {
        let needed = track as usize + 1;
        if self.tracks.len() < needed {
            self.tracks.resize_with(needed, Vec::new);
        }
    }
}

impl SequenceSink for Sequence {
    fn create_track(&mut self, track: u8) {
        self.ensure_track(track);
    }

    /// Insert after any events already at `tick`, keeping insertion order
    /// within a tick.
    fn add_event(&mut self, track: u8, tick: Tick, event: SequenceEvent) {
        self.ensure_track(track);
        let events = &mut self.tracks[track as usize];
        let pos = events.partition_point(|e| e.tick <= tick);
        events.insert(pos, TimedEvent { tick, event });
    }
}

impl fmt::Display for Sequence {
    /// One line per event: `track tick event`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "resolution {}", self.resolution)?;
        for (index, events) in self.tracks.iter().enumerate() {
            for timed in events {
                writeln!(f, "{index:>2} {:>8} {:?}", timed.tick.value(), timed.event)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(note: u8) -> SequenceEvent {
        SequenceEvent::NoteOn {
            channel: 0,
            note,
            velocity: 64,
        }
    }

    fn off(note: u8) -> SequenceEvent {
        SequenceEvent::NoteOff {
            channel: 0,
            note,
            velocity: 64,
        }
    }

    #[test]
    fn events_stay_tick_sorted() {
        let mut seq = Sequence::new(128);
        seq.add_event(0, Tick::new(256), on(62));
        seq.add_event(0, Tick::new(0), on(60));
        seq.add_event(0, Tick::new(128), off(60));
        let ticks: Vec<u64> = seq.track(0).iter().map(|e| e.tick.value()).collect();
        assert_eq!(ticks, vec![0, 128, 256]);
    }

    #[test]
    fn same_tick_keeps_insertion_order() {
        let mut seq = Sequence::new(128);
        seq.add_event(0, Tick::new(128), off(60));
        seq.add_event(0, Tick::new(128), on(62));
        assert_eq!(seq.track(0)[0].event, off(60));
        assert_eq!(seq.track(0)[1].event, on(62));
    }

    #[test]
    fn adding_to_a_new_track_creates_it() {
        let mut seq = Sequence::new(128);
        seq.add_event(3, Tick::ZERO, on(60));
        assert_eq!(seq.tracks().len(), 4);
        assert!(seq.track(1).is_empty());
        assert!(seq.track(9).is_empty());
    }

    #[test]
    fn notes_pair_on_and_off() {
        let mut seq = Sequence::new(128);
        seq.add_event(0, Tick::new(0), on(60));
        seq.add_event(0, Tick::new(0), on(64));
        seq.add_event(0, Tick::new(128), off(64));
        seq.add_event(0, Tick::new(256), off(60));
        seq.add_event(0, Tick::new(300), on(67));
        let notes = seq.notes(0);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].note, 64);
        assert_eq!(notes[0].length().value(), 128);
        assert_eq!(notes[1].note, 60);
        assert_eq!(notes[1].length().value(), 256);
    }
}
