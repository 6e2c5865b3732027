//! Pre-computes when every parsed event happens, in milliseconds.
//!
//! [`TemporalListener`] places notes with the same track/layer algorithm as
//! the sequencers, converting durations at the tempo in effect. The result
//! can be replayed later in time order, e.g. to drive a live performance
//! without parsing on the hot path.

use std::collections::BTreeMap;

use log::debug;

use crate::event::{EventBus, Listener, ParserEvent};
use crate::theory::Note;
use crate::time::{beats_to_millis, TrackTimeManager, DEFAULT_TEMPO};

/// An event and the track and layer it was parsed on.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalEvent {
    pub track: u8,
    pub layer: u8,
    pub event: ParserEvent,
}

/// Records parser events keyed by the millisecond they occur at.
#[derive(Debug)]
pub struct TemporalListener {
    events: BTreeMap<u64, Vec<TemporalEvent>>,
    time: TrackTimeManager,
    tempo: u32,
    default_duration: f64,
}

impl Default for TemporalListener {
    fn default() -> Self {
        Self::new()
    }
}

impl TemporalListener {
    pub fn new() -> Self {
        let mut time = TrackTimeManager::new();
        time.set_current_track(0);
        Self {
            events: BTreeMap::new(),
            time,
            tempo: DEFAULT_TEMPO,
            default_duration: 0.25,
        }
    }

    /// Duration used for notes parsed without one.
    pub fn set_default_duration(&mut self, duration: f64) {
        self.default_duration = duration;
    }

    pub fn events(&self) -> &BTreeMap<u64, Vec<TemporalEvent>> {
        &self.events
    }

    /// Time of the last recorded event or note end.
    pub fn duration_ms(&self) -> u64 {
        let last_event = self.events.keys().next_back().copied().unwrap_or(0);
        let last_note = self
            .time
            .created_tracks()
            .map(|t| self.time.latest_track_time(t).round() as u64)
            .max()
            .unwrap_or(0);
        last_event.max(last_note)
    }

    pub fn clear(&mut self) {
        *self = Self {
            default_duration: self.default_duration,
            ..Self::new()
        };
    }

    /// Fire the recorded events in time order on `bus`, switching tracks
    /// and layers as needed, between before/after parsing notifications.
    pub fn replay_into(&self, bus: &EventBus) {
        bus.fire_before_parsing_starts();
        let mut position: Option<(u8, u8)> = None;
        for entry in self.events.values().flatten() {
            if position.map(|(track, _)| track) != Some(entry.track) {
                bus.fire_track_changed(entry.track);
                bus.fire_layer_changed(entry.layer);
            } else if position.map(|(_, layer)| layer) != Some(entry.layer) {
                bus.fire_layer_changed(entry.layer);
            }
            position = Some((entry.track, entry.layer));
            bus.fire(&entry.event);
        }
        bus.fire_after_parsing_finished();
    }

    fn record_at(&mut self, millis: f64, event: ParserEvent) {
        let entry = TemporalEvent {
            track: self.time.current_track(),
            layer: self.time.current_layer(),
            event,
        };
        self.events
            .entry(millis.max(0.0).round() as u64)
            .or_default()
            .push(entry);
    }

    fn record(&mut self, event: ParserEvent) {
        let now = self.time.time();
        self.record_at(now, event);
    }

    fn millis(&self, note: &Note) -> f64 {
        let duration = if note.duration > 0.0 {
            note.duration
        } else {
            self.default_duration
        };
        beats_to_millis(duration, self.tempo)
    }
}

impl Listener for TemporalListener {
    fn on_event(&mut self, event: &ParserEvent) {
        match event {
            ParserEvent::TrackChanged(track) => {
                self.time.set_current_track(*track);
            }
            ParserEvent::LayerChanged(layer) => self.time.set_current_layer(*layer),
            ParserEvent::TempoChanged(bpm) => {
                self.tempo = (*bpm).max(1);
                self.record(event.clone());
            }
            ParserEvent::TrackBeatTimeBookmarked(name) => self.time.add_bookmark(name.clone()),
            ParserEvent::TrackBeatTimeBookmarkRequested(name) => {
                if !self.time.jump_to_bookmark(name) {
                    debug!("no bookmark named '{name}', ignoring");
                }
            }
            ParserEvent::TrackBeatTimeRequested(beats) => {
                self.time.set_time(beats_to_millis(*beats, self.tempo))
            }
            ParserEvent::NoteParsed(note) => {
                let duration = self.millis(note);
                let placement = self.time.place_note(note, duration);
                self.record_at(placement.start, event.clone());
            }
            ParserEvent::ChordParsed(chord) => {
                let duration = self.millis(&chord.root);
                let mut start = self.time.time();
                for (index, note) in chord.notes().iter().enumerate() {
                    let placement = self.time.place_note(note, duration);
                    if index == 0 {
                        start = placement.start;
                    }
                }
                self.record_at(start, event.clone());
            }
            ParserEvent::BeforeParsingStarts | ParserEvent::AfterParsingFinished => {}
            _ => self.record(event.clone()),
        }
    }
}
