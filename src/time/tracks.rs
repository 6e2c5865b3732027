//! Per-track, per-layer time cursors.
//!
//! Cursors are unit-agnostic: the offline sequencer advances them in whole
//! notes, the real-time listener in milliseconds. Callers convert a note's
//! duration before handing it over.

use std::collections::HashMap;

use crate::theory::Note;

/// Number of tracks (MIDI channels).
pub const MAX_TRACKS: usize = 16;

/// Number of layers per track.
pub const MAX_LAYERS: usize = 16;

/// Where a note landed on its track's timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotePlacement {
    /// Note-on time, None for rests and tie continuations.
    pub on: Option<f64>,
    /// Note-off time, None for rests and notes that start a tie.
    pub off: Option<f64>,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    time: f64,
    /// Start of the current harmonic group.
    anchor: f64,
    /// Furthest point reached by any note of the current harmonic group.
    group_end: f64,
}

/// Tracks the running time of every (track, layer) pair.
#[derive(Debug, Clone)]
pub struct TrackTimeManager {
    cursors: [[Cursor; MAX_LAYERS]; MAX_TRACKS],
    current_track: u8,
    current_layer: [u8; MAX_TRACKS],
    /// Highest track created so far; tracks below it exist too.
    last_created_track: Option<u8>,
    bookmarks: HashMap<String, f64>,
}

impl Default for TrackTimeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackTimeManager {
    pub fn new() -> Self {
        Self {
            cursors: [[Cursor::default(); MAX_LAYERS]; MAX_TRACKS],
            current_track: 0,
            current_layer: [0; MAX_TRACKS],
            last_created_track: None,
            bookmarks: HashMap::new(),
        }
    }

    /// Forget all times, tracks and bookmarks.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn current_track(&self) -> u8 {
        self.current_track
    }

    pub fn current_layer(&self) -> u8 {
        self.current_layer[self.current_track as usize]
    }

    /// Switch tracks, creating every track up to `track` that does not exist
    /// yet. Returns the newly created track numbers in ascending order.
    pub fn set_current_track(&mut self, track: u8) -> Vec<u8> {
        let track = track.min(MAX_TRACKS as u8 - 1);
        self.current_track = track;
        let first_new = self.last_created_track.map_or(0, |t| t + 1);
        if track < first_new {
            return Vec::new();
        }
        self.last_created_track = Some(track);
        (first_new..=track).collect()
    }

    /// Switch layers on the current track. The layer keeps its own time.
    pub fn set_current_layer(&mut self, layer: u8) {
        self.current_layer[self.current_track as usize] = layer.min(MAX_LAYERS as u8 - 1);
    }

    /// Tracks created so far, in ascending order.
    pub fn created_tracks(&self) -> impl Iterator<Item = u8> {
        self.last_created_track.into_iter().flat_map(|last| 0..=last)
    }

    pub fn is_created(&self, track: u8) -> bool {
        self.last_created_track.is_some_and(|last| track <= last)
    }

    /// Current time of the current track and layer.
    pub fn time(&self) -> f64 {
        self.cursor().time
    }

    /// Jump the current track and layer to `time`, ending any harmonic group.
    pub fn set_time(&mut self, time: f64) {
        let cursor = self.cursor_mut();
        cursor.time = time;
        cursor.anchor = time;
        cursor.group_end = time;
    }

    /// Move the current track and layer forward by `duration`.
    pub fn advance(&mut self, duration: f64) {
        let cursor = self.cursor_mut();
        cursor.time += duration;
        cursor.group_end = cursor.group_end.max(cursor.time);
    }

    /// Raise every cursor that is behind `time` to `time`.
    pub fn set_all_track_time(&mut self, time: f64) {
        for cursor in self.cursors.iter_mut().flatten() {
            if cursor.time < time {
                cursor.time = time;
                cursor.anchor = time;
            }
            cursor.group_end = cursor.group_end.max(time);
        }
    }

    /// Latest time reached on any layer of `track`, including notes still
    /// sounding in an open harmonic group.
    pub fn latest_track_time(&self, track: u8) -> f64 {
        self.cursors[track.min(MAX_TRACKS as u8 - 1) as usize]
            .iter()
            .map(|c| c.time.max(c.group_end))
            .fold(0.0, f64::max)
    }

    /// Store the current time under `name`.
    pub fn add_bookmark(&mut self, name: impl Into<String>) {
        let time = self.time();
        self.bookmarks.insert(name.into(), time);
    }

    pub fn bookmark(&self, name: &str) -> Option<f64> {
        self.bookmarks.get(name).copied()
    }

    /// Jump to a stored bookmark. Returns false if there is none by that name.
    pub fn jump_to_bookmark(&mut self, name: &str) -> bool {
        match self.bookmark(name) {
            Some(time) => {
                self.set_time(time);
                true
            }
            None => false,
        }
    }

    /// Place a note of `duration` on the current track and layer.
    ///
    /// A first note opens a harmonic group at the later of the cursor and the
    /// end of the previous group. Harmonic notes rewind to the group's start.
    /// Melodic notes continue from the previous note.
    pub fn place_note(&mut self, note: &Note, duration: f64) -> NotePlacement {
        let cursor = self.cursor_mut();
        if note.is_first {
            cursor.time = cursor.time.max(cursor.group_end);
            cursor.anchor = cursor.time;
            cursor.group_end = cursor.time;
        }
        if note.is_harmonic {
            cursor.time = cursor.anchor;
        }

        let start = cursor.time;
        cursor.time += duration;
        cursor.group_end = cursor.group_end.max(cursor.time);
        let end = cursor.time;

        if note.is_rest {
            return NotePlacement {
                on: None,
                off: None,
                start,
                end,
            };
        }
        NotePlacement {
            on: (!note.is_end_of_tie).then_some(start),
            off: (!note.is_start_of_tie).then_some(end),
            start,
            end,
        }
    }

    fn cursor(&self) -> &Cursor {
        let track = self.current_track as usize;
        &self.cursors[track][self.current_layer[track] as usize]
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        let track = self.current_track as usize;
        let layer = self.current_layer[track] as usize;
        &mut self.cursors[track][layer]
    }
}
