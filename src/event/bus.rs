//! Synchronous publish/subscribe delivery of parser events.
//!
//! Delivery iterates over a snapshot of the subscriber list taken when the
//! event is fired, so listeners may subscribe or unsubscribe from inside a
//! callback. New subscribers first hear the next event; a listener removed
//! mid-delivery still receives the event in flight.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::warn;

use super::{Listener, ParserEvent};
use crate::theory::{Chord, Mode, Note};

/// A listener shared between the bus and its owner.
pub type SharedListener = Rc<RefCell<dyn Listener>>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Fans parser events out to listeners in registration order.
#[derive(Default)]
pub struct EventBus {
    listeners: RefCell<Vec<(ListenerId, SharedListener)>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared listener.
    pub fn subscribe(&self, listener: SharedListener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Register an owned listener and hand back a shared handle to it.
    pub fn add<L: Listener + 'static>(&self, listener: L) -> (ListenerId, Rc<RefCell<L>>) {
        let shared = Rc::new(RefCell::new(listener));
        let id = self.subscribe(shared.clone());
        (id, shared)
    }

    /// Remove a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        before != listeners.len()
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Deliver `event` to every listener subscribed at this moment.
    pub fn fire(&self, event: &ParserEvent) {
        let snapshot: Vec<SharedListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in snapshot {
            match listener.try_borrow_mut() {
                Ok(mut l) => l.on_event(event),
                Err(_) => warn!("skipping re-entrant delivery of {}", event.kind()),
            }
        }
    }

    pub fn fire_before_parsing_starts(&self) {
        self.fire(&ParserEvent::BeforeParsingStarts);
    }

    pub fn fire_after_parsing_finished(&self) {
        self.fire(&ParserEvent::AfterParsingFinished);
    }

    pub fn fire_track_changed(&self, track: u8) {
        self.fire(&ParserEvent::TrackChanged(track));
    }

    pub fn fire_layer_changed(&self, layer: u8) {
        self.fire(&ParserEvent::LayerChanged(layer));
    }

    pub fn fire_instrument_parsed(&self, instrument: u8) {
        self.fire(&ParserEvent::InstrumentParsed(instrument));
    }

    pub fn fire_tempo_changed(&self, bpm: u32) {
        self.fire(&ParserEvent::TempoChanged(bpm));
    }

    pub fn fire_key_signature_parsed(&self, signature: i8, mode: Mode) {
        self.fire(&ParserEvent::KeySignatureParsed { signature, mode });
    }

    pub fn fire_time_signature_parsed(&self, numerator: u8, power_of_two: u8) {
        self.fire(&ParserEvent::TimeSignatureParsed {
            numerator,
            power_of_two,
        });
    }

    pub fn fire_bar_line_parsed(&self, id: u64) {
        self.fire(&ParserEvent::BarLineParsed(id));
    }

    pub fn fire_track_beat_time_bookmarked(&self, name: &str) {
        self.fire(&ParserEvent::TrackBeatTimeBookmarked(name.to_string()));
    }

    pub fn fire_track_beat_time_bookmark_requested(&self, name: &str) {
        self.fire(&ParserEvent::TrackBeatTimeBookmarkRequested(name.to_string()));
    }

    pub fn fire_track_beat_time_requested(&self, time: f64) {
        self.fire(&ParserEvent::TrackBeatTimeRequested(time));
    }

    pub fn fire_pitch_wheel_parsed(&self, lsb: u8, msb: u8) {
        self.fire(&ParserEvent::PitchWheelParsed { lsb, msb });
    }

    pub fn fire_channel_pressure_parsed(&self, pressure: u8) {
        self.fire(&ParserEvent::ChannelPressureParsed(pressure));
    }

    pub fn fire_polyphonic_pressure_parsed(&self, key: u8, pressure: u8) {
        self.fire(&ParserEvent::PolyphonicPressureParsed { key, pressure });
    }

    pub fn fire_system_exclusive_parsed(&self, bytes: Vec<u8>) {
        self.fire(&ParserEvent::SystemExclusiveParsed(bytes));
    }

    pub fn fire_controller_event_parsed(&self, controller: u8, value: u8) {
        self.fire(&ParserEvent::ControllerEventParsed { controller, value });
    }

    pub fn fire_lyric_parsed(&self, lyric: &str) {
        self.fire(&ParserEvent::LyricParsed(lyric.to_string()));
    }

    pub fn fire_marker_parsed(&self, marker: &str) {
        self.fire(&ParserEvent::MarkerParsed(marker.to_string()));
    }

    pub fn fire_function_parsed(&self, id: &str, message: &str) {
        self.fire(&ParserEvent::FunctionParsed {
            id: id.to_string(),
            message: message.to_string(),
        });
    }

    pub fn fire_note_pressed(&self, note: Note) {
        self.fire(&ParserEvent::NotePressed(note));
    }

    pub fn fire_note_released(&self, note: Note) {
        self.fire(&ParserEvent::NoteReleased(note));
    }

    pub fn fire_note_parsed(&self, note: Note) {
        self.fire(&ParserEvent::NoteParsed(note));
    }

    pub fn fire_chord_parsed(&self, chord: Chord) {
        self.fire(&ParserEvent::ChordParsed(chord));
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
