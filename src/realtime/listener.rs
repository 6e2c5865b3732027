//! Turns parser events into commands on the live scheduler.

use std::sync::Arc;

use log::{debug, warn};

use crate::event::{Listener, ParserEvent};
use crate::theory::Note;
use crate::time::{beats_to_millis, TrackTimeManager, DEFAULT_TEMPO};

use super::scheduler::Scheduler;
use super::sink::{LiveSink, SharedSink};

/// Schedules every parsed event at its wall-clock millisecond.
///
/// Time is kept per track and layer in milliseconds. When parsing starts,
/// all cursors are raised to the scheduler's next millisecond, so a second
/// `play` picks up where the clock is rather than where the first one began.
pub struct RealtimeListener {
    scheduler: Arc<Scheduler>,
    sink: SharedSink,
    time: TrackTimeManager,
    tempo: u32,
    default_duration: f64,
    /// Millisecond the current parse started at; time requests count from it.
    origin: f64,
}

impl RealtimeListener {
    pub fn new(scheduler: Arc<Scheduler>, sink: SharedSink) -> Self {
        let mut time = TrackTimeManager::new();
        time.set_current_track(0);
        Self {
            scheduler,
            sink,
            time,
            tempo: DEFAULT_TEMPO,
            default_duration: 0.25,
            origin: 0.0,
        }
    }

    pub fn set_default_duration(&mut self, duration: f64) {
        self.default_duration = duration;
    }

    pub fn set_tempo(&mut self, bpm: u32) {
        self.tempo = bpm.max(1);
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn current_track(&self) -> u8 {
        self.time.current_track()
    }

    /// Run `action` on the sink at `millis`, on the current track's channel.
    fn schedule<F>(&self, millis: f64, action: F)
    where
        F: FnOnce(&mut dyn LiveSink) + Send + 'static,
    {
        let channel = self.time.current_track();
        let sink = self.sink.clone();
        self.scheduler.schedule(millis.max(0.0).round() as u64, move || {
            send(&sink, channel, action)
        });
    }

    /// Run `action` on the sink right away.
    fn send_now<F>(&self, action: F)
    where
        F: FnOnce(&mut dyn LiveSink),
    {
        send(&self.sink, self.time.current_track(), action);
    }

    fn millis(&self, note: &Note) -> f64 {
        let duration = if note.duration > 0.0 {
            note.duration
        } else {
            self.default_duration
        };
        beats_to_millis(duration, self.tempo)
    }

    fn place(&mut self, note: &Note, duration: f64) {
        let placement = self.time.place_note(note, duration);
        let (value, on_velocity, off_velocity) = (note.value, note.on_velocity, note.off_velocity);
        if let Some(on) = placement.on {
            self.schedule(on, move |sink| sink.note_on(value, on_velocity));
        }
        if let Some(off) = placement.off {
            self.schedule(off, move |sink| sink.note_off(value, off_velocity));
        }
    }
}

fn send<F>(sink: &SharedSink, channel: u8, action: F)
where
    F: FnOnce(&mut dyn LiveSink),
{
    match sink.lock() {
        Ok(mut sink) => {
            sink.select_channel(channel);
            action(&mut *sink);
        }
        Err(_) => warn!("live sink lock poisoned, dropping message"),
    }
}

impl Listener for RealtimeListener {
    fn on_event(&mut self, event: &ParserEvent) {
        match event {
            ParserEvent::BeforeParsingStarts => {
                let next = (self.scheduler.current_time() + 1) as f64;
                self.time.set_all_track_time(next);
                self.origin = next;
            }
            ParserEvent::TrackChanged(track) => {
                self.time.set_current_track(*track);
            }
            ParserEvent::LayerChanged(layer) => self.time.set_current_layer(*layer),
            ParserEvent::TempoChanged(bpm) => self.set_tempo(*bpm),
            ParserEvent::InstrumentParsed(program) => {
                let program = *program;
                self.schedule(self.time.time(), move |sink| sink.program_change(program));
            }
            ParserEvent::ControllerEventParsed { controller, value } => {
                let (controller, value) = (*controller, *value);
                self.schedule(self.time.time(), move |sink| {
                    sink.control_change(controller, value)
                });
            }
            ParserEvent::PitchWheelParsed { .. } => {
                if let Some(value) = event.pitch_wheel_value() {
                    self.schedule(self.time.time(), move |sink| sink.pitch_bend(value));
                }
            }
            ParserEvent::ChannelPressureParsed(pressure) => {
                let pressure = *pressure;
                self.schedule(self.time.time(), move |sink| sink.channel_pressure(pressure));
            }
            ParserEvent::PolyphonicPressureParsed { key, pressure } => {
                let (key, pressure) = (*key, *pressure);
                self.schedule(self.time.time(), move |sink| {
                    sink.poly_pressure(key, pressure)
                });
            }
            ParserEvent::TrackBeatTimeBookmarked(name) => self.time.add_bookmark(name.clone()),
            ParserEvent::TrackBeatTimeBookmarkRequested(name) => {
                if !self.time.jump_to_bookmark(name) {
                    debug!("no bookmark named '{name}', ignoring");
                }
            }
            ParserEvent::TrackBeatTimeRequested(beats) => {
                let millis = self.origin + beats_to_millis(*beats, self.tempo);
                self.time.set_time(millis);
            }
            ParserEvent::NotePressed(note) => {
                let (value, velocity) = (note.value, note.on_velocity);
                self.send_now(|sink| sink.note_on(value, velocity));
            }
            ParserEvent::NoteReleased(note) => {
                let (value, velocity) = (note.value, note.off_velocity);
                self.send_now(|sink| sink.note_off(value, velocity));
            }
            ParserEvent::NoteParsed(note) => {
                let duration = self.millis(note);
                self.place(note, duration);
            }
            ParserEvent::ChordParsed(chord) => {
                let duration = self.millis(&chord.root);
                for note in chord.notes() {
                    self.place(&note, duration);
                }
            }
            other => debug!("realtime listener ignores {}", other.kind()),
        }
    }
}
