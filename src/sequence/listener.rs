//! Turns parser events into sequence events at tick positions.

use log::debug;

use crate::event::{Listener, ParserEvent};
use crate::theory::{Chord, Note};
use crate::time::{bpm_to_mpqn, Tick, TrackTimeManager};

use super::{
    SequenceEvent, SequenceSink, META_END_OF_TRACK, META_KEY_SIGNATURE, META_LYRIC, META_MARKER,
    META_TEMPO, META_TIME_SIGNATURE,
};

const DEFAULT_DURATION: f64 = 0.25;

/// Offline materializer. Times are kept in whole notes and converted to
/// ticks at the sink's resolution.
pub struct SequenceListener<S: SequenceSink> {
    sink: S,
    resolution: u32,
    time: TrackTimeManager,
    default_duration: f64,
    finished: bool,
}

impl SequenceListener<super::Sequence> {
    /// Listener over an in-memory sequence, using its resolution.
    pub fn new(sequence: super::Sequence) -> Self {
        let resolution = sequence.resolution();
        Self::with_sink(sequence, resolution)
    }
}

impl<S: SequenceSink> SequenceListener<S> {
    pub fn with_sink(mut sink: S, resolution: u32) -> Self {
        let mut time = TrackTimeManager::new();
        for track in time.set_current_track(0) {
            sink.create_track(track);
        }
        Self {
            sink,
            resolution: resolution.max(1),
            time,
            default_duration: DEFAULT_DURATION,
            finished: false,
        }
    }

    /// Duration used for notes parsed without one.
    pub fn set_default_duration(&mut self, duration: f64) {
        self.default_duration = duration;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn time(&self) -> &TrackTimeManager {
        &self.time
    }

    /// Append end-of-track to every created track at the latest time any of
    /// its layers reached. Later calls do nothing.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let tracks: Vec<u8> = self.time.created_tracks().collect();
        for track in tracks {
            let tick = self.ticks(self.time.latest_track_time(track));
            let end = SequenceEvent::meta(META_END_OF_TRACK, Vec::new());
            self.sink.add_event(track, tick, end);
        }
    }

    fn ticks(&self, beats: f64) -> Tick {
        Tick::from_beats(beats, self.resolution)
    }

    fn channel(&self) -> u8 {
        self.time.current_track()
    }

    /// Add an event at the current time of the current track and layer.
    fn emit(&mut self, event: SequenceEvent) {
        let tick = self.ticks(self.time.time());
        let track = self.channel();
        self.sink.add_event(track, tick, event);
    }

    fn change_track(&mut self, track: u8) {
        for created in self.time.set_current_track(track) {
            self.sink.create_track(created);
        }
    }

    fn note(&mut self, note: &Note) {
        let duration = if note.duration > 0.0 {
            note.duration
        } else {
            self.default_duration
        };
        let placement = self.time.place_note(note, duration);
        let channel = self.channel();
        if let Some(on) = placement.on {
            let tick = self.ticks(on);
            self.sink.add_event(
                channel,
                tick,
                SequenceEvent::NoteOn {
                    channel,
                    note: note.value,
                    velocity: note.on_velocity,
                },
            );
        }
        if let Some(off) = placement.off {
            let tick = self.ticks(off);
            self.sink.add_event(
                channel,
                tick,
                SequenceEvent::NoteOff {
                    channel,
                    note: note.value,
                    velocity: note.off_velocity,
                },
            );
        }
    }

    fn chord(&mut self, chord: &Chord) {
        for note in chord.notes() {
            self.note(&note);
        }
    }
}

impl<S: SequenceSink> Listener for SequenceListener<S> {
    fn on_event(&mut self, event: &ParserEvent) {
        let channel = self.channel();
        match event {
            ParserEvent::TrackChanged(track) => self.change_track(*track),
            ParserEvent::LayerChanged(layer) => self.time.set_current_layer(*layer),
            ParserEvent::InstrumentParsed(program) => self.emit(SequenceEvent::ProgramChange {
                channel,
                program: *program,
            }),
            ParserEvent::TempoChanged(bpm) => {
                let mpqn = bpm_to_mpqn(*bpm).to_be_bytes();
                self.emit(SequenceEvent::meta(META_TEMPO, &mpqn[1..]));
            }
            ParserEvent::KeySignatureParsed { signature, mode } => self.emit(SequenceEvent::meta(
                META_KEY_SIGNATURE,
                [*signature as u8, mode.flag()],
            )),
            ParserEvent::TimeSignatureParsed {
                numerator,
                power_of_two,
            } => self.emit(SequenceEvent::meta(
                META_TIME_SIGNATURE,
                [*numerator, *power_of_two, 24, 8],
            )),
            ParserEvent::TrackBeatTimeBookmarked(name) => self.time.add_bookmark(name.clone()),
            ParserEvent::TrackBeatTimeBookmarkRequested(name) => {
                if !self.time.jump_to_bookmark(name) {
                    debug!("no bookmark named '{name}', ignoring");
                }
            }
            ParserEvent::TrackBeatTimeRequested(time) => self.time.set_time(*time),
            ParserEvent::PitchWheelParsed { lsb, msb } => self.emit(SequenceEvent::PitchBend {
                channel,
                lsb: *lsb,
                msb: *msb,
            }),
            ParserEvent::ChannelPressureParsed(pressure) => {
                self.emit(SequenceEvent::ChannelPressure {
                    channel,
                    pressure: *pressure,
                })
            }
            ParserEvent::PolyphonicPressureParsed { key, pressure } => {
                self.emit(SequenceEvent::PolyPressure {
                    channel,
                    key: *key,
                    pressure: *pressure,
                })
            }
            ParserEvent::SystemExclusiveParsed(bytes) => {
                self.emit(SequenceEvent::SysEx(bytes.clone()))
            }
            ParserEvent::ControllerEventParsed { controller, value } => {
                self.emit(SequenceEvent::ControlChange {
                    channel,
                    controller: *controller,
                    value: *value,
                })
            }
            ParserEvent::LyricParsed(text) => {
                self.emit(SequenceEvent::meta(META_LYRIC, text.as_bytes()))
            }
            ParserEvent::MarkerParsed(text) => {
                self.emit(SequenceEvent::meta(META_MARKER, text.as_bytes()))
            }
            ParserEvent::NoteParsed(note) => self.note(note),
            ParserEvent::ChordParsed(chord) => self.chord(chord),
            ParserEvent::BeforeParsingStarts
            | ParserEvent::AfterParsingFinished
            | ParserEvent::BarLineParsed(_) => {}
            other => debug!("sequence listener ignores {}", other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;
    use crate::parser::StaccatoParser;
    use crate::sequence::{materialize_default, Sequence};
    use crate::theory::Mode;

    fn events(sequence: &Sequence, track: usize) -> Vec<(u64, SequenceEvent)> {
        sequence
            .track(track)
            .iter()
            .map(|e| (e.tick.value(), e.event.clone()))
            .collect()
    }

    fn on(channel: u8, note: u8) -> SequenceEvent {
        SequenceEvent::NoteOn {
            channel,
            note,
            velocity: 64,
        }
    }

    fn off(channel: u8, note: u8) -> SequenceEvent {
        SequenceEvent::NoteOff {
            channel,
            note,
            velocity: 64,
        }
    }

    #[test]
    fn harmonic_pairs_start_together() {
        let seq = materialize_default("E5Q+C5H E5Q+G5Q").unwrap();
        let notes = seq.notes(0);
        let starts: Vec<(u8, u64)> = notes.iter().map(|n| (n.note, n.start.value())).collect();
        assert_eq!(starts, vec![(64, 0), (60, 0), (64, 256), (67, 256)]);
    }

    #[test]
    fn ties_make_one_sounding_note() {
        let seq = materialize_default("C5Q- C5-Q").unwrap();
        let notes = seq.notes(0);
        assert_eq!(notes.len(), 1);
        assert_eq!((notes[0].start.value(), notes[0].end.value()), (0, 256));
    }

    #[test]
    fn rests_advance_without_events() {
        let seq = materialize_default("RQ C5Q").unwrap();
        assert_eq!(
            events(&seq, 0),
            vec![
                (128, on(0, 60)),
                (256, off(0, 60)),
                (256, SequenceEvent::meta(META_END_OF_TRACK, Vec::new())),
            ]
        );
    }

    #[test]
    fn end_of_track_on_every_created_track() {
        let seq = materialize_default("V0 C5W V2 D5Q").unwrap();
        assert_eq!(seq.tracks().len(), 3);
        for (track, tick) in [(0, 512), (1, 0), (2, 128)] {
            let last = seq.track(track).last().unwrap();
            assert!(last.event.is_end_of_track(), "track {track}");
            assert_eq!(last.tick.value(), tick, "track {track}");
        }
    }

    #[test]
    fn end_of_track_uses_latest_layer() {
        let seq = materialize_default("L0 C5Q L1 D5W").unwrap();
        assert_eq!(seq.track(0).last().unwrap().tick.value(), 512);
    }

    #[test]
    fn tempo_is_a_meta_event_where_it_occurs() {
        let seq = materialize_default("C5Q T60 D5Q").unwrap();
        let tempo = seq
            .track(0)
            .iter()
            .find(|e| matches!(e.event, SequenceEvent::Meta { kind: META_TEMPO, .. }))
            .unwrap();
        assert_eq!(tempo.tick.value(), 128);
        assert_eq!(tempo.event, SequenceEvent::meta(META_TEMPO, [0x0F, 0x42, 0x40]));
    }

    #[test]
    fn signatures_become_meta_events() {
        let seq = materialize_default("KEY:DMIN TIME:3/4").unwrap();
        let track = seq.track(0);
        assert_eq!(
            track[0].event,
            SequenceEvent::meta(META_KEY_SIGNATURE, [(-1i8) as u8, Mode::Minor.flag()])
        );
        assert_eq!(track[1].event, SequenceEvent::meta(META_TIME_SIGNATURE, [3, 2, 24, 8]));
    }

    #[test]
    fn bookmarks_rewind_time() {
        let seq = materialize_default("C5Q !chorus D5Q @#chorus E5Q").unwrap();
        let starts: Vec<(u8, u64)> = seq
            .notes(0)
            .iter()
            .map(|n| (n.note, n.start.value()))
            .collect();
        assert_eq!(starts, vec![(60, 0), (62, 128), (64, 128)]);
    }

    #[test]
    fn unknown_bookmark_is_ignored() {
        let seq = materialize_default("C5Q @#nowhere D5Q").unwrap();
        assert_eq!(seq.notes(0)[1].start.value(), 128);
    }

    #[test]
    fn instrument_and_controller_on_current_channel() {
        let seq = materialize_default("V1 I[FLUTE] :CE(7,100)").unwrap();
        assert_eq!(
            events(&seq, 1)[..2],
            [
                (0, SequenceEvent::ProgramChange { channel: 1, program: 73 }),
                (
                    0,
                    SequenceEvent::ControlChange {
                        channel: 1,
                        controller: 7,
                        value: 100
                    }
                ),
            ]
        );
    }

    #[test]
    fn works_with_a_bare_bus() {
        let bus = EventBus::new();
        let (_, listener) = bus.add(SequenceListener::new(Sequence::new(480)));
        bus.fire_note_parsed({
            let mut note = Note::new(60);
            note.duration = 0.25;
            note.is_first = true;
            note
        });
        listener.borrow_mut().finish();
        listener.borrow_mut().finish();
        let listener = listener.borrow();
        assert_eq!(listener.sink().end_tick(0).value(), 480);
        assert_eq!(listener.sink().track(0).len(), 3);
    }

    #[test]
    fn chords_expand_to_notes() {
        let mut parser = StaccatoParser::new();
        let seq = crate::sequence::materialize(&mut parser, "C4MAJQ", 128).unwrap();
        let notes: Vec<u8> = seq.notes(0).iter().map(|n| n.note).collect();
        assert_eq!(notes, vec![48, 52, 55]);
    }
}
