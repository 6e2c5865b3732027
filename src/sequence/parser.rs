//! Fires parser events from a materialized sequence.
//!
//! Notes starting on the same tick become a harmonic group, shortest first.
//! Gaps before a tick become rests; a tick that falls before the end of the
//! previous group becomes an explicit time request.

use std::collections::BTreeMap;
use std::rc::Rc;

use log::debug;

use crate::event::EventBus;
use crate::theory::{Mode, Note};
use crate::time::{mpqn_to_bpm, Tick};

use super::{
    Sequence, SequenceEvent, SequencedNote, META_KEY_SIGNATURE, META_LYRIC, META_MARKER,
    META_TEMPO, META_TIME_SIGNATURE,
};

/// Replays a [`Sequence`] as parser events on its bus.
#[derive(Default)]
pub struct SequenceParser {
    bus: Rc<EventBus>,
}

/// Everything that starts at one tick of one track.
#[derive(Default)]
struct TickGroup<'a> {
    events: Vec<&'a SequenceEvent>,
    notes: Vec<SequencedNote>,
}

impl SequenceParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn parse(&self, sequence: &Sequence) {
        self.bus.fire_before_parsing_starts();
        for track in 0..sequence.tracks().len() {
            self.parse_track(sequence, track);
        }
        self.bus.fire_after_parsing_finished();
    }

    fn parse_track(&self, sequence: &Sequence, track: usize) {
        let groups = group_by_tick(sequence, track);
        if groups.is_empty() {
            return;
        }
        let resolution = sequence.resolution();
        self.bus.fire_track_changed(track as u8);

        let mut cursor = Tick::ZERO;
        for (tick, group) in groups {
            if tick > cursor {
                let rest = (tick - cursor).as_beats(resolution);
                let mut note = Note::rest(rest);
                note.is_first = true;
                self.bus.fire_note_parsed(note);
            } else if tick < cursor {
                self.bus.fire_track_beat_time_requested(tick.as_beats(resolution));
            }
            cursor = tick;

            for event in group.events {
                self.fire(event);
            }

            let mut notes = group.notes;
            notes.sort_by_key(SequencedNote::length);
            for (index, sequenced) in notes.iter().enumerate() {
                let mut note = Note::new(sequenced.note)
                    .with_duration(sequenced.length().as_beats(resolution))
                    .with_velocities(sequenced.on_velocity, sequenced.off_velocity);
                note.is_first = index == 0;
                note.is_harmonic = index > 0;
                self.bus.fire_note_parsed(note);
            }
            if let Some(longest) = notes.last() {
                cursor = longest.end;
            }
        }
    }

    fn fire(&self, event: &SequenceEvent) {
        match event {
            SequenceEvent::ProgramChange { program, .. } => {
                self.bus.fire_instrument_parsed(*program)
            }
            SequenceEvent::ControlChange {
                controller, value, ..
            } => self.bus.fire_controller_event_parsed(*controller, *value),
            SequenceEvent::PitchBend { lsb, msb, .. } => self.bus.fire_pitch_wheel_parsed(*lsb, *msb),
            SequenceEvent::ChannelPressure { pressure, .. } => {
                self.bus.fire_channel_pressure_parsed(*pressure)
            }
            SequenceEvent::PolyPressure { key, pressure, .. } => {
                self.bus.fire_polyphonic_pressure_parsed(*key, *pressure)
            }
            SequenceEvent::SysEx(bytes) => self.bus.fire_system_exclusive_parsed(bytes.clone()),
            SequenceEvent::Meta { kind, data } => self.fire_meta(*kind, data),
            SequenceEvent::NoteOn { .. } | SequenceEvent::NoteOff { .. } => {}
        }
    }

    fn fire_meta(&self, kind: u8, data: &[u8]) {
        match (kind, data) {
            (META_TEMPO, [a, b, c]) => {
                let mpqn = u32::from_be_bytes([0, *a, *b, *c]);
                self.bus.fire_tempo_changed(mpqn_to_bpm(mpqn));
            }
            (META_KEY_SIGNATURE, [signature, mode]) => self
                .bus
                .fire_key_signature_parsed(*signature as i8, Mode::from_flag(*mode)),
            (META_TIME_SIGNATURE, [numerator, power, ..]) => {
                self.bus.fire_time_signature_parsed(*numerator, *power)
            }
            (META_LYRIC, text) => self.bus.fire_lyric_parsed(&String::from_utf8_lossy(text)),
            (META_MARKER, text) => self.bus.fire_marker_parsed(&String::from_utf8_lossy(text)),
            _ => debug!("sequence parser skips meta event {kind:#04x}"),
        }
    }
}

/// Non-note events and note starts of `track`, grouped by tick.
fn group_by_tick(sequence: &Sequence, track: usize) -> BTreeMap<Tick, TickGroup<'_>> {
    let mut groups: BTreeMap<Tick, TickGroup<'_>> = BTreeMap::new();
    for timed in sequence.track(track) {
        let is_note = matches!(
            timed.event,
            SequenceEvent::NoteOn { .. } | SequenceEvent::NoteOff { .. }
        );
        if !is_note && !timed.event.is_end_of_track() {
            groups.entry(timed.tick).or_default().events.push(&timed.event);
        }
    }
    for note in sequence.notes(track) {
        groups.entry(note.start).or_default().notes.push(note);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventCollector, ParserEvent};
    use crate::sequence::materialize_default;

    fn replay(notation: &str) -> Vec<ParserEvent> {
        let sequence = materialize_default(notation).unwrap();
        let parser = SequenceParser::new();
        let (_, events) = parser.bus().add(EventCollector::new());
        parser.parse(&sequence);
        let events = events.borrow().events.clone();
        events
    }

    fn notes(events: &[ParserEvent]) -> Vec<(u8, f64, bool, bool)> {
        events
            .iter()
            .filter_map(|e| match e {
                ParserEvent::NoteParsed(n) => {
                    Some((n.value, n.duration, n.is_rest, n.is_harmonic))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn melody_round_trips() {
        let events = replay("C5Q D5H");
        assert_eq!(events[1], ParserEvent::TrackChanged(0));
        assert_eq!(
            notes(&events),
            vec![(60, 0.25, false, false), (62, 0.5, false, false)]
        );
    }

    #[test]
    fn gaps_become_rests() {
        assert_eq!(
            notes(&replay("C5Q RH D5Q")),
            vec![
                (60, 0.25, false, false),
                (0, 0.5, true, false),
                (62, 0.25, false, false)
            ]
        );
    }

    #[test]
    fn harmonic_group_shortest_first() {
        assert_eq!(
            notes(&replay("C5H+E5Q")),
            vec![(64, 0.25, false, false), (60, 0.5, false, true)]
        );
    }

    #[test]
    fn overlap_becomes_time_request() {
        let events = replay("C5H @0.25 D5Q");
        assert!(events.contains(&ParserEvent::TrackBeatTimeRequested(0.25)));
    }

    #[test]
    fn meta_and_channel_events() {
        let events = replay("T60 KEY:GMAJ TIME:3/4 I[FLUTE] :PW(8192) &hello");
        for expected in [
            ParserEvent::TempoChanged(60),
            ParserEvent::KeySignatureParsed {
                signature: 1,
                mode: Mode::Major,
            },
            ParserEvent::TimeSignatureParsed {
                numerator: 3,
                power_of_two: 2,
            },
            ParserEvent::InstrumentParsed(73),
            ParserEvent::PitchWheelParsed { lsb: 0, msb: 64 },
            ParserEvent::LyricParsed("hello".into()),
        ] {
            assert!(events.contains(&expected), "missing {expected:?}");
        }
    }

    #[test]
    fn empty_tracks_are_skipped() {
        let events = replay("V2 C5Q");
        let tracks: Vec<&ParserEvent> = events
            .iter()
            .filter(|e| matches!(e, ParserEvent::TrackChanged(_)))
            .collect();
        assert_eq!(tracks, vec![&ParserEvent::TrackChanged(2)]);
    }
}
