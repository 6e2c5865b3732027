//! End-to-end: notation -> events -> sequence -> notation again.

use staccato::event::EventCollector;
use staccato::sequence::{materialize_default, Sequence, SequenceEvent, SequenceParser};
use staccato::{ParserEvent, StaccatoError, StaccatoListener, StaccatoParser};

/// (pitch, start tick, end tick) for every note on `track`.
fn notes(sequence: &Sequence, track: usize) -> Vec<(u8, u64, u64)> {
    sequence
        .notes(track)
        .iter()
        .map(|n| (n.note, n.start.value(), n.end.value()))
        .collect()
}

fn rewrite(sequence: &Sequence) -> String {
    let reader = SequenceParser::new();
    let (_, listener) = reader.bus().add(StaccatoListener::new());
    reader.parse(sequence);
    let text = listener.borrow().pattern().to_string();
    text
}

#[test]
fn sequence_round_trips_through_notation() {
    let original = materialize_default("V0 I[PIANO] C5Q E5Q+G5Q RQ D5H V1 A4W").unwrap();
    let notation = rewrite(&original);
    let again = materialize_default(&notation).unwrap();

    for track in 0..2 {
        assert_eq!(notes(&original, track), notes(&again, track), "track {track}: {notation}");
    }
    assert_eq!(notes(&again, 1), vec![(57, 0, 512)]);
}

#[test]
fn next_group_waits_for_the_longest_harmonic_note() {
    let sequence = materialize_default("C5H+E5Q G5Q").unwrap();
    assert_eq!(
        notes(&sequence, 0),
        vec![(64, 0, 128), (60, 0, 256), (67, 256, 384)]
    );
}

#[test]
fn melodic_notes_inside_a_group_follow_each_other() {
    let sequence = materialize_default("C5H+E5Q_G5Q").unwrap();
    assert_eq!(
        notes(&sequence, 0),
        vec![(64, 0, 128), (60, 0, 256), (67, 128, 256)]
    );
}

#[test]
fn tied_notes_sound_once() {
    let sequence = materialize_default("C5H- C5-Q E5Q").unwrap();
    assert_eq!(notes(&sequence, 0), vec![(60, 0, 384), (64, 384, 512)]);
}

#[test]
fn layers_keep_their_own_time() {
    let sequence = materialize_default("L0 C5H D5H L1 E5W").unwrap();
    assert_eq!(
        notes(&sequence, 0),
        vec![(60, 0, 256), (64, 0, 512), (62, 256, 512)]
    );
}

#[test]
fn chord_inversions_rotate_the_bass() {
    let pitches = |notation: &str| {
        let mut pitches: Vec<u8> = notes(&materialize_default(notation).unwrap(), 0)
            .iter()
            .map(|n| n.0)
            .collect();
        pitches.sort_unstable();
        pitches
    };
    assert_eq!(pitches("CMAJQ"), vec![48, 52, 55]);
    assert_eq!(pitches("CMAJ^Q"), vec![52, 55, 60]);
    assert_eq!(pitches("CMAJ^^Q"), vec![55, 60, 64]);
}

#[test]
fn voices_map_to_channels() {
    let sequence = materialize_default("V9 [BASS_DRUM]Q").unwrap();
    let channels: Vec<u8> = sequence
        .track(9)
        .iter()
        .filter_map(|e| match e.event {
            SequenceEvent::NoteOn { channel, .. } => Some(channel),
            _ => None,
        })
        .collect();
    assert_eq!(channels, vec![9]);
    assert_eq!(notes(&sequence, 9), vec![(36, 0, 128)]);
}

#[test]
fn every_created_track_ends() {
    let sequence = materialize_default("V2 C5Q").unwrap();
    assert_eq!(sequence.tracks().len(), 3);
    for track in 0..3 {
        let last = sequence.track(track).last().map(|e| e.event.is_end_of_track());
        assert_eq!(last, Some(true), "track {track}");
    }
}

#[test]
fn strict_mode_reports_the_fragment_and_position() {
    let mut parser = StaccatoParser::new();
    parser.set_strict(true);
    let (_, collector) = parser.bus().add(EventCollector::new());
    let err = parser.parse("C5Q ZZZ").unwrap_err();
    match err {
        StaccatoError::UnrecognizedToken { token, position } => {
            assert_eq!(token, "ZZZ");
            assert_eq!(position, Some(4));
        }
        other => panic!("unexpected error {other}"),
    }
    let kinds = collector.borrow().kinds();
    assert_eq!(kinds.first(), Some(&"before-parsing-starts"));
    assert_eq!(kinds.last(), Some(&"after-parsing-finished"));
}

#[test]
fn permissive_mode_skips_unknown_fragments() {
    let mut parser = StaccatoParser::new();
    let (_, collector) = parser.bus().add(EventCollector::new());
    parser.parse("C5Q ZZZ D5Q").unwrap();
    let values: Vec<u8> = collector.borrow().notes().iter().map(|n| n.value).collect();
    assert_eq!(values, vec![60, 62]);
}

#[test]
fn tokens_show_preprocessed_fragments() {
    let mut parser = StaccatoParser::new();
    let tokens = parser.tokens("v0 (c e)q").unwrap();
    let texts: Vec<&str> = tokens.iter().map(|t| t.text()).collect();
    assert_eq!(texts, vec!["V0", "CQ+EQ"]);
}

fn lyrics_markers_and_notes(notation: &str) -> (Vec<String>, Vec<u8>) {
    let mut parser = StaccatoParser::new();
    let (_, collector) = parser.bus().add(EventCollector::new());
    parser.parse(notation).unwrap();
    let collector = collector.borrow();
    let texts = collector
        .events
        .iter()
        .filter_map(|e| match e {
            ParserEvent::LyricParsed(text) | ParserEvent::MarkerParsed(text) => Some(text.clone()),
            _ => None,
        })
        .collect();
    let values = collector.notes().iter().map(|n| n.value).collect();
    (texts, values)
}

#[test]
fn colons_in_lyrics_and_markers_are_plain_text() {
    assert_eq!(
        lyrics_markers_and_notes("C5Q &verse:1 D5Q"),
        (vec!["verse:1".to_string()], vec![60, 62])
    );
    assert_eq!(
        lyrics_markers_and_notes("C5Q !part:2 D5Q"),
        (vec!["part:2".to_string()], vec![60, 62])
    );
}

#[test]
fn microtone_words_in_lyrics_are_plain_text() {
    assert_eq!(
        lyrics_markers_and_notes("C5Q &(Take M1) D5Q"),
        (vec!["Take M1".to_string()], vec![60, 62])
    );
    assert_eq!(
        lyrics_markers_and_notes("&(Exit M440)"),
        (vec!["Exit M440".to_string()], vec![])
    );
}
