//! Live playback against a manual clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use staccato::parser::ParserConfig;
use staccato::realtime::{ManualClock, RealtimePlayer, RecordingSink, SinkCall};
use staccato::temporal::TemporalListener;
use staccato::StaccatoParser;

fn player() -> (RealtimePlayer, Arc<Mutex<RecordingSink>>) {
    let sink = Arc::new(Mutex::new(RecordingSink::new()));
    let player = RealtimePlayer::with_clock(
        sink.clone(),
        Arc::new(ManualClock::new(0)),
        ParserConfig::default(),
    );
    (player, sink)
}

fn note_ons(sink: &Arc<Mutex<RecordingSink>>) -> Vec<(u8, u8)> {
    sink.lock()
        .unwrap()
        .take_calls()
        .into_iter()
        .filter_map(|call| match call {
            SinkCall::NoteOn { channel, note, .. } => Some((channel, note)),
            _ => None,
        })
        .collect()
}

#[test]
fn voices_play_together_on_their_channels() {
    let (mut player, sink) = player();
    player.play("V0 C5Q D5Q V1 E5H").unwrap();
    player.scheduler().advance_to(1);
    assert_eq!(note_ons(&sink), vec![(0, 60), (1, 64)]);
    player.scheduler().advance_to(501);
    assert_eq!(note_ons(&sink), vec![(0, 62)]);
}

#[test]
fn user_events_run_after_scheduled_notes() {
    let (mut player, sink) = player();
    player.play("C5Q").unwrap();
    let fired_at = Arc::new(AtomicU64::new(0));
    let fired_clone = fired_at.clone();
    let id = player.schedule_event(501, move |ms: u64| fired_clone.store(ms, Ordering::SeqCst));
    player.scheduler().advance_to(600);
    assert_eq!(fired_at.load(Ordering::SeqCst), 501);
    assert!(!player.unschedule_event(id));
    assert_eq!(note_ons(&sink), vec![(0, 60)]);
}

#[test]
fn events_in_the_past_run_next() {
    let (player, _) = player();
    player.scheduler().advance_to(100);
    let id = player.schedule_event(20, |_: u64| {});
    assert_eq!(id.time(), 101);
    assert!(player.unschedule_event(id));
}

#[test]
fn live_schedule_matches_precomputed_times() {
    let notation = "T90 C5Q E5I+G5I A5H";

    let mut parser = StaccatoParser::new();
    let (_, temporal) = parser.bus().add(TemporalListener::new());
    parser.parse(notation).unwrap();
    let expected: Vec<u64> = temporal.borrow().events().keys().copied().collect();

    let (mut player, sink) = player();
    player.play(notation).unwrap();
    let mut heard = Vec::new();
    for ms in 1..=3000 {
        player.scheduler().advance_to(ms);
        if !note_ons(&sink).is_empty() {
            heard.push(ms - 1);
        }
    }
    // Live playback starts one millisecond after the clock.
    assert_eq!(heard, expected);
    assert_eq!(expected, vec![0, 667, 1000]);
}
