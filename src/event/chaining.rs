//! Listeners that transform events before passing them on.

use std::collections::HashMap;

use super::{EventBus, Listener, ParserEvent};

type Transform = Box<dyn FnMut(&ParserEvent) -> Option<ParserEvent>>;

/// Re-fires (possibly rewritten) events to its own downstream bus.
///
/// The transform returns None to swallow an event. Chaining listeners can be
/// stacked by subscribing one to another's downstream bus.
pub struct ChainingListener {
    downstream: EventBus,
    transform: Transform,
}

impl ChainingListener {
    pub fn new(transform: impl FnMut(&ParserEvent) -> Option<ParserEvent> + 'static) -> Self {
        Self {
            downstream: EventBus::new(),
            transform: Box::new(transform),
        }
    }

    /// Passes every event through unchanged.
    pub fn passthrough() -> Self {
        Self::new(|event| Some(event.clone()))
    }

    /// Rewrites instrument numbers through `map`; unmapped instruments pass.
    pub fn remap_instruments(map: HashMap<u8, u8>) -> Self {
        Self::new(move |event| match event {
            ParserEvent::InstrumentParsed(i) => {
                Some(ParserEvent::InstrumentParsed(*map.get(i).unwrap_or(i)))
            }
            other => Some(other.clone()),
        })
    }

    /// Shifts every note and chord by `semitones`, clamping to 0..=127.
    pub fn transpose(semitones: i8) -> Self {
        let shift = move |value: u8| (value as i16 + semitones as i16).clamp(0, 127) as u8;
        Self::new(move |event| match event {
            ParserEvent::NoteParsed(note) if !note.is_rest => {
                let mut note = note.clone();
                note.value = shift(note.value);
                note.original = None;
                Some(ParserEvent::NoteParsed(note))
            }
            ParserEvent::ChordParsed(chord) => {
                let mut chord = chord.clone();
                chord.root.value = shift(chord.root.value);
                chord.root.original = None;
                Some(ParserEvent::ChordParsed(chord))
            }
            other => Some(other.clone()),
        })
    }

    /// Bus receiving the transformed events.
    pub fn downstream(&self) -> &EventBus {
        &self.downstream
    }
}

impl Listener for ChainingListener {
    fn on_event(&mut self, event: &ParserEvent) {
        if let Some(out) = (self.transform)(event) {
            self.downstream.fire(&out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventCollector;
    use crate::theory::Note;

    #[test]
    fn remaps_instruments() {
        let chain = ChainingListener::remap_instruments(HashMap::from([(0, 40)]));
        let (_, collector) = chain.downstream().add(EventCollector::new());
        let mut chain = chain;
        chain.on_event(&ParserEvent::InstrumentParsed(0));
        chain.on_event(&ParserEvent::InstrumentParsed(1));
        chain.on_event(&ParserEvent::TempoChanged(100));
        assert_eq!(
            collector.borrow().events,
            vec![
                ParserEvent::InstrumentParsed(40),
                ParserEvent::InstrumentParsed(1),
                ParserEvent::TempoChanged(100),
            ]
        );
    }

    #[test]
    fn swallows_events() {
        let mut chain = ChainingListener::new(|event| match event {
            ParserEvent::LyricParsed(_) => None,
            other => Some(other.clone()),
        });
        let (_, collector) = chain.downstream().add(EventCollector::new());
        chain.on_event(&ParserEvent::LyricParsed("la".into()));
        chain.on_event(&ParserEvent::BarLineParsed(0));
        assert_eq!(collector.borrow().events, vec![ParserEvent::BarLineParsed(0)]);
    }

    #[test]
    fn chains_compose() {
        let bus = EventBus::new();
        let (_, first) = bus.add(ChainingListener::transpose(2));
        let (_, collector) = {
            let second = ChainingListener::transpose(10);
            let (_, second) = first.borrow().downstream().add(second);
            let handle = second.borrow().downstream().add(EventCollector::new());
            handle
        };
        bus.fire_note_parsed(Note::new(60));
        bus.fire_note_parsed(Note::new(125));
        let values: Vec<u8> = collector.borrow().notes().iter().map(|n| n.value).collect();
        assert_eq!(values, vec![72, 127]);
    }
}
