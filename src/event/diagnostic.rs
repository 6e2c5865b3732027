//! Listener that logs every event and counts them by kind.

use std::collections::BTreeMap;

use log::info;

use super::{Listener, ParserEvent};

#[derive(Debug, Default)]
pub struct DiagnosticListener {
    counts: BTreeMap<&'static str, usize>,
}

impl DiagnosticListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// One `kind: count` line per kind seen, alphabetically.
    pub fn summary(&self) -> String {
        self.counts
            .iter()
            .map(|(kind, n)| format!("{kind}: {n}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Listener for DiagnosticListener {
    fn on_event(&mut self, event: &ParserEvent) {
        info!("{event:?}");
        *self.counts.entry(event.kind()).or_default() += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_kind() {
        let mut diag = DiagnosticListener::new();
        diag.on_event(&ParserEvent::BarLineParsed(1));
        diag.on_event(&ParserEvent::BarLineParsed(2));
        diag.on_event(&ParserEvent::TempoChanged(60));
        assert_eq!(diag.count("bar-line-parsed"), 2);
        assert_eq!(diag.count("tempo-changed"), 1);
        assert_eq!(diag.count("lyric-parsed"), 0);
        assert_eq!(diag.total(), 3);
        assert_eq!(diag.summary(), "bar-line-parsed: 2\ntempo-changed: 1");
    }
}
