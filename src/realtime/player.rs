//! Live playback: parse notation and hear it as the clock reaches it.

use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::parser::{ParserConfig, StaccatoParser};
use crate::theory::Note;

use super::clock::{Clock, SystemClock};
use super::interpolator::Interpolator;
use super::listener::RealtimeListener;
use super::scheduler::{EventId, InterpolatorId, ScheduledEvent, Scheduler};
use super::sink::{shared, LiveSink, SharedSink};

/// Plays notation and live notes on a [`LiveSink`].
///
/// Parsing happens on the caller's thread; the scheduler thread only runs
/// the commands the parse produced.
pub struct RealtimePlayer {
    parser: StaccatoParser,
    scheduler: Arc<Scheduler>,
    sink: SharedSink,
    channel: u8,
    closed: bool,
}

impl RealtimePlayer {
    /// A player on the wall clock, already running.
    pub fn new(sink: impl LiveSink + Send + 'static) -> Self {
        Self::with_config(sink, ParserConfig::default())
    }

    pub fn with_config(sink: impl LiveSink + Send + 'static, config: ParserConfig) -> Self {
        let scheduler = Scheduler::new(Arc::new(SystemClock::new()));
        scheduler.start();
        Self::assemble(scheduler, shared(sink), config)
    }

    /// A stopped player on `clock`; drive it with [`RealtimePlayer::scheduler`].
    pub fn with_clock(sink: SharedSink, clock: Arc<dyn Clock>, config: ParserConfig) -> Self {
        Self::assemble(Scheduler::new(clock), sink, config)
    }

    fn assemble(scheduler: Scheduler, sink: SharedSink, config: ParserConfig) -> Self {
        let scheduler = Arc::new(scheduler);
        let mut listener = RealtimeListener::new(scheduler.clone(), sink.clone());
        listener.set_default_duration(config.settings.notes.default_duration);
        let parser = StaccatoParser::with_config(config);
        parser.bus().add(listener);
        Self {
            parser,
            scheduler,
            sink,
            channel: 0,
            closed: false,
        }
    }

    pub fn parser(&mut self) -> &mut StaccatoParser {
        &mut self.parser
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Schedule `notation` to start at the next millisecond.
    pub fn play(&mut self, notation: &str) -> Result<()> {
        self.parser.parse(notation)
    }

    /// Channel used by the immediate methods below.
    pub fn select_channel(&mut self, channel: u8) {
        self.channel = channel & 0x0F;
    }

    pub fn start_note(&self, note: &Note) {
        let (value, velocity) = (note.value, note.on_velocity);
        self.send(|sink| sink.note_on(value, velocity));
    }

    pub fn stop_note(&self, note: &Note) {
        let (value, velocity) = (note.value, note.off_velocity);
        self.send(|sink| sink.note_off(value, velocity));
    }

    pub fn change_instrument(&self, program: u8) {
        self.send(|sink| sink.program_change(program.min(127)));
    }

    /// 14-bit bend, 8192 is centered.
    pub fn set_pitch_bend(&self, value: u16) {
        self.send(|sink| sink.pitch_bend(value.min(0x3FFF)));
    }

    pub fn change_controller(&self, controller: u8, value: u8) {
        self.send(|sink| sink.control_change(controller.min(127), value.min(127)));
    }

    pub fn schedule_event(&self, time_ms: u64, event: impl ScheduledEvent + 'static) -> EventId {
        self.scheduler.schedule_event(time_ms, event)
    }

    pub fn unschedule_event(&self, id: EventId) -> bool {
        self.scheduler.unschedule_event(id)
    }

    pub fn add_interpolator(
        &self,
        interpolator: impl Interpolator + 'static,
        duration_ms: u64,
    ) -> InterpolatorId {
        self.scheduler.add_interpolator(interpolator, duration_ms)
    }

    pub fn remove_interpolator(&self, id: InterpolatorId) -> bool {
        self.scheduler.remove_interpolator(id)
    }

    pub fn current_time(&self) -> u64 {
        self.scheduler.current_time()
    }

    /// Everything scheduled so far has run.
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Drop pending work, stop the clock and silence the sink.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.scheduler.clear();
        self.scheduler.stop();
        if let Ok(mut sink) = self.sink.lock() {
            sink.all_notes_off();
        }
        debug!("realtime player closed at {} ms", self.scheduler.current_time());
    }

    fn send<F>(&self, action: F)
    where
        F: FnOnce(&mut dyn LiveSink),
    {
        if let Ok(mut sink) = self.sink.lock() {
            sink.select_channel(self.channel);
            action(&mut *sink);
        }
    }
}

impl Drop for RealtimePlayer {
    fn drop(&mut self) {
        self.close();
    }
}
