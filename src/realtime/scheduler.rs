//! Millisecond scheduler running on a dedicated thread.
//!
//! Every elapsed millisecond runs, in order: the commands due at that
//! millisecond, then the one-off events due at it, then the active
//! interpolators. Work is drained under the lock and executed outside it,
//! so commands may schedule further work.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;

use super::clock::Clock;
use super::interpolator::Interpolator;

/// A one-shot action.
pub type Command = Box<dyn FnOnce() + Send>;

/// A user event run once when its millisecond arrives.
pub trait ScheduledEvent: Send {
    fn execute(&mut self, time_ms: u64);
}

impl<F> ScheduledEvent for F
where
    F: FnMut(u64) + Send,
{
    fn execute(&mut self, time_ms: u64) {
        self(time_ms)
    }
}

/// Handle to a scheduled event; carries the millisecond it landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId {
    time: u64,
    seq: u64,
}

impl EventId {
    /// The millisecond the event runs at, after any coercion.
    pub fn time(&self) -> u64 {
        self.time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterpolatorId(u64);

struct ActiveInterpolator {
    id: InterpolatorId,
    interpolator: Box<dyn Interpolator>,
    duration: u64,
    started_at: Option<u64>,
    ended: bool,
}

impl ActiveInterpolator {
    fn advance(&mut self, now: u64) {
        let Some(started_at) = self.started_at else {
            self.started_at = Some(now);
            self.interpolator.start();
            return;
        };
        let elapsed = (now - started_at).min(self.duration);
        let percent = if self.duration == 0 {
            1.0
        } else {
            elapsed as f64 / self.duration as f64
        };
        self.interpolator.update(elapsed, percent);
        if elapsed >= self.duration {
            self.interpolator.end();
            self.ended = true;
        }
    }
}

#[derive(Default)]
struct State {
    /// Last millisecond processed.
    now: u64,
    commands: BTreeMap<u64, Vec<Command>>,
    events: BTreeMap<u64, Vec<(EventId, Box<dyn ScheduledEvent>)>>,
    interpolators: Vec<ActiveInterpolator>,
    live_interpolators: HashSet<InterpolatorId>,
    next_id: u64,
}

impl State {
    /// Never schedule at or before the current millisecond.
    fn coerce(&self, time: u64) -> u64 {
        time.max(self.now + 1)
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

struct Shared {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn advance_to(&self, target: u64) {
        loop {
            let next = {
                let state = self.lock();
                if state.now >= target {
                    return;
                }
                state.now + 1
            };
            self.tick(next);
        }
    }

    fn tick(&self, now: u64) {
        let (commands, events, mut interpolators) = {
            let mut state = self.lock();
            state.now = now;
            (
                state.commands.remove(&now).unwrap_or_default(),
                state.events.remove(&now).unwrap_or_default(),
                std::mem::take(&mut state.interpolators),
            )
        };

        for command in commands {
            command();
        }
        for (_, mut event) in events {
            event.execute(now);
        }
        for interpolator in &mut interpolators {
            interpolator.advance(now);
        }

        let mut state = self.lock();
        for ended in interpolators.iter().filter(|i| i.ended) {
            state.live_interpolators.remove(&ended.id);
        }
        interpolators.retain(|i| state.live_interpolators.contains(&i.id));
        // Keep interpolators added while this tick ran.
        interpolators.append(&mut state.interpolators);
        state.interpolators = interpolators;
    }
}

/// Runs commands, events and interpolators against a millisecond clock.
pub struct Scheduler {
    shared: Arc<Shared>,
    stop_flag: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// A stopped scheduler whose current time is the clock's current time.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let state = State {
            now: clock.now_ms(),
            ..State::default()
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                clock,
            }),
            stop_flag: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        }
    }

    /// Start following the clock on a background thread.
    pub fn start(&self) {
        let mut handle = self.worker();
        if handle.is_some() {
            return;
        }
        self.stop_flag.store(false, Ordering::Relaxed);
        let stop_clone = self.stop_flag.clone();
        let shared = self.shared.clone();
        debug!("scheduler started at {} ms", self.current_time());
        *handle = Some(thread::spawn(move || {
            while !stop_clone.load(Ordering::Relaxed) {
                let target = shared.clock.now_ms();
                shared.advance_to(target);
                thread::sleep(Duration::from_millis(1));
            }
        }));
    }

    /// Signal the loop to stop and wait for it.
    ///
    /// Called from the loop itself (a command dropping the last handle to
    /// the scheduler), the loop is left to exit on its own.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        let handle = self.worker().take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
            debug!("scheduler stopped at {} ms", self.current_time());
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker().is_some()
    }

    fn worker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.thread.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Process every millisecond up to and including `ms`.
    ///
    /// Drives a stopped scheduler deterministically; not meant to be mixed
    /// with the background loop.
    pub fn advance_to(&self, ms: u64) {
        self.shared.advance_to(ms);
    }

    /// The last millisecond processed.
    pub fn current_time(&self) -> u64 {
        self.shared.lock().now
    }

    /// Queue `command`; returns the millisecond it will run at.
    pub fn schedule(&self, time: u64, command: impl FnOnce() + Send + 'static) -> u64 {
        let mut state = self.shared.lock();
        let time = state.coerce(time);
        state
            .commands
            .entry(time)
            .or_default()
            .push(Box::new(command));
        time
    }

    pub fn schedule_event(&self, time: u64, event: impl ScheduledEvent + 'static) -> EventId {
        let mut state = self.shared.lock();
        let time = state.coerce(time);
        let id = EventId {
            time,
            seq: state.next_id(),
        };
        state
            .events
            .entry(time)
            .or_default()
            .push((id, Box::new(event)));
        id
    }

    /// Remove a pending event. Returns `false` if it already ran or never existed.
    pub fn unschedule_event(&self, id: EventId) -> bool {
        let mut state = self.shared.lock();
        let Some(bucket) = state.events.get_mut(&id.time) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|(existing, _)| *existing != id);
        let removed = bucket.len() != before;
        if bucket.is_empty() {
            state.events.remove(&id.time);
        }
        removed
    }

    pub fn add_interpolator(
        &self,
        interpolator: impl Interpolator + 'static,
        duration_ms: u64,
    ) -> InterpolatorId {
        let mut state = self.shared.lock();
        let id = InterpolatorId(state.next_id());
        state.live_interpolators.insert(id);
        state.interpolators.push(ActiveInterpolator {
            id,
            interpolator: Box::new(interpolator),
            duration: duration_ms,
            started_at: None,
            ended: false,
        });
        id
    }

    /// Stop advancing an interpolator. Returns `false` if it already ended.
    pub fn remove_interpolator(&self, id: InterpolatorId) -> bool {
        let mut state = self.shared.lock();
        if !state.live_interpolators.remove(&id) {
            return false;
        }
        state.interpolators.retain(|i| i.id != id);
        true
    }

    /// Nothing pending and no interpolator active.
    pub fn is_idle(&self) -> bool {
        let state = self.shared.lock();
        state.commands.is_empty() && state.events.is_empty() && state.live_interpolators.is_empty()
    }

    /// Drop all pending commands, events and interpolators.
    pub fn clear(&self) {
        let mut state = self.shared.lock();
        state.commands.clear();
        state.events.clear();
        state.interpolators.clear();
        state.live_interpolators.clear();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
