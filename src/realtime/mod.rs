//! Real-time playback against a millisecond clock.
//!
//! A [`RealtimeListener`] turns parser events into commands on a
//! [`Scheduler`], which runs them on its own thread as the [`Clock`]
//! reaches them, sending channel messages to a [`LiveSink`].

pub mod clock;
pub mod interpolator;
pub mod listener;
pub mod player;
pub mod scheduler;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use interpolator::{FnInterpolator, Interpolator, LinearRamp};
pub use listener::RealtimeListener;
pub use player::RealtimePlayer;
pub use scheduler::{Command, EventId, InterpolatorId, ScheduledEvent, Scheduler};
pub use sink::{shared, LiveSink, RecordingSink, SharedSink, SinkCall};
