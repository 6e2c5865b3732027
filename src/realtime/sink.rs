//! Live output devices.

use std::sync::{Arc, Mutex};

/// Controller number for "all notes off".
pub const ALL_NOTES_OFF: u8 = 123;

/// Something that plays channel messages as they arrive.
///
/// Messages go to the channel picked by the last
/// [`select_channel`](LiveSink::select_channel).
pub trait LiveSink {
    fn select_channel(&mut self, channel: u8);
    fn note_on(&mut self, note: u8, velocity: u8);
    fn note_off(&mut self, note: u8, velocity: u8);
    fn program_change(&mut self, program: u8);
    /// 14-bit value, 8192 is centered.
    fn pitch_bend(&mut self, value: u16);
    fn channel_pressure(&mut self, pressure: u8);
    fn poly_pressure(&mut self, key: u8, pressure: u8);
    fn control_change(&mut self, controller: u8, value: u8);

    /// Silence every channel.
    fn all_notes_off(&mut self) {
        for channel in 0..16 {
            self.select_channel(channel);
            self.control_change(ALL_NOTES_OFF, 0);
        }
    }
}

/// A sink shared between the parser side and the scheduler thread.
pub type SharedSink = Arc<Mutex<dyn LiveSink + Send>>;

/// Wrap a sink for sharing.
pub fn shared(sink: impl LiveSink + Send + 'static) -> SharedSink {
    Arc::new(Mutex::new(sink))
}

/// One call made on a [`RecordingSink`], with the channel it went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCall {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ProgramChange { channel: u8, program: u8 },
    PitchBend { channel: u8, value: u16 },
    ChannelPressure { channel: u8, pressure: u8 },
    PolyPressure { channel: u8, key: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

/// Keeps every call, for inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    channel: u8,
    calls: Vec<SinkCall>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<SinkCall> {
        std::mem::take(&mut self.calls)
    }
}

impl LiveSink for RecordingSink {
    fn select_channel(&mut self, channel: u8) {
        self.channel = channel & 0x0F;
    }

    fn note_on(&mut self, note: u8, velocity: u8) {
        let channel = self.channel;
        self.calls.push(SinkCall::NoteOn {
            channel,
            note,
            velocity,
        });
    }

    fn note_off(&mut self, note: u8, velocity: u8) {
        let channel = self.channel;
        self.calls.push(SinkCall::NoteOff {
            channel,
            note,
            velocity,
        });
    }

    fn program_change(&mut self, program: u8) {
        let channel = self.channel;
        self.calls.push(SinkCall::ProgramChange { channel, program });
    }

    fn pitch_bend(&mut self, value: u16) {
        let channel = self.channel;
        self.calls.push(SinkCall::PitchBend { channel, value });
    }

    fn channel_pressure(&mut self, pressure: u8) {
        let channel = self.channel;
        self.calls.push(SinkCall::ChannelPressure { channel, pressure });
    }

    fn poly_pressure(&mut self, key: u8, pressure: u8) {
        let channel = self.channel;
        self.calls.push(SinkCall::PolyPressure {
            channel,
            key,
            pressure,
        });
    }

    fn control_change(&mut self, controller: u8, value: u8) {
        let channel = self.channel;
        self.calls.push(SinkCall::ControlChange {
            channel,
            controller,
            value,
        });
    }
}
