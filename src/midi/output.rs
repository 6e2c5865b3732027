//! MIDI output: a [`LiveSink`] on a midir output port.

use log::{info, warn};
use midir::{MidiOutput, MidiOutputConnection};

use super::message;
use crate::error::{Result, StaccatoError};
use crate::realtime::LiveSink;

/// Sends channel messages to a MIDI output device.
pub struct MidirSink {
    connection: MidiOutputConnection,
    port_name: String,
    channel: u8,
}

impl MidirSink {
    /// Connect to the first port whose name contains `device`, or the first
    /// port when no device is given.
    pub fn connect(device: Option<&str>) -> Result<Self> {
        let midi_out =
            MidiOutput::new("staccato").map_err(|e| StaccatoError::Midi(format!("init: {e}")))?;

        let ports = midi_out.ports();
        let (port, port_name) = match device {
            Some(filter) => ports
                .iter()
                .find_map(|p| {
                    let name = midi_out.port_name(p).unwrap_or_default();
                    name.contains(filter).then(|| (p.clone(), name))
                })
                .ok_or_else(|| {
                    StaccatoError::Midi(format!("output device matching '{filter}' not found"))
                })?,
            None => {
                let port = ports
                    .first()
                    .cloned()
                    .ok_or_else(|| StaccatoError::Midi("no MIDI output ports available".into()))?;
                let name = midi_out
                    .port_name(&port)
                    .unwrap_or_else(|_| "unknown".to_string());
                (port, name)
            }
        };

        let connection = midi_out
            .connect(&port, "staccato-output")
            .map_err(|e| StaccatoError::Midi(format!("connect: {e}")))?;
        info!("MIDI output connected to {port_name}");

        Ok(Self {
            connection,
            port_name,
            channel: 0,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Names of all MIDI output devices.
    pub fn list_devices() -> Vec<String> {
        let Ok(midi_out) = MidiOutput::new("staccato-list") else {
            return Vec::new();
        };
        midi_out
            .ports()
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect()
    }

    fn send(&mut self, bytes: &[u8]) {
        if let Err(e) = self.connection.send(bytes) {
            warn!("MIDI send to {} failed: {e}", self.port_name);
        }
    }
}

impl LiveSink for MidirSink {
    fn select_channel(&mut self, channel: u8) {
        self.channel = channel & 0x0F;
    }

    fn note_on(&mut self, note: u8, velocity: u8) {
        let bytes = message::note_on(self.channel, note, velocity);
        self.send(&bytes);
    }

    fn note_off(&mut self, note: u8, velocity: u8) {
        let bytes = message::note_off(self.channel, note, velocity);
        self.send(&bytes);
    }

    fn program_change(&mut self, program: u8) {
        let bytes = message::program_change(self.channel, program);
        self.send(&bytes);
    }

    fn pitch_bend(&mut self, value: u16) {
        let bytes = message::pitch_bend(self.channel, value);
        self.send(&bytes);
    }

    fn channel_pressure(&mut self, pressure: u8) {
        let bytes = message::channel_pressure(self.channel, pressure);
        self.send(&bytes);
    }

    fn poly_pressure(&mut self, key: u8, pressure: u8) {
        let bytes = message::poly_pressure(self.channel, key, pressure);
        self.send(&bytes);
    }

    fn control_change(&mut self, controller: u8, value: u8) {
        let bytes = message::control_change(self.channel, controller, value);
        self.send(&bytes);
    }
}
