//! MIDI input: decodes messages from a device and replays them on a bus.

use std::sync::mpsc;

use log::info;
use midir::{MidiInput, MidiInputConnection};

use super::message;
use crate::error::{Result, StaccatoError};
use crate::event::{EventBus, ParserEvent};

/// An open input port. Events queue up until drained on the bus's thread.
pub struct MidiInputReceiver {
    _connection: MidiInputConnection<()>,
    port_name: String,
    rx: mpsc::Receiver<(u8, ParserEvent)>,
    track: Option<u8>,
}

impl MidiInputReceiver {
    /// Listen on the first port whose name contains `device` (or the first
    /// port), optionally keeping only one channel.
    pub fn start(device: Option<&str>, channel_filter: Option<u8>) -> Result<Self> {
        let midi_in =
            MidiInput::new("staccato").map_err(|e| StaccatoError::Midi(format!("init: {e}")))?;

        let ports = midi_in.ports();
        let (port, port_name) = match device {
            Some(filter) => ports
                .iter()
                .find_map(|p| {
                    let name = midi_in.port_name(p).unwrap_or_default();
                    name.contains(filter).then(|| (p.clone(), name))
                })
                .ok_or_else(|| {
                    StaccatoError::Midi(format!("input device matching '{filter}' not found"))
                })?,
            None => {
                let port = ports
                    .first()
                    .cloned()
                    .ok_or_else(|| StaccatoError::Midi("no MIDI input ports available".into()))?;
                let name = midi_in
                    .port_name(&port)
                    .unwrap_or_else(|_| "unknown".to_string());
                (port, name)
            }
        };

        let (tx, rx) = mpsc::channel();
        let connection = midi_in
            .connect(
                &port,
                "staccato-input",
                move |_timestamp, msg, _| {
                    if let Some((channel, event)) = message::decode(msg) {
                        if channel_filter.map_or(true, |only| only == channel) {
                            let _ = tx.send((channel, event));
                        }
                    }
                },
                (),
            )
            .map_err(|e| StaccatoError::Midi(format!("connect: {e}")))?;
        info!("MIDI input connected to {port_name}");

        Ok(Self {
            _connection: connection,
            port_name,
            rx,
            track: None,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Fire every queued event on `bus`, switching tracks to follow the
    /// message channels. Returns the number of messages delivered.
    pub fn drain_into(&mut self, bus: &EventBus) -> usize {
        let pending: Vec<(u8, ParserEvent)> = self.rx.try_iter().collect();
        replay(&mut self.track, pending, bus)
    }

    /// Names of all MIDI input devices.
    pub fn list_devices() -> Vec<String> {
        let Ok(midi_in) = MidiInput::new("staccato-list") else {
            return Vec::new();
        };
        midi_in
            .ports()
            .iter()
            .filter_map(|p| midi_in.port_name(p).ok())
            .collect()
    }
}

fn replay(track: &mut Option<u8>, pending: Vec<(u8, ParserEvent)>, bus: &EventBus) -> usize {
    let count = pending.len();
    for (channel, event) in pending {
        if *track != Some(channel) {
            bus.fire_track_changed(channel);
            *track = Some(channel);
        }
        bus.fire(&event);
    }
    count
}
