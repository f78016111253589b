//! MIDI input port that hands every 3-byte message to a callback.

use midir::{Ignore, MidiInput, MidiInputConnection};
use thiserror::Error;

use super::message::RawControlMessage;

const CLIENT_NAME: &str = "reclight";

#[derive(Debug, Error)]
pub enum MidiSourceError {
    #[error("failed to initialise MIDI input: {0}")]
    Init(#[from] midir::InitError),
    #[error("no MIDI input ports available")]
    NoPorts,
    #[error("no MIDI input port matching '{wanted}' (available: {available:?})")]
    PortNotFound {
        wanted: String,
        available: Vec<String>,
    },
    #[error("failed to connect to MIDI port '{port}': {reason}")]
    Connect { port: String, reason: String },
}

/// An open MIDI input. The connection closes when this is dropped.
pub struct MidiSource {
    _conn: MidiInputConnection<()>,
    port_name: String,
}

impl MidiSource {
    /// Names of the MIDI input ports currently visible.
    pub fn port_names() -> Result<Vec<String>, MidiSourceError> {
        let midi_in = MidiInput::new(CLIENT_NAME)?;
        Ok(midi_in
            .ports()
            .iter()
            .filter_map(|port| midi_in.port_name(port).ok())
            .collect())
    }

    /// Open the first port whose name contains `port_filter`, or the first port
    /// at all when no filter is given.
    pub fn open<F>(port_filter: Option<&str>, mut on_message: F) -> Result<Self, MidiSourceError>
    where
        F: FnMut(RawControlMessage) + Send + 'static,
    {
        let mut midi_in = MidiInput::new(CLIENT_NAME)?;
        midi_in.ignore(Ignore::None);

        let ports = midi_in.ports();
        if ports.is_empty() {
            return Err(MidiSourceError::NoPorts);
        }

        let port = match port_filter {
            None => ports[0].clone(),
            Some(wanted) => ports
                .iter()
                .find(|port| {
                    midi_in
                        .port_name(port)
                        .map(|name| name.contains(wanted))
                        .unwrap_or(false)
                })
                .cloned()
                .ok_or_else(|| MidiSourceError::PortNotFound {
                    wanted: wanted.to_string(),
                    available: ports
                        .iter()
                        .filter_map(|port| midi_in.port_name(port).ok())
                        .collect(),
                })?,
        };

        let port_name = midi_in
            .port_name(&port)
            .unwrap_or_else(|_| "<unnamed>".to_string());

        let conn = midi_in
            .connect(
                &port,
                "reclight-input",
                move |_stamp, bytes, _| match RawControlMessage::from_bytes(bytes) {
                    Some(msg) => on_message(msg),
                    None => log::debug!("Ignoring {}-byte MIDI message", bytes.len()),
                },
                (),
            )
            .map_err(|e| MidiSourceError::Connect {
                port: port_name.clone(),
                reason: e.to_string(),
            })?;

        log::info!("Opened MIDI port {}", port_name);
        Ok(Self {
            _conn: conn,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}
