use crossbeam_channel as cch;
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection, SendError};

use crate::midi::controller::discovery::{self, PortMatcher};
use crate::midi::controller::{Incoming, Transport, TransportError};

/// Pumps between two checks that the device is still plugged in.
const PRESENCE_CHECK_EVERY: u32 = 64;

struct Connection {
    input: MidiInputConnection<()>,
    output: MidiOutputConnection,
    probe: MidiOutput,
}

/// Transport over the platform MIDI API through `midir`.
///
/// The input callback runs on a midir-owned thread and forwards each message into a channel;
/// `pump` drains that channel on the caller's thread.
pub struct MidirBased {
    client_name: String,
    matcher: PortMatcher,
    connection: Option<Connection>,
    sender: cch::Sender<Vec<u8>>,
    receiver: cch::Receiver<Vec<u8>>,
    pumps_since_check: u32,
}

impl MidirBased {
    pub fn new(client_name: &str, matcher: PortMatcher) -> MidirBased {
        let (sender, receiver) = cch::unbounded();
        MidirBased {
            client_name: client_name.to_string(),
            matcher,
            connection: None,
            sender,
            receiver,
            pumps_since_check: 0,
        }
    }

    fn open(&self) -> Result<Connection, TransportError> {
        let midi_in = MidiInput::new(&format!("{}-in", self.client_name))
            .map_err(|e| TransportError::Io(Box::new(e)))?;
        let midi_out = MidiOutput::new(&format!("{}-out", self.client_name))
            .map_err(|e| TransportError::Io(Box::new(e)))?;
        let probe = MidiOutput::new(&format!("{}-probe", self.client_name))
            .map_err(|e| TransportError::Io(Box::new(e)))?;

        let in_port = discovery::find_port(&midi_in, &self.matcher)
            .ok_or_else(|| TransportError::Unavailable(self.matcher.describe()))?;
        let out_port = discovery::find_port(&midi_out, &self.matcher)
            .ok_or_else(|| TransportError::Unavailable(self.matcher.describe()))?;

        let sender = self.sender.clone();
        let input = midi_in
            .connect(
                &in_port,
                &self.client_name,
                move |_timestamp, message, _| {
                    // Fire and forget.
                    let _ = sender.send(message.to_vec());
                },
                (),
            )
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        let output = midi_out
            .connect(&out_port, &self.client_name)
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        Ok(Connection {
            input,
            output,
            probe,
        })
    }

    fn still_present(&mut self) -> bool {
        self.pumps_since_check += 1;
        if self.pumps_since_check < PRESENCE_CHECK_EVERY {
            return true;
        }
        self.pumps_since_check = 0;
        self.connection
            .as_ref()
            .map_or(false, |c| discovery::find_port(&c.probe, &self.matcher).is_some())
    }
}

impl Transport for MidirBased {
    fn connect(&mut self, _is_normal: bool) -> Result<(), TransportError> {
        let connection = self.open()?;
        // Anything queued belongs to the previous session.
        self.receiver.try_iter().for_each(drop);
        self.connection = Some(connection);
        self.pumps_since_check = 0;
        tracing::debug!(port = %self.matcher.describe(), "midir connection opened");
        Ok(())
    }

    fn disconnect(&mut self, is_normal: bool) {
        if let Some(connection) = self.connection.take() {
            if is_normal {
                connection.input.close();
                connection.output.close();
            } else {
                // Closing a vanished device can hang inside the platform API.
                std::mem::forget(connection);
            }
        }
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let connection = self
            .connection
            .as_mut()
            .ok_or(TransportError::DeviceRemoved)?;
        connection.output.send(bytes).map_err(|e| match e {
            SendError::InvalidData(reason) => TransportError::Io(reason.into()),
            SendError::Other(_) => TransportError::DeviceRemoved,
        })
    }

    fn pump(&mut self) -> Result<Incoming, TransportError> {
        if self.connection.is_none() {
            return Ok(Vec::new());
        }
        if !self.still_present() {
            return Err(TransportError::DeviceRemoved);
        }
        Ok(self.receiver.try_iter().collect())
    }
}
