use crossbeam_channel as cch;

use crate::midi::controller::{Transport, TransportError};
use crate::midi::model::{MessageKind, RawInput};
use crate::renderer::FrameSink;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
    ButtonDown { kind: MessageKind, id: u8 },
    ButtonUp { kind: MessageKind, id: u8 },
}

pub struct DeviceLifecycle {
    transport: Box<dyn Transport>,
    state: ConnectionState,
    greeting: Vec<Vec<u8>>,
    farewell: Vec<Vec<u8>>,
    events: cch::Sender<DeviceEvent>,
    failed_attempts: u64,
}

impl DeviceLifecycle {
    /// `greeting` is sent right after every successful connect, `farewell` before every
    /// requested disconnect.
    pub fn new(
        transport: Box<dyn Transport>,
        greeting: Vec<Vec<u8>>,
        farewell: Vec<Vec<u8>>,
    ) -> (DeviceLifecycle, cch::Receiver<DeviceEvent>) {
        let (events, receiver) = cch::unbounded();
        let lifecycle = DeviceLifecycle {
            transport,
            state: ConnectionState::Disconnected,
            greeting,
            farewell,
            events,
            failed_attempts: 0,
        };
        (lifecycle, receiver)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Connects, resetting an existing connection first. Returns whether the device is usable.
    pub fn connect(&mut self, is_normal: bool) -> bool {
        if self.state != ConnectionState::Disconnected {
            self.disconnect(is_normal);
        }

        self.transition(ConnectionState::Connecting, DeviceEvent::Connecting);
        match self.transport.connect(is_normal) {
            Ok(()) => {
                if self.failed_attempts > 0 {
                    tracing::info!(attempts = self.failed_attempts + 1, "device connected");
                } else {
                    tracing::info!("device connected");
                }
                self.failed_attempts = 0;
                self.transition(ConnectionState::Connected, DeviceEvent::Connected);
                let greeting = self.greeting.clone();
                for frame in &greeting {
                    if !self.send(frame) {
                        break;
                    }
                }
                self.is_connected()
            }
            Err(e) => {
                if self.failed_attempts == 0 {
                    tracing::warn!(error = %e, "device connect failed, retrying");
                } else {
                    tracing::debug!(error = %e, attempt = self.failed_attempts + 1, "device connect failed");
                }
                self.failed_attempts += 1;
                self.state = ConnectionState::Disconnected;
                false
            }
        }
    }

    /// `is_normal == false` skips the farewell and tells the transport the handle is gone.
    pub fn disconnect(&mut self, is_normal: bool) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.transition(ConnectionState::Disconnecting, DeviceEvent::Disconnecting);
        if is_normal {
            for frame in &self.farewell {
                if let Err(e) = self.transport.send(frame) {
                    tracing::debug!(error = %e, "farewell not delivered");
                    break;
                }
            }
        }
        self.transport.disconnect(is_normal);
        self.transition(ConnectionState::Disconnected, DeviceEvent::Disconnected);
        tracing::info!(is_normal, "device disconnected");
    }

    /// Forwards one complete message. Fails without I/O when not connected.
    pub fn send(&mut self, bytes: &[u8]) -> bool {
        if !self.is_connected() {
            return false;
        }
        match self.transport.send(bytes) {
            Ok(()) => true,
            Err(TransportError::DeviceRemoved) => {
                tracing::warn!("device removed while sending");
                self.disconnect(false);
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "send failed");
                false
            }
        }
    }

    pub fn pump(&mut self) {
        if !self.is_connected() {
            return;
        }
        match self.transport.pump() {
            Ok(messages) => {
                for message in messages {
                    match RawInput::parse(&message) {
                        Some(input) => self.emit(if input.is_press() {
                            DeviceEvent::ButtonDown {
                                kind: input.kind,
                                id: input.id,
                            }
                        } else {
                            DeviceEvent::ButtonUp {
                                kind: input.kind,
                                id: input.id,
                            }
                        }),
                        None => tracing::trace!(?message, "ignoring input"),
                    }
                }
            }
            Err(TransportError::DeviceRemoved) => {
                tracing::warn!("device removed");
                self.disconnect(false);
            }
            Err(e) => tracing::warn!(error = %e, "reading input failed"),
        }
    }

    fn transition(&mut self, state: ConnectionState, event: DeviceEvent) {
        self.state = state;
        self.emit(event);
    }

    fn emit(&self, event: DeviceEvent) {
        // The receiver lives as long as the owner; a closed channel only means nobody listens.
        let _ = self.events.send(event);
    }
}

impl FrameSink for DeviceLifecycle {
    fn send_frame(&mut self, bytes: &[u8]) {
        self.send(bytes);
    }
}
