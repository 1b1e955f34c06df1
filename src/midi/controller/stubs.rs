use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::midi::controller::{Incoming, Transport, TransportError};

#[derive(Default)]
struct Wire {
    connect_script: VecDeque<bool>,
    incoming: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    connect_attempts: usize,
    disconnects: Vec<bool>,
    connected: bool,
    unplugged: bool,
    removal_pending: bool,
}

/// In-memory transport for tests. Everything it does is observable through its [`WireProbe`].
pub struct MemoryTransport {
    wire: Arc<Mutex<Wire>>,
}

/// Cloneable handle that scripts and inspects a [`MemoryTransport`] from another thread.
#[derive(Clone)]
pub struct WireProbe {
    wire: Arc<Mutex<Wire>>,
}

impl MemoryTransport {
    pub fn new() -> (MemoryTransport, WireProbe) {
        let wire = Arc::new(Mutex::new(Wire::default()));
        (
            MemoryTransport { wire: wire.clone() },
            WireProbe { wire },
        )
    }
}

impl WireProbe {
    /// Outcomes of the next connect attempts, in order. Unscripted attempts succeed.
    pub fn script_connects(&self, outcomes: impl IntoIterator<Item = bool>) {
        self.wire.lock().connect_script.extend(outcomes);
    }

    /// Queues a raw message the next pump will return.
    pub fn push_input(&self, bytes: &[u8]) {
        self.wire.lock().incoming.push_back(bytes.to_vec());
    }

    /// Pulls the cable: the next pump or send reports `DeviceRemoved` and connects fail until
    /// [`WireProbe::plug_in`].
    pub fn unplug(&self) {
        let mut wire = self.wire.lock();
        wire.unplugged = true;
        wire.removal_pending = true;
    }

    pub fn plug_in(&self) {
        self.wire.lock().unplugged = false;
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.wire.lock().sent.clone()
    }

    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.wire.lock().sent)
    }

    pub fn connect_attempts(&self) -> usize {
        self.wire.lock().connect_attempts
    }

    /// `is_normal` of every disconnect call so far.
    pub fn disconnects(&self) -> Vec<bool> {
        self.wire.lock().disconnects.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.wire.lock().connected
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self, _is_normal: bool) -> Result<(), TransportError> {
        let mut wire = self.wire.lock();
        wire.connect_attempts += 1;
        let scripted = wire.connect_script.pop_front().unwrap_or(true);
        if !scripted || wire.unplugged {
            return Err(TransportError::Unavailable("memory".to_string()));
        }
        wire.connected = true;
        wire.removal_pending = false;
        Ok(())
    }

    fn disconnect(&mut self, is_normal: bool) {
        let mut wire = self.wire.lock();
        wire.connected = false;
        wire.disconnects.push(is_normal);
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut wire = self.wire.lock();
        if !wire.connected || wire.removal_pending {
            return Err(TransportError::DeviceRemoved);
        }
        wire.sent.push(bytes.to_vec());
        Ok(())
    }

    fn pump(&mut self) -> Result<Incoming, TransportError> {
        let mut wire = self.wire.lock();
        if wire.removal_pending {
            wire.removal_pending = false;
            wire.incoming.clear();
            return Err(TransportError::DeviceRemoved);
        }
        Ok(wire.incoming.drain(..).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_connects() {
        let (mut transport, probe) = MemoryTransport::new();
        probe.script_connects([false, true]);
        assert!(transport.connect(true).is_err());
        assert!(transport.connect(true).is_ok());
        assert_eq!(probe.connect_attempts(), 2);
        assert!(probe.is_connected());
    }

    #[test]
    fn test_unplug_reports_removal_once() {
        let (mut transport, probe) = MemoryTransport::new();
        transport.connect(true).unwrap();
        probe.push_input(&[0x90, 11, 127]);
        probe.unplug();
        assert!(matches!(transport.pump(), Err(TransportError::DeviceRemoved)));
        assert!(transport.pump().unwrap().is_empty());
        assert!(transport.connect(true).is_err());
        probe.plug_in();
        assert!(transport.connect(true).is_ok());
    }

    #[test]
    fn test_send_requires_connection() {
        let (mut transport, probe) = MemoryTransport::new();
        assert!(transport.send(&[0xF8]).is_err());
        transport.connect(true).unwrap();
        transport.send(&[0xF8]).unwrap();
        assert_eq!(probe.take_sent(), vec![vec![0xF8]]);
        assert!(probe.sent().is_empty());
    }
}
