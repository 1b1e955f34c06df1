pub mod discovery;
pub mod emulator;
pub mod midir;
pub mod stubs;

use std::error;

/// Raw MIDI messages read since the previous pump, one entry per message.
pub type Incoming = Vec<Vec<u8>>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("MIDI port is not available: {0}")]
    Unavailable(String),
    #[error("MIDI device was removed")]
    DeviceRemoved,
    #[error("MIDI I/O failed. Details: {0}")]
    Io(#[source] Box<dyn error::Error + Send + Sync>),
}

/// Byte-level access to one physical device.
///
/// `is_normal == false` marks a surprise removal: the handle is already gone and
/// implementations must skip teardown calls that could fail or hang on it.
pub trait Transport: Send {
    fn connect(&mut self, is_normal: bool) -> Result<(), TransportError>;

    fn disconnect(&mut self, is_normal: bool);

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Messages received since the previous call. `DeviceRemoved` reports an unplugged device.
    fn pump(&mut self) -> Result<Incoming, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self, is_normal: bool) -> Result<(), TransportError> {
        (**self).connect(is_normal)
    }

    fn disconnect(&mut self, is_normal: bool) {
        (**self).disconnect(is_normal)
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).send(bytes)
    }

    fn pump(&mut self) -> Result<Incoming, TransportError> {
        (**self).pump()
    }
}
