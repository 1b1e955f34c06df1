use crate::extensions::option::OptionExt;

use serde::de::{Error, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt::Formatter;

/// Single-byte real-time message that advances the device's internal tempo.
pub const TIMING_CLOCK: u8 = 0xF8;

const U8_MSB_EXTRACTOR: u8 = 0x80;
const KIND_EXTRACTOR: u8 = 0xF0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status(u8);

impl Status {
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    pub fn from_u8(status: u8) -> Option<Status> {
        Option::when(status & U8_MSB_EXTRACTOR == U8_MSB_EXTRACTOR, || {
            Status(status)
        })
    }

    /// Status for `kind` on the first MIDI channel.
    pub fn of(kind: MessageKind) -> Status {
        Status(kind as u8)
    }

    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::from_status(self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    NoteOff = 0x80,
    NoteOn = 0x90,
    PolyphonicAftertouch = 0xA0,
    ControlChange = 0xB0,
    ProgramChange = 0xC0,
    ChannelAftertouch = 0xD0,
    PitchWheel = 0xE0,
}

impl MessageKind {
    fn from_status(status: u8) -> Option<MessageKind> {
        match status & KIND_EXTRACTOR {
            0x80 => Some(MessageKind::NoteOff),
            0x90 => Some(MessageKind::NoteOn),
            0xA0 => Some(MessageKind::PolyphonicAftertouch),
            0xB0 => Some(MessageKind::ControlChange),
            0xC0 => Some(MessageKind::ProgramChange),
            0xD0 => Some(MessageKind::ChannelAftertouch),
            0xE0 => Some(MessageKind::PitchWheel),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct DataByte(u8);

impl DataByte {
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    pub fn from_u8(db: u8) -> Option<DataByte> {
        Option::when(db & U8_MSB_EXTRACTOR == 0, || DataByte(db))
    }

    /// Drops the most significant bit, which a data byte may never carry.
    pub const fn masked(db: u8) -> DataByte {
        DataByte(db & !U8_MSB_EXTRACTOR)
    }
}

struct DataByteVisitor;

impl<'de> Visitor<'de> for DataByteVisitor {
    type Value = DataByte;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("Expecting data byte to be u8 between 0x00 and 0x7F.")
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        let parse_res = u8::try_from(v).ok().and_then(DataByte::from_u8);

        match parse_res {
            None => Err(E::custom(format!(
                "Expecting data byte to be u8 between 0x00 and 0x7F. Got: {}.",
                v
            ))),
            Some(db) => Ok(db),
        }
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(E::custom(format!(
                "Expecting data byte to be u8 between 0x00 and 0x7F. Got: {}.",
                v
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for DataByte {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_u8(DataByteVisitor)
    }
}

/// A three byte channel message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MidiMessage {
    pub status: Status,
    pub fst_data_byte: DataByte,
    pub snd_data_byte: DataByte,
}

impl MidiMessage {
    pub fn new(kind: MessageKind, fst: u8, snd: u8) -> MidiMessage {
        MidiMessage {
            status: Status::of(kind),
            fst_data_byte: DataByte::masked(fst),
            snd_data_byte: DataByte::masked(snd),
        }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        self.into()
    }
}

impl From<MidiMessage> for [u8; 3] {
    fn from(mm: MidiMessage) -> Self {
        [
            mm.status.as_u8(),
            mm.fst_data_byte.as_u8(),
            mm.snd_data_byte.as_u8(),
        ]
    }
}

/// A button message read back from the device, before any layout resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawInput {
    pub kind: MessageKind,
    pub id: u8,
    pub velocity: u8,
}

impl RawInput {
    /// Accepts 2-3 byte Note-On and Control-Change messages on any channel.
    ///
    /// A two byte message carries no velocity and reads as a release.
    pub fn parse(bytes: &[u8]) -> Option<RawInput> {
        let (status, id, velocity) = match *bytes {
            [status, id] => (status, id, 0),
            [status, id, velocity] => (status, id, velocity),
            _ => return None,
        };
        let kind = Status::from_u8(status)?.kind()?;
        match kind {
            MessageKind::NoteOn | MessageKind::ControlChange => Some(RawInput { kind, id, velocity }),
            _ => None,
        }
    }

    pub fn is_press(&self) -> bool {
        self.velocity != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_on() {
        let input = RawInput::parse(&[0x90, 11, 127]).unwrap();
        assert_eq!(input.kind, MessageKind::NoteOn);
        assert_eq!(input.id, 11);
        assert!(input.is_press());
    }

    #[test]
    fn test_parse_any_channel() {
        let input = RawInput::parse(&[0xB3, 104, 0]).unwrap();
        assert_eq!(input.kind, MessageKind::ControlChange);
        assert!(!input.is_press());
    }

    #[test]
    fn test_parse_two_bytes_is_release() {
        let input = RawInput::parse(&[0x90, 11]).unwrap();
        assert_eq!(input.velocity, 0);
    }

    #[test]
    fn test_parse_rejects_other_messages() {
        assert!(RawInput::parse(&[0x80, 11, 0]).is_none());
        assert!(RawInput::parse(&[TIMING_CLOCK]).is_none());
        assert!(RawInput::parse(&[0x90, 11, 1, 2]).is_none());
        assert!(RawInput::parse(&[0x10, 11, 1]).is_none());
    }

    #[test]
    fn test_message_bytes() {
        let bytes = MidiMessage::new(MessageKind::ControlChange, 104, 0x0C).to_bytes();
        assert_eq!(bytes, [0xB0, 104, 0x0C]);
    }

    #[test]
    fn test_data_byte_from_yaml() {
        let db: DataByte = serde_yaml::from_str("21").unwrap();
        assert_eq!(db.as_u8(), 21);
        assert!(serde_yaml::from_str::<DataByte>("200").is_err());
    }
}
