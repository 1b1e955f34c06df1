//! Manufacturer envelope framing for the SysEx-speaking devices.
//!
//! ```text
//! F0 | 00 20 29 | 02 | model | command | body... | F7
//! ```

use crate::layout::Variant;

pub const SYSEX_START: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;
pub const MANUFACTURER_ID: [u8; 3] = [0x00, 0x20, 0x29];
pub const PRODUCT_CLASS: u8 = 0x02;

/// Bytes in front of the payload: start marker, manufacturer id, product class, model byte.
pub const HEADER_LEN: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    SetLightsPalette = 0x0A,
    SetLightsRgb = 0x0B,
    SetAllLights = 0x0E,
    ModeSelect = 0x21,
    SetLightFlash = 0x23,
    SetLightPulse = 0x28,
    LayoutSelect = 0x2C,
}

impl Command {
    pub fn from_u8(byte: u8) -> Option<Command> {
        match byte {
            0x0A => Some(Command::SetLightsPalette),
            0x0B => Some(Command::SetLightsRgb),
            0x0E => Some(Command::SetAllLights),
            0x21 => Some(Command::ModeSelect),
            0x23 => Some(Command::SetLightFlash),
            0x28 => Some(Command::SetLightPulse),
            0x2C => Some(Command::LayoutSelect),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SysExError {
    #[error("{0:?} does not speak SysEx")]
    NoEnvelope(Variant),
    #[error("{variant:?} does not define command {command:?}")]
    UnsupportedCommand { variant: Variant, command: Command },
}

/// Frames `payload` as `F0 00 20 29 02 <model> <payload> F7`.
///
/// Returns `None` for an empty payload; such a frame is never transmitted.
pub fn frame(model: u8, payload: &[u8]) -> Option<Vec<u8>> {
    if payload.is_empty() {
        return None;
    }
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len() + 1);
    bytes.push(SYSEX_START);
    bytes.extend_from_slice(&MANUFACTURER_ID);
    bytes.push(PRODUCT_CLASS);
    bytes.push(model);
    bytes.extend_from_slice(payload);
    bytes.push(SYSEX_END);
    Some(bytes)
}

/// Splits a complete envelope into its model byte and payload.
pub fn unframe(bytes: &[u8]) -> Option<(u8, &[u8])> {
    if bytes.len() < HEADER_LEN + 2 {
        return None;
    }
    let (header, rest) = bytes.split_at(HEADER_LEN);
    let (&end, payload) = rest.split_last()?;
    let valid = header[0] == SYSEX_START
        && header[1..4] == MANUFACTURER_ID
        && header[4] == PRODUCT_CLASS
        && end == SYSEX_END;
    valid.then_some((header[5], payload))
}

/// Envelope dialect of one SysEx-speaking variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Protocol {
    variant: Variant,
    model: u8,
}

impl Protocol {
    pub fn for_variant(variant: Variant) -> Result<Protocol, SysExError> {
        let model = match variant {
            Variant::PaletteSysEx => 0x18,
            Variant::RgbSysEx => 0x10,
            Variant::LegacyA | Variant::LegacyB => return Err(SysExError::NoEnvelope(variant)),
        };
        Ok(Protocol { variant, model })
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn model(&self) -> u8 {
        self.model
    }

    pub fn supports(&self, command: Command) -> bool {
        match command {
            Command::SetLightsRgb => self.variant == Variant::RgbSysEx,
            _ => true,
        }
    }

    /// Fails when the variant does not define `command`.
    pub fn check(&self, command: Command) -> Result<(), SysExError> {
        if self.supports(command) {
            Ok(())
        } else {
            Err(SysExError::UnsupportedCommand {
                variant: self.variant,
                command,
            })
        }
    }

    /// Builds one `command` envelope. An empty body yields `Ok(None)`.
    pub fn message(&self, command: Command, body: &[u8]) -> Result<Option<Vec<u8>>, SysExError> {
        self.check(command)?;
        if body.is_empty() {
            return Ok(None);
        }
        let mut payload = Vec::with_capacity(body.len() + 1);
        payload.push(command as u8);
        payload.extend_from_slice(body);
        Ok(frame(self.model, &payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let bytes = frame(0x10, &[0x0B, 11, 5, 0, 0]).unwrap();
        assert_eq!(
            bytes,
            vec![0xF0, 0x00, 0x20, 0x29, 0x02, 0x10, 0x0B, 11, 5, 0, 0, 0xF7]
        );
    }

    #[test]
    fn test_empty_payload_is_suppressed() {
        assert!(frame(0x18, &[]).is_none());
        let mk2 = Protocol::for_variant(Variant::PaletteSysEx).unwrap();
        assert_eq!(mk2.message(Command::SetLightsPalette, &[]), Ok(None));
    }

    #[test]
    fn test_models() {
        assert_eq!(Protocol::for_variant(Variant::PaletteSysEx).unwrap().model(), 0x18);
        assert_eq!(Protocol::for_variant(Variant::RgbSysEx).unwrap().model(), 0x10);
    }

    #[test]
    fn test_legacy_has_no_envelope() {
        assert_eq!(
            Protocol::for_variant(Variant::LegacyB),
            Err(SysExError::NoEnvelope(Variant::LegacyB))
        );
    }

    #[test]
    fn test_palette_rejects_rgb() {
        let mk2 = Protocol::for_variant(Variant::PaletteSysEx).unwrap();
        assert_eq!(
            mk2.message(Command::SetLightsRgb, &[11, 1, 2, 3]),
            Err(SysExError::UnsupportedCommand {
                variant: Variant::PaletteSysEx,
                command: Command::SetLightsRgb
            })
        );
        let pro = Protocol::for_variant(Variant::RgbSysEx).unwrap();
        assert!(pro.message(Command::SetLightsRgb, &[11, 1, 2, 3]).unwrap().is_some());
    }

    #[test]
    fn test_unframe() {
        let bytes = frame(0x18, &[0x0E, 0x00]).unwrap();
        assert_eq!(unframe(&bytes), Some((0x18, &[0x0E, 0x00][..])));
        assert_eq!(unframe(&[0x90, 11, 5]), None);
        let mut broken = bytes.clone();
        broken[2] = 0x21;
        assert_eq!(unframe(&broken), None);
    }
}
