//! Per-variant button layouts. `y = 0` is the bottom row everywhere.

mod resolver;
pub mod tables;

use std::str::FromStr;
use std::sync::OnceLock;

use serde::de::{value, IntoDeserializer};
use serde::Deserialize;

pub use resolver::LayoutTables;

/// Marks "no button / no light here" in every table and is returned by lookups that miss.
pub const SENTINEL: u8 = 255;

/// Width and height of the programmable inner area on every supported device.
pub const INNER_SIZE: u8 = 8;

/// Added to Control-Change numbers of legacy devices so they do not collide with note ids.
pub const LEGACY_CC_OFFSET: u8 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Launchpad S.
    #[serde(alias = "launchpad_s")]
    LegacyA,
    /// Launchpad Mini.
    #[serde(alias = "launchpad_mini")]
    LegacyB,
    /// Launchpad MK2, palette colours over SysEx.
    #[serde(alias = "launchpad_mk2")]
    PaletteSysEx,
    /// Launchpad Pro, palette and true-colour over SysEx.
    #[serde(alias = "launchpad_pro")]
    RgbSysEx,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::LegacyA,
        Variant::LegacyB,
        Variant::PaletteSysEx,
        Variant::RgbSysEx,
    ];

    /// Legacy devices speak plain Note-On/Control-Change and have overlapping id ranges.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Variant::LegacyA | Variant::LegacyB)
    }
}

/// Accepts the same names as the configuration file.
impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let de: value::StrDeserializer<'_, value::Error> = s.into_deserializer();
        Variant::deserialize(de).map_err(|e| e.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SystemButton {
    Up,
    Down,
    Left,
    Right,
    Mode1,
    Mode2,
    Mode3,
    Mode4,
    Track1,
    Track2,
    Track3,
    Track4,
    Track5,
    Track6,
    Track7,
    Track8,
    RecordArm,
    TrackSelect,
    Mute,
    Solo,
    Volume,
    Pan,
    Sends,
    StopClip,
    Shift,
    Click,
    Undo,
    Delete,
    Quantise,
    Duplicate,
    Double,
    Record,
    PowerLight,
}

/// A static layout table that breaks its own invariants. Always fatal.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("{variant:?}: table holds {actual} cells, expected {width}x{height}")]
    Dimensions {
        variant: Variant,
        width: usize,
        height: usize,
        actual: usize,
    },
    #[error("{variant:?}: cell ({x}, {y}) has a button without a light or a light without a button")]
    SentinelMismatch { variant: Variant, x: usize, y: usize },
    #[error("{variant:?}: MIDI id {id} appears more than once")]
    DuplicateMidiId { variant: Variant, id: u8 },
    #[error("{variant:?}: light-index {index} appears more than once")]
    DuplicateLightIndex { variant: Variant, index: u8 },
    #[error("{variant:?}: light-index {index} is outside 0..{light_count}")]
    LightIndexOutOfRange {
        variant: Variant,
        index: u8,
        light_count: usize,
    },
    #[error("{variant:?}: system button {button:?} refers to MIDI id {id} which is not in the layout")]
    UnknownSystemButton {
        variant: Variant,
        button: SystemButton,
        id: u8,
    },
}

static RESOLVED: [OnceLock<Result<LayoutTables, LayoutError>>; 4] =
    [OnceLock::new(), OnceLock::new(), OnceLock::new(), OnceLock::new()];

/// Returns the lookup tables for `variant`, building them on first use.
///
/// Tables are built once per process and shared by reference between all devices.
pub fn resolve(variant: Variant) -> Result<&'static LayoutTables, LayoutError> {
    let slot = match variant {
        Variant::LegacyA => &RESOLVED[0],
        Variant::LegacyB => &RESOLVED[1],
        Variant::PaletteSysEx => &RESOLVED[2],
        Variant::RgbSysEx => &RESOLVED[3],
    };
    slot.get_or_init(|| LayoutTables::build(tables::definition(variant)))
        .as_ref()
        .map_err(Clone::clone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_resolves() {
        for variant in Variant::ALL {
            let tables = resolve(variant).unwrap();
            assert_eq!(tables.variant(), variant);
        }
    }

    #[test]
    fn test_resolve_shares_one_instance() {
        let a = resolve(Variant::RgbSysEx).unwrap();
        let b = resolve(Variant::RgbSysEx).unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_variant_from_yaml() {
        let v: Variant = serde_yaml::from_str("rgb_sys_ex").unwrap();
        assert_eq!(v, Variant::RgbSysEx);
        let v: Variant = serde_yaml::from_str("launchpad_mini").unwrap();
        assert_eq!(v, Variant::LegacyB);
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("launchpad_pro".parse::<Variant>(), Ok(Variant::RgbSysEx));
        assert_eq!("legacy_a".parse::<Variant>(), Ok(Variant::LegacyA));
        assert!("launchpad_x".parse::<Variant>().is_err());
    }
}
