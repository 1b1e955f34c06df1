//! Static per-variant layout data.
//!
//! Tables are row-major and written the way the device looks from above: the first row is the
//! visually top row. `SENTINEL` marks a cell without a button or without a light.

use super::{SystemButton, Variant, SENTINEL};

const X: u8 = SENTINEL;

/// Raw description of one device family.
pub struct LayoutDef {
    pub variant: Variant,
    pub width: usize,
    pub height: usize,
    pub inner_offset: (u8, u8),
    pub midi: &'static [u8],
    pub lights: &'static [u8],
    pub system_buttons: &'static [(u8, SystemButton)],
    pub port_name: &'static str,
    pub port_sub_name: &'static str,
}

// Launchpad S and Launchpad Mini share one wiring. The top row is sent as Control-Change
// 104-111 and stored shifted by +100 so it does not collide with note ids 104-111.
#[rustfmt::skip]
const LEGACY_MIDI: [u8; 81] = [
    204, 205, 206, 207, 208, 209, 210, 211, X,
      0,   1,   2,   3,   4,   5,   6,   7,   8,
     16,  17,  18,  19,  20,  21,  22,  23,  24,
     32,  33,  34,  35,  36,  37,  38,  39,  40,
     48,  49,  50,  51,  52,  53,  54,  55,  56,
     64,  65,  66,  67,  68,  69,  70,  71,  72,
     80,  81,  82,  83,  84,  85,  86,  87,  88,
     96,  97,  98,  99, 100, 101, 102, 103, 104,
    112, 113, 114, 115, 116, 117, 118, 119, 120,
];

#[rustfmt::skip]
const MK2_MIDI: [u8; 81] = [
    104, 105, 106, 107, 108, 109, 110, 111, X,
     81,  82,  83,  84,  85,  86,  87,  88, 89,
     71,  72,  73,  74,  75,  76,  77,  78, 79,
     61,  62,  63,  64,  65,  66,  67,  68, 69,
     51,  52,  53,  54,  55,  56,  57,  58, 59,
     41,  42,  43,  44,  45,  46,  47,  48, 49,
     31,  32,  33,  34,  35,  36,  37,  38, 39,
     21,  22,  23,  24,  25,  26,  27,  28, 29,
     11,  12,  13,  14,  15,  16,  17,  18, 19,
];

// Inner 8x8 first, then the right strip, then the top strip.
#[rustfmt::skip]
const NINE_BY_NINE_LIGHTS: [u8; 81] = [
    72, 73, 74, 75, 76, 77, 78, 79, X,
     0,  1,  2,  3,  4,  5,  6,  7, 64,
     8,  9, 10, 11, 12, 13, 14, 15, 65,
    16, 17, 18, 19, 20, 21, 22, 23, 66,
    24, 25, 26, 27, 28, 29, 30, 31, 67,
    32, 33, 34, 35, 36, 37, 38, 39, 68,
    40, 41, 42, 43, 44, 45, 46, 47, 69,
    48, 49, 50, 51, 52, 53, 54, 55, 70,
    56, 57, 58, 59, 60, 61, 62, 63, 71,
];

#[rustfmt::skip]
const PRO_MIDI: [u8; 110] = [
     X, 91, 92, 93, 94, 95, 96, 97, 98,  X,
    80, 81, 82, 83, 84, 85, 86, 87, 88, 89,
    70, 71, 72, 73, 74, 75, 76, 77, 78, 79,
    60, 61, 62, 63, 64, 65, 66, 67, 68, 69,
    50, 51, 52, 53, 54, 55, 56, 57, 58, 59,
    40, 41, 42, 43, 44, 45, 46, 47, 48, 49,
    30, 31, 32, 33, 34, 35, 36, 37, 38, 39,
    20, 21, 22, 23, 24, 25, 26, 27, 28, 29,
    10, 11, 12, 13, 14, 15, 16, 17, 18, 19,
     X,  1,  2,  3,  4,  5,  6,  7,  8,  X,
     X,  X,  X,  X, 99,  X,  X,  X,  X,  X,
];

#[rustfmt::skip]
const PRO_LIGHTS: [u8; 110] = [
     X, 72, 73, 74, 75, 76, 77, 78, 79,  X,
    80,  0,  1,  2,  3,  4,  5,  6,  7, 64,
    81,  8,  9, 10, 11, 12, 13, 14, 15, 65,
    82, 16, 17, 18, 19, 20, 21, 22, 23, 66,
    83, 24, 25, 26, 27, 28, 29, 30, 31, 67,
    84, 32, 33, 34, 35, 36, 37, 38, 39, 68,
    85, 40, 41, 42, 43, 44, 45, 46, 47, 69,
    86, 48, 49, 50, 51, 52, 53, 54, 55, 70,
    87, 56, 57, 58, 59, 60, 61, 62, 63, 71,
     X, 89, 90, 91, 92, 93, 94, 95, 96,  X,
     X,  X,  X,  X, 88,  X,  X,  X,  X,  X,
];

const LEGACY_SYSTEM_BUTTONS: [(u8, SystemButton); 16] = [
    (8, SystemButton::Track1),
    (24, SystemButton::Track2),
    (40, SystemButton::Track3),
    (56, SystemButton::Track4),
    (72, SystemButton::Track5),
    (88, SystemButton::Track6),
    (104, SystemButton::Track7),
    (120, SystemButton::Track8),
    (204, SystemButton::Up),
    (205, SystemButton::Down),
    (206, SystemButton::Left),
    (207, SystemButton::Right),
    (208, SystemButton::Mode1),
    (209, SystemButton::Mode2),
    (210, SystemButton::Mode3),
    (211, SystemButton::Mode4),
];

const MK2_SYSTEM_BUTTONS: [(u8, SystemButton); 16] = [
    (89, SystemButton::Track1),
    (79, SystemButton::Track2),
    (69, SystemButton::Track3),
    (59, SystemButton::Track4),
    (49, SystemButton::Track5),
    (39, SystemButton::Track6),
    (29, SystemButton::Track7),
    (19, SystemButton::Track8),
    (104, SystemButton::Up),
    (105, SystemButton::Down),
    (106, SystemButton::Left),
    (107, SystemButton::Right),
    (108, SystemButton::Mode1),
    (109, SystemButton::Mode2),
    (110, SystemButton::Mode3),
    (111, SystemButton::Mode4),
];

const PRO_SYSTEM_BUTTONS: [(u8, SystemButton); 33] = [
    (1, SystemButton::RecordArm),
    (2, SystemButton::TrackSelect),
    (3, SystemButton::Mute),
    (4, SystemButton::Solo),
    (5, SystemButton::Volume),
    (6, SystemButton::Pan),
    (7, SystemButton::Sends),
    (8, SystemButton::StopClip),
    (89, SystemButton::Track1),
    (79, SystemButton::Track2),
    (69, SystemButton::Track3),
    (59, SystemButton::Track4),
    (49, SystemButton::Track5),
    (39, SystemButton::Track6),
    (29, SystemButton::Track7),
    (19, SystemButton::Track8),
    (91, SystemButton::Up),
    (92, SystemButton::Down),
    (93, SystemButton::Left),
    (94, SystemButton::Right),
    (95, SystemButton::Mode1),
    (96, SystemButton::Mode2),
    (97, SystemButton::Mode3),
    (98, SystemButton::Mode4),
    (80, SystemButton::Shift),
    (70, SystemButton::Click),
    (60, SystemButton::Undo),
    (50, SystemButton::Delete),
    (40, SystemButton::Quantise),
    (30, SystemButton::Duplicate),
    (20, SystemButton::Double),
    (10, SystemButton::Record),
    (99, SystemButton::PowerLight),
];

pub static LAUNCHPAD_S: LayoutDef = LayoutDef {
    variant: Variant::LegacyA,
    width: 9,
    height: 9,
    inner_offset: (0, 0),
    midi: &LEGACY_MIDI,
    lights: &NINE_BY_NINE_LIGHTS,
    system_buttons: &LEGACY_SYSTEM_BUTTONS,
    port_name: "Launchpad S",
    port_sub_name: "Launchpad S MIDI 1",
};

pub static LAUNCHPAD_MINI: LayoutDef = LayoutDef {
    variant: Variant::LegacyB,
    width: 9,
    height: 9,
    inner_offset: (0, 0),
    midi: &LEGACY_MIDI,
    lights: &NINE_BY_NINE_LIGHTS,
    system_buttons: &LEGACY_SYSTEM_BUTTONS,
    port_name: "Launchpad Mini",
    port_sub_name: "Launchpad Mini MIDI 1",
};

pub static LAUNCHPAD_MK2: LayoutDef = LayoutDef {
    variant: Variant::PaletteSysEx,
    width: 9,
    height: 9,
    inner_offset: (0, 0),
    midi: &MK2_MIDI,
    lights: &NINE_BY_NINE_LIGHTS,
    system_buttons: &MK2_SYSTEM_BUTTONS,
    port_name: "Launchpad MK2",
    port_sub_name: "Launchpad MK2 MIDI 2",
};

pub static LAUNCHPAD_PRO: LayoutDef = LayoutDef {
    variant: Variant::RgbSysEx,
    width: 10,
    height: 11,
    inner_offset: (1, 2),
    midi: &PRO_MIDI,
    lights: &PRO_LIGHTS,
    system_buttons: &PRO_SYSTEM_BUTTONS,
    port_name: "Launchpad Pro",
    port_sub_name: "MIDI 2",
};

pub fn definition(variant: Variant) -> &'static LayoutDef {
    match variant {
        Variant::LegacyA => &LAUNCHPAD_S,
        Variant::LegacyB => &LAUNCHPAD_MINI,
        Variant::PaletteSysEx => &LAUNCHPAD_MK2,
        Variant::RgbSysEx => &LAUNCHPAD_PRO,
    }
}
