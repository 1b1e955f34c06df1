use crate::layout::SystemButton;

/// Everything known about one physical button, resolved once per device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ButtonDescriptor {
    pub midi: u8,
    /// Position inside the programmable 8x8 area, `None` for the outer strips.
    pub inner: Option<(u8, u8)>,
    /// Position on the whole panel, `y = 0` is the bottom row.
    pub absolute: (u8, u8),
    pub system: Option<SystemButton>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputKind {
    ButtonDown,
    ButtonUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub button: ButtonDescriptor,
}

impl InputEvent {
    pub fn is_down(&self) -> bool {
        self.kind == InputKind::ButtonDown
    }
}

/// How callers name a light.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Address {
    /// Relative to the inner 8x8 area, both coordinates below 8.
    Inner { x: u8, y: u8 },
    /// Relative to the bottom-left corner of the whole panel.
    Absolute { x: u8, y: u8 },
    System(SystemButton),
}

impl From<(u8, u8)> for Address {
    fn from((x, y): (u8, u8)) -> Self {
        Address::Inner { x, y }
    }
}

impl From<SystemButton> for Address {
    fn from(button: SystemButton) -> Self {
        Address::System(button)
    }
}

pub trait ButtonRegistry {
    fn describe(&self, midi: u8) -> Option<&ButtonDescriptor>;

    /// MIDI id behind `address`, `None` when nothing is wired there.
    fn resolve(&self, address: Address) -> Option<u8>;
}
