use std::collections::HashMap;

use crate::extensions::option::{OptionExt, SentinelExt};
use crate::layout::{LayoutTables, SystemButton, INNER_SIZE, LEGACY_CC_OFFSET};
use crate::midi::model::MessageKind;
use crate::midi::registry::model::{
    Address, ButtonDescriptor, ButtonRegistry, InputEvent, InputKind,
};

/// Descriptor table for every MIDI id of one device, built once at construction.
pub struct ButtonMap {
    tables: &'static LayoutTables,
    descriptors: Vec<Option<ButtonDescriptor>>,
    system: HashMap<SystemButton, u8>,
}

impl ButtonMap {
    pub fn new(tables: &'static LayoutTables) -> ButtonMap {
        let (ox, oy) = tables.inner_offset();
        let mut descriptors = vec![None; 256];
        for midi in tables.midi_ids() {
            let (x, y) = tables.position_of(midi);
            let inner = (x.wrapping_sub(ox), y.wrapping_sub(oy));
            descriptors[midi as usize] = Some(ButtonDescriptor {
                midi,
                inner: Option::when(inner.0 < INNER_SIZE && inner.1 < INNER_SIZE, || inner),
                absolute: (x, y),
                system: tables.system_button(midi),
            });
        }
        ButtonMap {
            tables,
            descriptors,
            system: tables
                .system_buttons()
                .map(|(midi, button)| (button, midi))
                .collect(),
        }
    }

    /// Turns a button message into an event, `None` for ids the device does not have.
    ///
    /// Legacy devices reuse note numbers for Control-Change, which gets shifted first.
    pub fn resolve_input(&self, message: MessageKind, id: u8, kind: InputKind) -> Option<InputEvent> {
        let id = match message {
            MessageKind::ControlChange if self.tables.variant().is_legacy() => {
                id.checked_add(LEGACY_CC_OFFSET)?
            }
            _ => id,
        };
        self.describe(id).map(|&button| InputEvent { kind, button })
    }

    pub fn buttons(&self) -> impl Iterator<Item = &ButtonDescriptor> {
        self.descriptors.iter().flatten()
    }
}

impl ButtonRegistry for ButtonMap {
    fn describe(&self, midi: u8) -> Option<&ButtonDescriptor> {
        self.descriptors[midi as usize].as_ref()
    }

    fn resolve(&self, address: Address) -> Option<u8> {
        match address {
            Address::Inner { x, y } if x < INNER_SIZE && y < INNER_SIZE => {
                let (ox, oy) = self.tables.inner_offset();
                self.tables.midi_at(x + ox, y + oy).wired()
            }
            Address::Inner { .. } => None,
            Address::Absolute { x, y } => self.tables.midi_at(x, y).wired(),
            Address::System(button) => self.system.get(&button).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{resolve, Variant};

    fn map(variant: Variant) -> ButtonMap {
        ButtonMap::new(resolve(variant).unwrap())
    }

    #[test]
    fn test_system_button_input_is_tagged() {
        let mk2 = map(Variant::PaletteSysEx);
        let event = mk2
            .resolve_input(MessageKind::ControlChange, 104, InputKind::ButtonDown)
            .unwrap();
        assert_eq!(event.kind, InputKind::ButtonDown);
        assert_eq!(event.button.system, Some(SystemButton::Up));
        assert_eq!(event.button.inner, None);
    }

    #[test]
    fn test_grid_input_has_inner_position() {
        let pro = map(Variant::RgbSysEx);
        let event = pro
            .resolve_input(MessageKind::NoteOn, 11, InputKind::ButtonUp)
            .unwrap();
        assert_eq!(event.kind, InputKind::ButtonUp);
        assert_eq!(event.button.inner, Some((0, 0)));
        assert_eq!(event.button.absolute, (1, 2));
        assert_eq!(event.button.system, None);
    }

    #[test]
    fn test_legacy_control_change_is_shifted() {
        let mini = map(Variant::LegacyB);
        let top = mini
            .resolve_input(MessageKind::ControlChange, 104, InputKind::ButtonDown)
            .unwrap();
        assert_eq!(top.button.midi, 204);
        assert_eq!(top.button.system, Some(SystemButton::Up));

        let note = mini
            .resolve_input(MessageKind::NoteOn, 104, InputKind::ButtonDown)
            .unwrap();
        assert_eq!(note.button.midi, 104);
        assert_eq!(note.button.system, Some(SystemButton::Track7));
    }

    #[test]
    fn test_unknown_input_is_dropped() {
        let mini = map(Variant::LegacyB);
        assert!(mini
            .resolve_input(MessageKind::NoteOn, 9, InputKind::ButtonDown)
            .is_none());
        assert!(mini
            .resolve_input(MessageKind::ControlChange, 200, InputKind::ButtonDown)
            .is_none());
    }

    #[test]
    fn test_resolve_addresses() {
        let pro = map(Variant::RgbSysEx);
        assert_eq!(pro.resolve((0, 0).into()), Some(11));
        assert_eq!(pro.resolve((7, 7).into()), Some(88));
        assert_eq!(pro.resolve((8, 0).into()), None);
        assert_eq!(pro.resolve(Address::Absolute { x: 0, y: 0 }), None);
        assert_eq!(pro.resolve(Address::Absolute { x: 4, y: 0 }), Some(99));
        assert_eq!(pro.resolve(SystemButton::PowerLight.into()), Some(99));
        assert_eq!(map(Variant::LegacyA).resolve(SystemButton::Shift.into()), None);
    }

    #[test]
    fn test_every_button_round_trips() {
        for variant in Variant::ALL {
            let map = map(variant);
            for button in map.buttons() {
                let (x, y) = button.absolute;
                assert_eq!(map.resolve(Address::Absolute { x, y }), Some(button.midi));
                if let Some((x, y)) = button.inner {
                    assert_eq!(map.resolve(Address::Inner { x, y }), Some(button.midi));
                }
                if let Some(system) = button.system {
                    assert_eq!(map.resolve(system.into()), Some(button.midi));
                }
            }
        }
    }
}
