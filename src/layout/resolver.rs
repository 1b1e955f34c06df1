use std::collections::HashMap;

use super::tables::LayoutDef;
use super::{LayoutError, SystemButton, Variant, SENTINEL};

const ID_SPACE: usize = 256;

/// O(1) lookups between MIDI ids, light-indices and grid positions for one variant.
///
/// Every lookup answers [`SENTINEL`] for input it does not know; none of them fail.
#[derive(Debug)]
pub struct LayoutTables {
    variant: Variant,
    width: u8,
    height: u8,
    inner_offset: (u8, u8),
    light_count: usize,
    midi_to_index: [u8; ID_SPACE],
    index_to_midi: [u8; ID_SPACE],
    midi_to_pos: [(u8, u8); ID_SPACE],
    pos_to_midi: Vec<u8>,
    pos_to_index: Vec<u8>,
    system_buttons: HashMap<u8, SystemButton>,
}

impl LayoutTables {
    pub(super) fn build(def: &LayoutDef) -> Result<LayoutTables, LayoutError> {
        let variant = def.variant;
        let cells = def.width * def.height;
        for actual in [def.midi.len(), def.lights.len()] {
            if actual != cells {
                return Err(LayoutError::Dimensions {
                    variant,
                    width: def.width,
                    height: def.height,
                    actual,
                });
            }
        }

        let mut tables = LayoutTables {
            variant,
            width: def.width as u8,
            height: def.height as u8,
            inner_offset: def.inner_offset,
            light_count: 0,
            midi_to_index: [SENTINEL; ID_SPACE],
            index_to_midi: [SENTINEL; ID_SPACE],
            midi_to_pos: [(SENTINEL, SENTINEL); ID_SPACE],
            pos_to_midi: vec![SENTINEL; cells],
            pos_to_index: vec![SENTINEL; cells],
            system_buttons: HashMap::new(),
        };

        // Row 0 of the definition is the visual top row, grid y = 0 is the bottom row.
        for y in 0..def.height {
            let row = def.height - y - 1;
            for x in 0..def.width {
                let midi = def.midi[row * def.width + x];
                let index = def.lights[row * def.width + x];
                match (midi == SENTINEL, index == SENTINEL) {
                    (true, true) => continue,
                    (false, false) => {}
                    _ => return Err(LayoutError::SentinelMismatch { variant, x, y }),
                }
                if tables.midi_to_index[midi as usize] != SENTINEL {
                    return Err(LayoutError::DuplicateMidiId { variant, id: midi });
                }
                if tables.index_to_midi[index as usize] != SENTINEL {
                    return Err(LayoutError::DuplicateLightIndex { variant, index });
                }
                tables.midi_to_index[midi as usize] = index;
                tables.index_to_midi[index as usize] = midi;
                tables.midi_to_pos[midi as usize] = (x as u8, y as u8);
                tables.pos_to_midi[y * def.width + x] = midi;
                tables.pos_to_index[y * def.width + x] = index;
                tables.light_count += 1;
            }
        }

        // Unique indices plus all of them below the count means [0, count) is fully covered.
        if let Some(index) = tables.index_to_midi[tables.light_count..]
            .iter()
            .position(|&midi| midi != SENTINEL)
        {
            return Err(LayoutError::LightIndexOutOfRange {
                variant,
                index: (tables.light_count + index) as u8,
                light_count: tables.light_count,
            });
        }

        for &(id, button) in def.system_buttons {
            if tables.midi_to_index[id as usize] == SENTINEL {
                return Err(LayoutError::UnknownSystemButton { variant, button, id });
            }
            tables.system_buttons.insert(id, button);
        }

        Ok(tables)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Absolute position of the inner area's bottom-left cell.
    pub fn inner_offset(&self) -> (u8, u8) {
        self.inner_offset
    }

    pub fn light_count(&self) -> usize {
        self.light_count
    }

    pub fn index_of(&self, midi: u8) -> u8 {
        self.midi_to_index[midi as usize]
    }

    pub fn midi_of(&self, index: u8) -> u8 {
        self.index_to_midi[index as usize]
    }

    pub fn midi_at(&self, x: u8, y: u8) -> u8 {
        self.cell(x, y)
            .map_or(SENTINEL, |cell| self.pos_to_midi[cell])
    }

    pub fn index_at(&self, x: u8, y: u8) -> u8 {
        self.cell(x, y)
            .map_or(SENTINEL, |cell| self.pos_to_index[cell])
    }

    /// Absolute grid position of `midi`, `(SENTINEL, SENTINEL)` when the id is not wired.
    pub fn position_of(&self, midi: u8) -> (u8, u8) {
        self.midi_to_pos[midi as usize]
    }

    pub fn system_button(&self, midi: u8) -> Option<SystemButton> {
        self.system_buttons.get(&midi).copied()
    }

    pub fn system_buttons(&self) -> impl Iterator<Item = (u8, SystemButton)> + '_ {
        self.system_buttons.iter().map(|(&id, &button)| (id, button))
    }

    /// All wired MIDI ids in light-index order.
    pub fn midi_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.index_to_midi[..self.light_count].iter().copied()
    }

    fn cell(&self, x: u8, y: u8) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }
}
