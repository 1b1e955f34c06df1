use crate::extensions::option::SentinelExt;
use crate::layout::LayoutTables;

/// What one light should show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LightState {
    #[default]
    Off,
    Normal {
        color: u8,
    },
    /// Breathes between dark and `color`.
    Pulse {
        color: u8,
    },
    /// Alternates between `color` and `flash`.
    Flash {
        color: u8,
        flash: u8,
    },
    Rgb {
        red: u8,
        green: u8,
        blue: u8,
    },
}

impl LightState {
    pub fn is_off(&self) -> bool {
        matches!(self, LightState::Off)
    }
}

/// Frequently used entries of the on-device colour table of the palette devices.
pub mod colors {
    pub const OFF: u8 = 0;
    pub const WHITE: u8 = 3;
    pub const RED: u8 = 5;
    pub const ORANGE: u8 = 9;
    pub const YELLOW: u8 = 13;
    pub const GREEN: u8 = 21;
    pub const CYAN: u8 = 33;
    pub const BLUE: u8 = 45;
    pub const PURPLE: u8 = 49;
    pub const PINK: u8 = 57;

    /// Colour byte for the two-LED legacy devices. Each channel is 0-3, the copy and clear
    /// flags are always set.
    pub fn legacy(red: u8, green: u8) -> u8 {
        (green.min(3) << 4) | red.min(3) | 0x0C
    }
}

/// Current and last-sent state for every light of one device, addressed by MIDI id.
pub struct LightBank {
    tables: &'static LayoutTables,
    current: Vec<LightState>,
    sent: Vec<LightState>,
    invalidated: bool,
}

impl LightBank {
    pub fn new(tables: &'static LayoutTables) -> LightBank {
        let count = tables.light_count();
        LightBank {
            tables,
            current: vec![LightState::Off; count],
            sent: vec![LightState::Off; count],
            invalidated: false,
        }
    }

    pub fn tables(&self) -> &'static LayoutTables {
        self.tables
    }

    /// Stores `state` for `midi`. Unknown ids and unchanged values are ignored.
    pub fn update(&mut self, midi: u8, state: LightState) -> bool {
        let Some(index) = self.tables.index_of(midi).wired() else {
            return false;
        };
        let slot = &mut self.current[index as usize];
        if *slot == state {
            return false;
        }
        *slot = state;
        self.invalidated = true;
        true
    }

    pub fn get(&self, midi: u8) -> Option<LightState> {
        self.tables
            .index_of(midi)
            .wired()
            .map(|index| self.current[index as usize])
    }

    pub fn clear(&mut self) {
        for slot in self.current.iter_mut().filter(|s| !s.is_off()) {
            *slot = LightState::Off;
            self.invalidated = true;
        }
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// The device was just wiped: everything lit has to be sent again.
    pub fn forget_sent(&mut self) {
        self.sent.fill(LightState::Off);
        self.invalidated = true;
    }

    /// Lights whose current state differs from what was last sent, in light-index order.
    ///
    /// Commits the current state as sent and clears the invalidated flag. Returns nothing when
    /// no mutation happened since the previous call.
    pub fn take_changes(&mut self) -> Vec<(u8, LightState)> {
        if !self.invalidated {
            return Vec::new();
        }
        let changes = self
            .current
            .iter()
            .zip(&self.sent)
            .enumerate()
            .filter(|(_, (now, before))| now != before)
            .map(|(index, (&now, _))| (self.tables.midi_of(index as u8), now))
            .collect();
        self.sent.copy_from_slice(&self.current);
        self.invalidated = false;
        changes
    }

    /// Current lights matching `pred`, in light-index order.
    pub fn current_where<'a>(
        &'a self,
        pred: impl Fn(&LightState) -> bool + 'a,
    ) -> impl Iterator<Item = (u8, LightState)> + 'a {
        self.current
            .iter()
            .enumerate()
            .filter(move |(_, state)| pred(state))
            .map(|(index, &state)| (self.tables.midi_of(index as u8), state))
    }
}
