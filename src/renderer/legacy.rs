//! Launchpad S / Mini: one raw 3-byte message per light, software-simulated flashing.

use std::collections::HashSet;

use crate::layout::{LayoutTables, LEGACY_CC_OFFSET};
use crate::midi::model::{MessageKind, MidiMessage};
use crate::renderer::state::{LightBank, LightState};
use crate::renderer::FrameSink;

/// Clock ticks per blink phase, one quarter note at 24 ticks per beat.
pub const FLASH_TICKS: u32 = 24;

/// Colour value of an unlit top-row light (both LEDs dark, copy and clear flags set).
const TOP_ROW_OFF: u8 = 0x0C;

pub struct LegacyRenderer {
    bank: LightBank,
    flash_timer: u32,
    flash_phase: bool,
    rendered_phase: bool,
}

impl LegacyRenderer {
    pub fn new(tables: &'static LayoutTables) -> LegacyRenderer {
        LegacyRenderer {
            bank: LightBank::new(tables),
            flash_timer: 0,
            flash_phase: false,
            rendered_phase: false,
        }
    }

    pub(super) fn bank(&self) -> &LightBank {
        &self.bank
    }

    pub(super) fn bank_mut(&mut self) -> &mut LightBank {
        &mut self.bank
    }

    /// Reset, X-Y layout, full duty cycle.
    pub fn greeting() -> Vec<Vec<u8>> {
        [(0x00, 0x00), (0x00, 0x01), (0x1F, 0x00)]
            .into_iter()
            .map(|(cc, value)| {
                MidiMessage::new(MessageKind::ControlChange, cc, value)
                    .to_bytes()
                    .to_vec()
            })
            .collect()
    }

    pub fn farewell() -> Vec<Vec<u8>> {
        vec![MidiMessage::new(MessageKind::ControlChange, 0x00, 0x00)
            .to_bytes()
            .to_vec()]
    }

    pub fn clock_tick(&mut self) {
        self.flash_timer += 1;
        if self.flash_timer >= FLASH_TICKS {
            self.flash_phase = !self.flash_phase;
            self.flash_timer = 0;
        }
    }

    pub fn render(&mut self, sink: &mut dyn FrameSink) {
        let phase = self.flash_phase;
        let flipped = phase != self.rendered_phase;
        if !self.bank.is_invalidated() && !flipped {
            return;
        }

        let changes = self.bank.take_changes();
        for &(midi, state) in &changes {
            sink.send_frame(&encode(midi, state, phase));
        }

        if flipped {
            let touched: HashSet<u8> = changes.iter().map(|&(midi, _)| midi).collect();
            self.bank
                .current_where(|s| matches!(s, LightState::Flash { .. }))
                .filter(|(midi, _)| !touched.contains(midi))
                .for_each(|(midi, state)| sink.send_frame(&encode(midi, state, phase)));
            self.rendered_phase = phase;
        }
    }

    /// The device was just reset. Blink phase restarts too.
    pub fn on_connected(&mut self) {
        self.bank.forget_sent();
        self.flash_timer = 0;
        self.flash_phase = false;
        self.rendered_phase = false;
    }
}

fn encode(midi: u8, state: LightState, flash_phase: bool) -> [u8; 3] {
    let color = match state {
        LightState::Normal { color } | LightState::Pulse { color } => Some(color),
        LightState::Flash { color, flash } => Some(if flash_phase { flash } else { color }),
        LightState::Off | LightState::Rgb { .. } => None,
    };
    let top_row = midi >= LEGACY_CC_OFFSET + 104;
    let message = match (top_row, color) {
        (true, Some(color)) => {
            MidiMessage::new(MessageKind::ControlChange, midi - LEGACY_CC_OFFSET, color)
        }
        (true, None) => {
            MidiMessage::new(MessageKind::ControlChange, midi - LEGACY_CC_OFFSET, TOP_ROW_OFF)
        }
        (false, Some(color)) => MidiMessage::new(MessageKind::NoteOn, midi, color),
        (false, None) => MidiMessage::new(MessageKind::NoteOff, midi, 0),
    };
    message.to_bytes()
}
