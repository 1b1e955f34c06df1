pub mod legacy;
pub mod state;
pub mod sysex;

use crate::layout::LayoutTables;
use crate::midi::sysex::SysExError;

use self::legacy::LegacyRenderer;
use self::state::{LightBank, LightState};
use self::sysex::SysExRenderer;

pub const MAX_COLOR: u8 = 0x7F;

pub const MAX_RGB: u8 = 0x3F;

/// Receives encoded wire messages, one complete message per call.
pub trait FrameSink {
    fn send_frame(&mut self, bytes: &[u8]);
}

impl FrameSink for Vec<Vec<u8>> {
    fn send_frame(&mut self, bytes: &[u8]) {
        self.push(bytes.to_vec());
    }
}

pub enum Renderer {
    Legacy(LegacyRenderer),
    Palette(SysExRenderer),
    Rgb(SysExRenderer),
}

impl Renderer {
    pub fn for_tables(tables: &'static LayoutTables) -> Result<Renderer, SysExError> {
        use crate::layout::Variant;
        Ok(match tables.variant() {
            Variant::LegacyA | Variant::LegacyB => Renderer::Legacy(LegacyRenderer::new(tables)),
            Variant::PaletteSysEx => Renderer::Palette(SysExRenderer::new(tables)?),
            Variant::RgbSysEx => Renderer::Rgb(SysExRenderer::new(tables)?),
        })
    }

    fn bank(&self) -> &LightBank {
        match self {
            Renderer::Legacy(r) => r.bank(),
            Renderer::Palette(r) | Renderer::Rgb(r) => r.bank(),
        }
    }

    fn bank_mut(&mut self) -> &mut LightBank {
        match self {
            Renderer::Legacy(r) => r.bank_mut(),
            Renderer::Palette(r) | Renderer::Rgb(r) => r.bank_mut(),
        }
    }

    pub fn tables(&self) -> &'static LayoutTables {
        self.bank().tables()
    }

    pub fn supports_rgb(&self) -> bool {
        matches!(self, Renderer::Rgb(r) if r.supports_rgb())
    }

    pub fn set(&mut self, midi: u8, color: u8) {
        if color <= MAX_COLOR {
            self.bank_mut().update(midi, LightState::Normal { color });
        }
    }

    pub fn set_off(&mut self, midi: u8) {
        self.bank_mut().update(midi, LightState::Off);
    }

    pub fn set_pulse(&mut self, midi: u8, color: u8) {
        if color <= MAX_COLOR {
            self.bank_mut().update(midi, LightState::Pulse { color });
        }
    }

    pub fn set_flash(&mut self, midi: u8, color: u8, flash: u8) {
        if color <= MAX_COLOR && flash <= MAX_COLOR {
            self.bank_mut()
                .update(midi, LightState::Flash { color, flash });
        }
    }

    /// True colour, saturating each channel at [`MAX_RGB`]. Ignored by palette-only devices.
    pub fn set_rgb(&mut self, midi: u8, red: u8, green: u8, blue: u8) {
        if !self.supports_rgb() {
            tracing::trace!(midi, "true colour is not supported, ignoring");
            return;
        }
        self.bank_mut().update(
            midi,
            LightState::Rgb {
                red: red.min(MAX_RGB),
                green: green.min(MAX_RGB),
                blue: blue.min(MAX_RGB),
            },
        );
    }

    pub fn set_light(&mut self, midi: u8, state: LightState) {
        match state {
            LightState::Off => self.set_off(midi),
            LightState::Normal { color } => self.set(midi, color),
            LightState::Pulse { color } => self.set_pulse(midi, color),
            LightState::Flash { color, flash } => self.set_flash(midi, color, flash),
            LightState::Rgb { red, green, blue } => self.set_rgb(midi, red, green, blue),
        }
    }

    /// State the next render will bring `midi` to, `None` for an unknown id.
    pub fn light(&self, midi: u8) -> Option<LightState> {
        self.bank().get(midi)
    }

    pub fn clear(&mut self) {
        self.bank_mut().clear();
    }

    pub fn is_invalidated(&self) -> bool {
        self.bank().is_invalidated()
    }

    pub fn clock_tick(&mut self, sink: &mut dyn FrameSink) {
        match self {
            Renderer::Legacy(r) => r.clock_tick(),
            Renderer::Palette(r) | Renderer::Rgb(r) => r.clock_tick(sink),
        }
    }

    pub fn render(&mut self, sink: &mut dyn FrameSink) {
        match self {
            Renderer::Legacy(r) => r.render(sink),
            Renderer::Palette(r) | Renderer::Rgb(r) => r.render(sink),
        }
    }

    /// Messages that put a freshly connected device into a known, dark state.
    pub fn greeting(&self) -> Vec<Vec<u8>> {
        match self {
            Renderer::Legacy(_) => LegacyRenderer::greeting(),
            Renderer::Palette(r) | Renderer::Rgb(r) => r.greeting().to_vec(),
        }
    }

    pub fn farewell(&self) -> Vec<Vec<u8>> {
        match self {
            Renderer::Legacy(_) => LegacyRenderer::farewell(),
            Renderer::Palette(r) | Renderer::Rgb(r) => r.farewell().to_vec(),
        }
    }

    /// The greeting wiped the device; the next render repaints everything that is lit.
    pub fn on_connected(&mut self) {
        match self {
            Renderer::Legacy(r) => r.on_connected(),
            Renderer::Palette(r) | Renderer::Rgb(r) => r.on_connected(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{resolve, Variant};
    use crate::midi::sysex::frame;

    fn renderer(variant: Variant) -> Renderer {
        Renderer::for_tables(resolve(variant).unwrap()).unwrap()
    }

    #[test]
    fn test_renderer_per_variant() {
        assert!(matches!(renderer(Variant::LegacyA), Renderer::Legacy(_)));
        assert!(matches!(renderer(Variant::LegacyB), Renderer::Legacy(_)));
        assert!(matches!(renderer(Variant::PaletteSysEx), Renderer::Palette(_)));
        assert!(matches!(renderer(Variant::RgbSysEx), Renderer::Rgb(_)));
    }

    #[test]
    fn test_rgb_scenario() {
        let mut r = renderer(Variant::RgbSysEx);
        r.set_rgb(11, 5, 0, 0);
        let mut frames: Vec<Vec<u8>> = Vec::new();
        r.render(&mut frames);
        assert_eq!(frames, vec![frame(0x10, &[0x0B, 11, 5, 0, 0]).unwrap()]);
        frames.clear();
        r.render(&mut frames);
        assert!(frames.is_empty());
    }

    #[test]
    fn test_palette_ignores_rgb() {
        let mut r = renderer(Variant::PaletteSysEx);
        r.set_rgb(11, 5, 0, 0);
        assert!(!r.is_invalidated());
        assert_eq!(r.light(11), Some(LightState::Off));
    }

    #[test]
    fn test_out_of_range_colors_are_ignored() {
        let mut r = renderer(Variant::PaletteSysEx);
        r.set_pulse(11, 200);
        r.set(11, 128);
        r.set_flash(11, 5, 130);
        assert!(!r.is_invalidated());
    }

    #[test]
    fn test_rgb_saturates() {
        let mut r = renderer(Variant::RgbSysEx);
        r.set_rgb(11, 200, 63, 0);
        assert_eq!(
            r.light(11),
            Some(LightState::Rgb { red: 63, green: 63, blue: 0 })
        );
    }

    #[test]
    fn test_set_light_dispatches() {
        let mut r = renderer(Variant::PaletteSysEx);
        r.set_light(11, LightState::Flash { color: 5, flash: 9 });
        assert_eq!(r.light(11), Some(LightState::Flash { color: 5, flash: 9 }));
        r.set_light(11, LightState::Off);
        assert_eq!(r.light(11), Some(LightState::Off));
    }

    #[test]
    fn test_unknown_midi_id_is_a_no_op() {
        let mut r = renderer(Variant::RgbSysEx);
        r.set(0, 5);
        r.set_off(200);
        assert!(!r.is_invalidated());
        assert_eq!(r.light(0), None);
    }
}
