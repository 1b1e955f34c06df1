//! Launchpad MK2 / Pro: lights batched into manufacturer envelopes, hardware pulse and flash.

use crate::layout::LayoutTables;
use crate::midi::model::TIMING_CLOCK;
use crate::midi::sysex::{Command, Protocol, SysExError};
use crate::renderer::state::{LightBank, LightState};
use crate::renderer::FrameSink;

/// Lights in the first true-colour envelope of a render. The remainder goes into a second one.
pub const RGB_LIGHTS_PER_ENVELOPE: usize = 40;

const RGB_ENTRY_LEN: usize = 4;

const PALETTE_COMMANDS: [Command; 6] = [
    Command::SetLightsPalette,
    Command::SetLightPulse,
    Command::SetLightFlash,
    Command::SetAllLights,
    Command::ModeSelect,
    Command::LayoutSelect,
];

/// Standalone mode, programmer layout, all lights off.
const GREETING: [(Command, &[u8]); 3] = [
    (Command::ModeSelect, &[0x01]),
    (Command::LayoutSelect, &[0x03]),
    (Command::SetAllLights, &[0x00]),
];

const FAREWELL: [(Command, &[u8]); 1] = [(Command::SetAllLights, &[0x00])];

pub struct SysExRenderer {
    protocol: Protocol,
    bank: LightBank,
    greeting: Vec<Vec<u8>>,
    farewell: Vec<Vec<u8>>,
}

impl SysExRenderer {
    /// Fails when the variant cannot carry every command this renderer emits.
    pub fn new(tables: &'static LayoutTables) -> Result<SysExRenderer, SysExError> {
        let protocol = Protocol::for_variant(tables.variant())?;
        for command in PALETTE_COMMANDS {
            protocol.check(command)?;
        }
        Ok(SysExRenderer {
            protocol,
            bank: LightBank::new(tables),
            greeting: messages(&protocol, &GREETING)?,
            farewell: messages(&protocol, &FAREWELL)?,
        })
    }

    pub fn supports_rgb(&self) -> bool {
        self.protocol.supports(Command::SetLightsRgb)
    }

    pub(super) fn bank(&self) -> &LightBank {
        &self.bank
    }

    pub(super) fn bank_mut(&mut self) -> &mut LightBank {
        &mut self.bank
    }

    pub fn greeting(&self) -> &[Vec<u8>] {
        &self.greeting
    }

    pub fn farewell(&self) -> &[Vec<u8>] {
        &self.farewell
    }

    /// Forwards the host tempo; the device runs pulse and flash from it.
    pub fn clock_tick(&mut self, sink: &mut dyn FrameSink) {
        sink.send_frame(&[TIMING_CLOCK]);
    }

    pub fn render(&mut self, sink: &mut dyn FrameSink) {
        if !self.bank.is_invalidated() {
            return;
        }
        let changes = self.bank.take_changes();
        let batches = Batches::collect(&changes);
        tracing::trace!(lights = changes.len(), "rendering light changes");
        batches.flush(&self.protocol, sink);
    }

    pub fn on_connected(&mut self) {
        self.bank.forget_sent();
    }
}

fn messages(protocol: &Protocol, commands: &[(Command, &[u8])]) -> Result<Vec<Vec<u8>>, SysExError> {
    let mut frames = Vec::with_capacity(commands.len());
    for &(command, body) in commands {
        frames.extend(protocol.message(command, body)?);
    }
    Ok(frames)
}

/// Changed lights grouped by the command that carries them.
#[derive(Debug, Default)]
struct Batches {
    off: Vec<u8>,
    normal: Vec<u8>,
    rgb: Vec<u8>,
    pulse: Vec<u8>,
    flash: Vec<u8>,
}

impl Batches {
    fn collect(changes: &[(u8, LightState)]) -> Batches {
        let mut batches = Batches::default();
        for &(midi, state) in changes {
            match state {
                LightState::Off => batches.off.extend([midi, 0]),
                LightState::Normal { color } => batches.normal.extend([midi, color]),
                LightState::Pulse { color } => batches.pulse.extend([midi, color]),
                // The device alternates between the static colour and the flash colour.
                LightState::Flash { color, flash } => {
                    batches.normal.extend([midi, color]);
                    batches.flash.extend([midi, flash]);
                }
                LightState::Rgb { red, green, blue } => {
                    batches.rgb.extend([midi, red, green, blue])
                }
            }
        }
        batches
    }

    fn flush(&self, protocol: &Protocol, sink: &mut dyn FrameSink) {
        send(protocol, sink, Command::SetLightsPalette, &self.off);
        send(protocol, sink, Command::SetLightsPalette, &self.normal);
        // At most two envelopes: the first is capped, the second takes the rest.
        let (first, rest) = self
            .rgb
            .split_at(self.rgb.len().min(RGB_LIGHTS_PER_ENVELOPE * RGB_ENTRY_LEN));
        send(protocol, sink, Command::SetLightsRgb, first);
        send(protocol, sink, Command::SetLightsRgb, rest);
        send(protocol, sink, Command::SetLightPulse, &self.pulse);
        send(protocol, sink, Command::SetLightFlash, &self.flash);
    }
}

fn send(protocol: &Protocol, sink: &mut dyn FrameSink, command: Command, body: &[u8]) {
    match protocol.message(command, body) {
        Ok(Some(frame)) => sink.send_frame(&frame),
        Ok(None) => {}
        Err(e) => tracing::error!(error = %e, lights = body.len(), "dropping light batch"),
    }
}
