//! A virtual device for running without hardware.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::extensions::option::SentinelExt;
use crate::layout::{self, LayoutError, LayoutTables, Variant, LEGACY_CC_OFFSET};
use crate::midi::controller::{Incoming, Transport, TransportError};
use crate::midi::model::{MessageKind, MidiMessage, Status, TIMING_CLOCK};
use crate::midi::sysex::{self, Command, Protocol, SYSEX_START};
use crate::renderer::state::LightState;

const PRESS_VELOCITY: u8 = 127;

struct Panel {
    tables: &'static LayoutTables,
    model: Option<u8>,
    lights: Vec<LightState>,
    incoming: VecDeque<Vec<u8>>,
    clock_ticks: u64,
    connected: bool,
    unplugged: bool,
}

pub struct EmulatorTransport {
    panel: Arc<Mutex<Panel>>,
}

/// Inspects and plays the emulated device while a transport owns it.
#[derive(Clone)]
pub struct EmulatorHandle {
    panel: Arc<Mutex<Panel>>,
}

impl EmulatorTransport {
    pub fn new(variant: Variant) -> Result<(EmulatorTransport, EmulatorHandle), LayoutError> {
        let tables = layout::resolve(variant)?;
        let panel = Arc::new(Mutex::new(Panel {
            tables,
            model: Protocol::for_variant(variant).ok().map(|p| p.model()),
            lights: vec![LightState::Off; tables.light_count()],
            incoming: VecDeque::new(),
            clock_ticks: 0,
            connected: false,
            unplugged: false,
        }));
        Ok((
            EmulatorTransport {
                panel: panel.clone(),
            },
            EmulatorHandle { panel },
        ))
    }
}

impl Transport for EmulatorTransport {
    fn connect(&mut self, _is_normal: bool) -> Result<(), TransportError> {
        let mut panel = self.panel.lock();
        if panel.unplugged {
            return Err(TransportError::Unavailable("emulator is unplugged".to_string()));
        }
        panel.connected = true;
        Ok(())
    }

    fn disconnect(&mut self, _is_normal: bool) {
        self.panel.lock().connected = false;
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut panel = self.panel.lock();
        if !panel.connected || panel.unplugged {
            return Err(TransportError::DeviceRemoved);
        }
        panel.apply(bytes).map_err(|reason| {
            tracing::warn!(?bytes, %reason, "emulator rejected message");
            TransportError::Io(reason.into())
        })
    }

    fn pump(&mut self) -> Result<Incoming, TransportError> {
        let mut panel = self.panel.lock();
        if panel.unplugged && panel.connected {
            panel.connected = false;
            return Err(TransportError::DeviceRemoved);
        }
        Ok(panel.incoming.drain(..).collect())
    }
}

impl Panel {
    fn apply(&mut self, bytes: &[u8]) -> Result<(), String> {
        match bytes {
            [TIMING_CLOCK] => {
                self.clock_ticks += 1;
                Ok(())
            }
            [SYSEX_START, ..] => self.apply_sysex(bytes),
            &[status, fst, snd] => self.apply_short(status, fst, snd),
            _ => Err(format!("unexpected {} byte message", bytes.len())),
        }
    }

    fn apply_sysex(&mut self, bytes: &[u8]) -> Result<(), String> {
        let (model, payload) = sysex::unframe(bytes).ok_or("malformed envelope")?;
        if Some(model) != self.model {
            return Err(format!("envelope for model {model:#04x}"));
        }
        let (&command, body) = payload.split_first().ok_or("empty envelope")?;
        let command = Command::from_u8(command).ok_or(format!("unknown command {command:#04x}"))?;
        match command {
            Command::SetLightsPalette => self.each(body, 2, |panel, entry| {
                panel.store(entry[0], palette(entry[1]));
            }),
            Command::SetLightsRgb => self.each(body, 4, |panel, entry| {
                panel.store(
                    entry[0],
                    LightState::Rgb {
                        red: entry[1],
                        green: entry[2],
                        blue: entry[3],
                    },
                );
            }),
            Command::SetLightPulse => self.each(body, 2, |panel, entry| {
                panel.store(entry[0], LightState::Pulse { color: entry[1] });
            }),
            Command::SetLightFlash => self.each(body, 2, |panel, entry| {
                let color = match panel.light(entry[0]) {
                    LightState::Normal { color } | LightState::Flash { color, .. } => color,
                    _ => 0,
                };
                panel.store(entry[0], LightState::Flash { color, flash: entry[1] });
            }),
            Command::SetAllLights => {
                let &[color] = body else {
                    return Err("set-all-lights takes one colour".to_string());
                };
                self.lights.fill(palette(color));
                Ok(())
            }
            Command::ModeSelect | Command::LayoutSelect => Ok(()),
        }
    }

    fn apply_short(&mut self, status: u8, fst: u8, snd: u8) -> Result<(), String> {
        if !self.tables.variant().is_legacy() {
            return Err("plain light messages are not decoded for this variant".to_string());
        }
        let kind = Status::from_u8(status)
            .and_then(|s| s.kind())
            .ok_or(format!("not a status byte: {status:#04x}"))?;
        match (kind, fst) {
            (MessageKind::NoteOn, _) => self.store(fst, legacy(snd)),
            (MessageKind::NoteOff, _) => self.store(fst, LightState::Off),
            (MessageKind::ControlChange, 0x00) if snd == 0 => self.lights.fill(LightState::Off),
            (MessageKind::ControlChange, 0x00 | 0x1E | 0x1F) => {}
            (MessageKind::ControlChange, 104..=111) => self.store(fst + LEGACY_CC_OFFSET, legacy(snd)),
            _ => return Err(format!("unsupported {kind:?} {fst}")),
        }
        Ok(())
    }

    fn each(
        &mut self,
        body: &[u8],
        entry_len: usize,
        mut apply: impl FnMut(&mut Panel, &[u8]),
    ) -> Result<(), String> {
        if body.len() % entry_len != 0 {
            return Err(format!("payload is not a multiple of {entry_len} bytes"));
        }
        body.chunks(entry_len).for_each(|entry| apply(self, entry));
        Ok(())
    }

    fn store(&mut self, midi: u8, state: LightState) {
        match self.tables.index_of(midi).wired() {
            Some(index) => self.lights[index as usize] = state,
            None => tracing::debug!(midi, "emulator has no light for id"),
        }
    }

    fn light(&self, midi: u8) -> LightState {
        self.tables
            .index_of(midi)
            .wired()
            .map_or(LightState::Off, |index| self.lights[index as usize])
    }

    /// Message the hardware sends for `midi`.
    fn input(&self, midi: u8, velocity: u8) -> Vec<u8> {
        let variant = self.tables.variant();
        let (x, y) = self.tables.position_of(midi);
        let (ox, oy) = self.tables.inner_offset();
        let inner = (ox..ox + layout::INNER_SIZE).contains(&x) && (oy..oy + layout::INNER_SIZE).contains(&y);
        let message = match variant {
            Variant::LegacyA | Variant::LegacyB if midi >= LEGACY_CC_OFFSET + 104 => {
                MidiMessage::new(MessageKind::ControlChange, midi - LEGACY_CC_OFFSET, velocity)
            }
            Variant::PaletteSysEx if midi >= 104 => {
                MidiMessage::new(MessageKind::ControlChange, midi, velocity)
            }
            Variant::RgbSysEx if !inner => MidiMessage::new(MessageKind::ControlChange, midi, velocity),
            _ => MidiMessage::new(MessageKind::NoteOn, midi, velocity),
        };
        message.to_bytes().to_vec()
    }
}

fn palette(color: u8) -> LightState {
    if color == 0 {
        LightState::Off
    } else {
        LightState::Normal { color }
    }
}

// Bits 0-1 drive the red LED, bits 4-5 the green one.
fn legacy(color: u8) -> LightState {
    if color & 0x33 == 0 {
        LightState::Off
    } else {
        LightState::Normal { color }
    }
}

impl EmulatorHandle {
    /// Every light that is not off, by MIDI id.
    pub fn snapshot(&self) -> BTreeMap<u8, LightState> {
        let panel = self.panel.lock();
        panel
            .tables
            .midi_ids()
            .map(|midi| (midi, panel.light(midi)))
            .filter(|(_, state)| !state.is_off())
            .collect()
    }

    pub fn light(&self, midi: u8) -> LightState {
        self.panel.lock().light(midi)
    }

    pub fn press(&self, midi: u8) {
        let mut panel = self.panel.lock();
        let message = panel.input(midi, PRESS_VELOCITY);
        panel.incoming.push_back(message);
    }

    pub fn release(&self, midi: u8) {
        let mut panel = self.panel.lock();
        let message = panel.input(midi, 0);
        panel.incoming.push_back(message);
    }

    pub fn clock_ticks(&self) -> u64 {
        self.panel.lock().clock_ticks
    }

    pub fn is_connected(&self) -> bool {
        self.panel.lock().connected
    }

    pub fn unplug(&self) {
        self.panel.lock().unplugged = true;
    }

    pub fn plug_in(&self) {
        self.panel.lock().unplugged = false;
    }

    /// Text picture of the panel, top row first: `#` lit, `.` dark, blank where no light is.
    pub fn draw(&self) -> String {
        let panel = self.panel.lock();
        let tables = panel.tables;
        let mut out = String::new();
        for y in (0..tables.height()).rev() {
            for x in 0..tables.width() {
                let cell = match tables.midi_at(x, y).wired() {
                    None => ' ',
                    Some(midi) if panel.light(midi).is_off() => '.',
                    Some(_) => '#',
                };
                out.push(cell);
            }
            let _ = writeln!(out);
        }
        out
    }
}
