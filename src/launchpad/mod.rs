use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel as cch;
use parking_lot::Mutex;

use crate::device::{DeviceEvent, DeviceLifecycle};
use crate::layout::{self, LayoutError, Variant};
use crate::midi::controller::Transport;
use crate::midi::registry::inmem::ButtonMap;
use crate::midi::registry::model::{Address, ButtonRegistry, InputEvent, InputKind};
use crate::midi::sysex::SysExError;
use crate::renderer::state::LightState;
use crate::renderer::Renderer;
use crate::scheduler::Scheduler;

pub const PULSES_PER_BEAT: f64 = 24.0;

#[derive(Debug, thiserror::Error)]
pub enum LaunchpadError {
    #[error("Invalid layout table. Details: {0}")]
    Layout(#[from] LayoutError),
    #[error("Renderer does not fit the device. Details: {0}")]
    Protocol(#[from] SysExError),
    #[error("{what} must be a positive, finite rate. Got: {value}.")]
    InvalidRate { what: &'static str, value: f64 },
    #[error("Failed to spawn loop thread. Details: {0}")]
    Spawn(#[from] io::Error),
}

/// Receives the input of every logic tick and may change lights in response.
///
/// Runs while the device is locked, so clock pulses wait for it to return. Keep it short.
pub trait TickHandler: Send + 'static {
    /// `events` holds everything pressed or released since the previous tick, oldest first.
    /// It is empty on quiet ticks.
    fn on_tick(&mut self, events: &[InputEvent], lights: &mut Lights<'_>);

    fn on_connection(&mut self, _connected: bool, _lights: &mut Lights<'_>) {}
}

impl<F> TickHandler for F
where
    F: FnMut(&[InputEvent], &mut Lights<'_>) + Send + 'static,
{
    fn on_tick(&mut self, events: &[InputEvent], lights: &mut Lights<'_>) {
        self(events, lights)
    }
}

/// Address-based light access. Addresses that do not resolve to a light are ignored.
pub struct Lights<'a> {
    renderer: &'a mut Renderer,
    buttons: &'a ButtonMap,
}

impl Lights<'_> {
    fn midi(&self, address: impl Into<Address>) -> Option<u8> {
        let address = address.into();
        let midi = self.buttons.resolve(address);
        if midi.is_none() {
            tracing::trace!(?address, "no light at address");
        }
        midi
    }

    pub fn set(&mut self, address: impl Into<Address>, color: u8) {
        if let Some(midi) = self.midi(address) {
            self.renderer.set(midi, color);
        }
    }

    pub fn set_off(&mut self, address: impl Into<Address>) {
        if let Some(midi) = self.midi(address) {
            self.renderer.set_off(midi);
        }
    }

    pub fn set_pulse(&mut self, address: impl Into<Address>, color: u8) {
        if let Some(midi) = self.midi(address) {
            self.renderer.set_pulse(midi, color);
        }
    }

    pub fn set_flash(&mut self, address: impl Into<Address>, color: u8, flash: u8) {
        if let Some(midi) = self.midi(address) {
            self.renderer.set_flash(midi, color, flash);
        }
    }

    pub fn set_rgb(&mut self, address: impl Into<Address>, red: u8, green: u8, blue: u8) {
        if let Some(midi) = self.midi(address) {
            self.renderer.set_rgb(midi, red, green, blue);
        }
    }

    pub fn set_light(&mut self, address: impl Into<Address>, state: LightState) {
        if let Some(midi) = self.midi(address) {
            self.renderer.set_light(midi, state);
        }
    }

    pub fn get(&self, address: impl Into<Address>) -> Option<LightState> {
        self.midi(address).and_then(|midi| self.renderer.light(midi))
    }

    pub fn clear(&mut self) {
        self.renderer.clear();
    }
}

struct Core {
    device: DeviceLifecycle,
    renderer: Renderer,
    events: cch::Receiver<DeviceEvent>,
    buttons: ButtonMap,
    handler: Option<Box<dyn TickHandler>>,
}

impl Core {
    fn clock_tick(&mut self) {
        if self.device.is_connected() {
            self.renderer.clock_tick(&mut self.device);
        }
    }

    fn logic_tick(&mut self) {
        let connected = self.device.is_connected() || self.device.connect(true);
        if connected {
            self.device.pump();
        }
        // Drained on failed reconnects too, or every retry would leave a Connecting behind.
        let batch = self.drain_events();
        if !connected {
            return;
        }

        if let Some(handler) = self.handler.as_mut() {
            let mut lights = Lights {
                renderer: &mut self.renderer,
                buttons: &self.buttons,
            };
            handler.on_tick(&batch, &mut lights);
        }
        self.renderer.render(&mut self.device);
    }

    fn drain_events(&mut self) -> Vec<InputEvent> {
        let mut batch = Vec::new();
        for event in self.events.try_iter() {
            let (message, id, kind) = match event {
                DeviceEvent::ButtonDown { kind, id } => (kind, id, InputKind::ButtonDown),
                DeviceEvent::ButtonUp { kind, id } => (kind, id, InputKind::ButtonUp),
                DeviceEvent::Connected => {
                    self.renderer.on_connected();
                    notify_connection(&mut self.handler, &mut self.renderer, &self.buttons, true);
                    continue;
                }
                DeviceEvent::Disconnected => {
                    notify_connection(&mut self.handler, &mut self.renderer, &self.buttons, false);
                    continue;
                }
                DeviceEvent::Connecting | DeviceEvent::Disconnecting => continue,
            };
            match self.buttons.resolve_input(message, id, kind) {
                Some(input) => batch.push(input),
                None => tracing::debug!(?message, id, "input from unknown button"),
            }
        }
        batch
    }

    fn lights(&mut self) -> Lights<'_> {
        Lights {
            renderer: &mut self.renderer,
            buttons: &self.buttons,
        }
    }
}

fn notify_connection(
    handler: &mut Option<Box<dyn TickHandler>>,
    renderer: &mut Renderer,
    buttons: &ButtonMap,
    connected: bool,
) {
    if let Some(handler) = handler.as_mut() {
        handler.on_connection(connected, &mut Lights { renderer, buttons });
    }
}

pub struct Launchpad {
    variant: Variant,
    core: Arc<Mutex<Core>>,
    scheduler: Option<Scheduler>,
}

impl Launchpad {
    pub fn new<T>(variant: Variant, transport: T) -> Result<Launchpad, LaunchpadError>
    where
        T: Transport + 'static,
    {
        let tables = layout::resolve(variant)?;
        let renderer = Renderer::for_tables(tables)?;
        let (device, events) =
            DeviceLifecycle::new(Box::new(transport), renderer.greeting(), renderer.farewell());
        let core = Core {
            device,
            renderer,
            events,
            buttons: ButtonMap::new(tables),
            handler: None,
        };
        Ok(Launchpad {
            variant,
            core: Arc::new(Mutex::new(core)),
            scheduler: None,
        })
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Starts the clock and logic loops. Restarting replaces the handler and keeps the
    /// connection.
    pub fn start<H>(&mut self, bpm: f64, ticks_per_second: f64, handler: H) -> Result<(), LaunchpadError>
    where
        H: TickHandler,
    {
        let clock_period = period("bpm", bpm, bpm * PULSES_PER_BEAT / 60.0)?;
        let logic_period = period("ticks per second", ticks_per_second, ticks_per_second)?;

        if let Some(mut running) = self.scheduler.take() {
            running.shutdown();
        }
        self.core.lock().handler = Some(Box::new(handler));

        let mut scheduler = Scheduler::new();
        let core = self.core.clone();
        scheduler.register("launchpad-clock", clock_period, move || core.lock().clock_tick())?;
        let core = self.core.clone();
        scheduler.register("launchpad-logic", logic_period, move || core.lock().logic_tick())?;
        self.scheduler = Some(scheduler);

        tracing::info!(variant = ?self.variant, bpm, ticks_per_second, "launchpad started");
        Ok(())
    }

    /// Stops both loops, waits for them to exit, then disconnects the device.
    pub fn stop(&mut self) {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.shutdown();
            tracing::info!(variant = ?self.variant, "launchpad stopped");
        }
        self.core.lock().device.disconnect(true);
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.core.lock().device.is_connected()
    }

    pub fn tick(&self) {
        self.core.lock().logic_tick();
    }

    pub fn clock_tick(&self) {
        self.core.lock().clock_tick();
    }

    /// Changes lights from outside the logic loop. Shows up on the next render.
    pub fn lights<R>(&self, f: impl FnOnce(&mut Lights<'_>) -> R) -> R {
        let mut core = self.core.lock();
        f(&mut core.lights())
    }

    pub fn set(&self, address: impl Into<Address>, color: u8) {
        self.lights(|l| l.set(address, color))
    }

    pub fn set_off(&self, address: impl Into<Address>) {
        self.lights(|l| l.set_off(address))
    }

    pub fn set_pulse(&self, address: impl Into<Address>, color: u8) {
        self.lights(|l| l.set_pulse(address, color))
    }

    pub fn set_flash(&self, address: impl Into<Address>, color: u8, flash: u8) {
        self.lights(|l| l.set_flash(address, color, flash))
    }

    pub fn set_rgb(&self, address: impl Into<Address>, red: u8, green: u8, blue: u8) {
        self.lights(|l| l.set_rgb(address, red, green, blue))
    }
}

impl Drop for Launchpad {
    fn drop(&mut self) {
        self.stop();
    }
}

fn period(what: &'static str, value: f64, per_second: f64) -> Result<Duration, LaunchpadError> {
    let invalid = || LaunchpadError::InvalidRate { what, value };
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(per_second.recip()).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::controller::stubs::{MemoryTransport, WireProbe};
    use crate::midi::sysex::frame;

    fn launchpad(variant: Variant) -> (Launchpad, WireProbe) {
        let (transport, probe) = MemoryTransport::new();
        (Launchpad::new(variant, transport).unwrap(), probe)
    }

    #[test]
    fn test_period() {
        let clock = period("bpm", 125.0, 125.0 * PULSES_PER_BEAT / 60.0).unwrap();
        assert!((clock.as_secs_f64() - 0.02).abs() < 1e-9);
        assert!(matches!(
            period("bpm", 0.0, 0.0),
            Err(LaunchpadError::InvalidRate { what: "bpm", .. })
        ));
        assert!(period("ticks per second", f64::NAN, f64::NAN).is_err());
    }

    #[test]
    fn test_start_rejects_bad_rates() {
        let (mut lp, _) = launchpad(Variant::RgbSysEx);
        let handler = |_: &[InputEvent], _: &mut Lights<'_>| {};
        assert!(lp.start(-1.0, 60.0, handler).is_err());
        assert!(lp.start(120.0, 0.0, handler).is_err());
        assert!(!lp.is_running());
    }

    #[test]
    fn test_first_tick_connects_and_greets() {
        let (lp, probe) = launchpad(Variant::RgbSysEx);
        assert!(!lp.is_connected());
        lp.tick();
        assert!(lp.is_connected());
        assert_eq!(
            probe.take_sent(),
            vec![
                frame(0x10, &[0x21, 0x01]).unwrap(),
                frame(0x10, &[0x2C, 0x03]).unwrap(),
                frame(0x10, &[0x0E, 0x00]).unwrap(),
            ]
        );
    }

    #[test]
    fn test_failed_connect_skips_tick() {
        let (lp, probe) = launchpad(Variant::RgbSysEx);
        probe.script_connects([false, false]);
        lp.set_rgb((0, 0), 5, 0, 0);
        lp.tick();
        lp.tick();
        assert!(!lp.is_connected());
        assert!(probe.sent().is_empty());
        lp.tick();
        assert_eq!(probe.connect_attempts(), 3);
        assert!(probe.sent().contains(&frame(0x10, &[0x0B, 11, 5, 0, 0]).unwrap()));
    }

    #[test]
    fn test_failed_reconnects_do_not_pile_up_events() {
        let (lp, probe) = launchpad(Variant::RgbSysEx);
        lp.tick();
        probe.unplug();
        for _ in 0..10_000 {
            lp.tick();
        }
        assert!(!lp.is_connected());
        assert_eq!(probe.connect_attempts(), 10_000);
        assert_eq!(lp.core.lock().events.len(), 0);

        probe.plug_in();
        lp.tick();
        assert!(lp.is_connected());
    }

    #[test]
    fn test_clock_pulse_waits_for_a_running_tick() {
        let (mut lp, probe) = launchpad(Variant::PaletteSysEx);
        lp.tick();
        probe.take_sent();

        let (entered_tx, entered) = cch::bounded(1);
        lp.start(1e-3, 1e-3, move |_: &[InputEvent], lights: &mut Lights<'_>| {
            lights.set((0, 0), 5);
            let _ = entered_tx.try_send(());
            std::thread::sleep(Duration::from_millis(30));
        })
        .unwrap();

        std::thread::scope(|s| {
            s.spawn(|| lp.tick());
            entered.recv().unwrap();
            lp.clock_tick();
        });
        assert_eq!(
            probe.sent(),
            vec![frame(0x18, &[0x0A, 11, 5]).unwrap(), vec![0xF8]]
        );
    }

    #[test]
    fn test_clock_only_while_connected() {
        let (lp, probe) = launchpad(Variant::PaletteSysEx);
        lp.clock_tick();
        assert!(probe.sent().is_empty());
        lp.tick();
        probe.take_sent();
        lp.clock_tick();
        assert_eq!(probe.sent(), vec![vec![0xF8]]);
    }

    #[test]
    fn test_stop_disconnects_with_farewell() {
        let (mut lp, probe) = launchpad(Variant::PaletteSysEx);
        lp.tick();
        probe.take_sent();
        lp.stop();
        assert!(!lp.is_connected());
        assert_eq!(probe.sent(), vec![frame(0x18, &[0x0E, 0x00]).unwrap()]);
        assert_eq!(probe.disconnects(), vec![true]);
    }

    #[test]
    fn test_unresolved_address_is_ignored() {
        let (lp, _) = launchpad(Variant::PaletteSysEx);
        lp.set((8, 8), 5);
        lp.set(Address::Absolute { x: 8, y: 8 }, 5);
        lp.set(crate::layout::SystemButton::Shift, 5);
        assert!(!lp.core.lock().renderer.is_invalidated());
    }
}
