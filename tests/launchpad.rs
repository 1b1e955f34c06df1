use std::thread;
use std::time::{Duration, Instant};

use rust_launchpad::layout::{self, Variant};
use rust_launchpad::midi::controller::emulator::{EmulatorHandle, EmulatorTransport};
use rust_launchpad::{colors, Address, InputEvent, Launchpad, LightState, Lights, SystemButton, TickHandler};

fn emulated(variant: Variant) -> (Launchpad, EmulatorHandle) {
    let (transport, handle) = EmulatorTransport::new(variant).unwrap();
    (Launchpad::new(variant, transport).unwrap(), handle)
}

/// Installs `handler` with loops so slow they never fire; the test drives every tick itself.
fn attach(launchpad: &mut Launchpad, handler: impl TickHandler) {
    launchpad.start(1e-3, 1e-3, handler).unwrap();
}

fn inner_midi(variant: Variant, x: u8, y: u8) -> u8 {
    let tables = layout::resolve(variant).unwrap();
    let (ox, oy) = tables.inner_offset();
    tables.midi_at(x + ox, y + oy)
}

fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn test_rgb_light_reaches_the_device() {
    let (lp, device) = emulated(Variant::RgbSysEx);
    lp.set_rgb((0, 0), 63, 0, 20);
    lp.tick();

    assert!(device.is_connected());
    let lit = device.snapshot();
    assert_eq!(lit.len(), 1);
    assert_eq!(
        lit[&11],
        LightState::Rgb {
            red: 63,
            green: 0,
            blue: 20
        }
    );
}

#[test]
fn test_set_off_clears_the_device() {
    let (lp, device) = emulated(Variant::PaletteSysEx);
    lp.set((2, 3), colors::BLUE);
    lp.tick();
    assert_eq!(device.light(inner_midi(Variant::PaletteSysEx, 2, 3)), LightState::Normal { color: colors::BLUE });

    lp.set_off((2, 3));
    lp.tick();
    assert!(device.snapshot().is_empty());
}

#[test]
fn test_system_button_press_is_reported() {
    let (mut lp, device) = emulated(Variant::PaletteSysEx);
    attach(&mut lp, |events: &[InputEvent], lights: &mut Lights<'_>| {
        for event in events {
            if event.is_down() && event.button.system == Some(SystemButton::Up) {
                lights.set_pulse(SystemButton::Up, colors::PINK);
            }
        }
    });
    lp.tick();

    device.press(104);
    lp.tick();
    assert_eq!(device.light(104), LightState::Pulse { color: colors::PINK });
}

#[test]
fn test_handler_sees_inner_coordinates() {
    let (mut lp, device) = emulated(Variant::RgbSysEx);
    let (seen_tx, seen) = crossbeam_channel::unbounded();
    attach(&mut lp, move |events: &[InputEvent], _: &mut Lights<'_>| {
        for event in events {
            let _ = seen_tx.send((event.kind, event.button.inner));
        }
    });
    lp.tick();

    device.press(inner_midi(Variant::RgbSysEx, 3, 5));
    device.release(inner_midi(Variant::RgbSysEx, 3, 5));
    lp.tick();

    let seen: Vec<_> = seen.try_iter().collect();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].1, Some((3, 5)));
    assert_eq!(seen[1].1, Some((3, 5)));
    assert_ne!(seen[0].0, seen[1].0);
}

#[test]
fn test_reconnect_repaints_the_device() {
    let (lp, device) = emulated(Variant::RgbSysEx);
    lp.set((0, 0), colors::RED);
    lp.tick();
    assert_eq!(device.light(11), LightState::Normal { color: colors::RED });

    device.unplug();
    lp.tick();
    assert!(!lp.is_connected());

    // Changed while nobody was listening.
    lp.set(SystemButton::PowerLight, colors::WHITE);
    lp.tick();
    assert!(!lp.is_connected());

    device.plug_in();
    lp.tick();
    assert!(lp.is_connected());
    assert_eq!(device.light(11), LightState::Normal { color: colors::RED });
    assert_eq!(device.light(99), LightState::Normal { color: colors::WHITE });
    assert_eq!(device.snapshot().len(), 2);
}

#[test]
fn test_connection_changes_reach_the_handler() {
    struct Status(crossbeam_channel::Sender<bool>);

    impl TickHandler for Status {
        fn on_tick(&mut self, _: &[InputEvent], _: &mut Lights<'_>) {}

        fn on_connection(&mut self, connected: bool, lights: &mut Lights<'_>) {
            let _ = self.0.send(connected);
            if connected {
                lights.set(Address::Inner { x: 7, y: 7 }, colors::GREEN);
            }
        }
    }

    let (mut lp, device) = emulated(Variant::PaletteSysEx);
    let (tx, rx) = crossbeam_channel::unbounded();
    attach(&mut lp, Status(tx));

    lp.tick();
    device.unplug();
    lp.tick();
    device.plug_in();
    lp.tick();

    assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![true, false, true]);
    assert_eq!(
        device.light(inner_midi(Variant::PaletteSysEx, 7, 7)),
        LightState::Normal { color: colors::GREEN }
    );
}

#[test]
fn test_legacy_flash_follows_the_clock() {
    let variant = Variant::LegacyB;
    let (lp, device) = emulated(variant);
    let midi = inner_midi(variant, 0, 0);
    let (red, green) = (colors::legacy(3, 0), colors::legacy(0, 3));

    lp.set_flash((0, 0), red, green);
    lp.tick();
    assert_eq!(device.light(midi), LightState::Normal { color: red });

    for _ in 0..24 {
        lp.clock_tick();
    }
    lp.tick();
    assert_eq!(device.light(midi), LightState::Normal { color: green });

    for _ in 0..24 {
        lp.clock_tick();
    }
    lp.tick();
    assert_eq!(device.light(midi), LightState::Normal { color: red });
}

#[test]
fn test_legacy_top_row() {
    let (lp, device) = emulated(Variant::LegacyA);
    lp.set(SystemButton::Up, colors::legacy(0, 3));
    lp.tick();
    assert_eq!(device.light(204), LightState::Normal { color: colors::legacy(0, 3) });

    lp.set_off(SystemButton::Up);
    lp.tick();
    assert_eq!(device.light(204), LightState::Off);
}

#[test]
fn test_loops_run_until_stopped() {
    let (mut lp, device) = emulated(Variant::RgbSysEx);
    lp.start(120.0, 100.0, |events: &[InputEvent], lights: &mut Lights<'_>| {
        for event in events {
            let (x, y) = event.button.absolute;
            if event.is_down() {
                lights.set(Address::Absolute { x, y }, colors::CYAN);
            } else {
                lights.set_off(Address::Absolute { x, y });
            }
        }
    })
    .unwrap();
    assert!(lp.is_running());

    wait_until("connect", || device.is_connected());
    device.press(11);
    wait_until("light", || !device.light(11).is_off());
    assert_eq!(device.light(11), LightState::Normal { color: colors::CYAN });
    wait_until("clock", || device.clock_ticks() > 0);

    lp.stop();
    assert!(!lp.is_running());
    assert!(!lp.is_connected());
    assert!(!device.is_connected());
    assert!(device.snapshot().is_empty());

    let ticks = device.clock_ticks();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(device.clock_ticks(), ticks);
}

#[test]
fn test_restart_keeps_the_connection() {
    let (mut lp, device) = emulated(Variant::PaletteSysEx);
    attach(&mut lp, |_: &[InputEvent], _: &mut Lights<'_>| {});
    lp.set((1, 1), colors::YELLOW);
    lp.tick();

    attach(&mut lp, |_: &[InputEvent], _: &mut Lights<'_>| {});
    assert!(lp.is_connected());
    assert_eq!(device.snapshot().len(), 1);
}
