use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_launchpad::configuration::{self, LaunchpadConfig};
use rust_launchpad::layout::{self, INNER_SIZE};
use rust_launchpad::midi::controller::discovery;
use rust_launchpad::midi::controller::emulator::{EmulatorHandle, EmulatorTransport};
use rust_launchpad::midi::controller::midir::MidirBased;
use rust_launchpad::midi::controller::Transport;
use rust_launchpad::{Address, InputEvent, Launchpad, Lights, SystemButton, TickHandler, Variant};

/// Lights up pressed pads of a Launchpad grid controller.
#[derive(Parser, Debug)]
#[command(name = "rust_launchpad")]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device variant, e.g. launchpad_mk2. Detected from the MIDI ports when omitted
    #[arg(long)]
    variant: Option<Variant>,

    /// Print the visible MIDI ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Drive an emulated device. Type `press x y` or `release x y` on stdin
    #[arg(long)]
    emulate: bool,
}

/// Pressed pads light up, system buttons pulse until pressed.
struct Demo {
    pressed: u8,
    system: u8,
    system_buttons: Vec<SystemButton>,
}

impl Demo {
    fn idle_system_buttons(&self, lights: &mut Lights<'_>) {
        for &button in &self.system_buttons {
            lights.set_pulse(button, self.system);
        }
    }
}

impl TickHandler for Demo {
    fn on_tick(&mut self, events: &[InputEvent], lights: &mut Lights<'_>) {
        for event in events {
            let (x, y) = event.button.absolute;
            let address = Address::Absolute { x, y };
            match (event.is_down(), event.button.system) {
                (true, _) => lights.set(address, self.pressed),
                (false, Some(_)) => lights.set_pulse(address, self.system),
                (false, None) => lights.set_off(address),
            }
        }
    }

    fn on_connection(&mut self, connected: bool, lights: &mut Lights<'_>) {
        if connected {
            self.idle_system_buttons(lights);
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();

    if args.list_ports {
        for name in discovery::list_ports()? {
            match discovery::classify(&name) {
                Some(variant) => println!("{name}\t{variant:?}"),
                None => println!("{name}"),
            }
        }
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => configuration::load_from_yaml(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => LaunchpadConfig::default(),
    };
    let variant = match args.variant.or(config.variant) {
        Some(variant) => variant,
        None if args.emulate => Variant::RgbSysEx,
        None => detect_variant()?,
    };
    let settings = configuration::parse(config, variant);
    tracing::info!(?settings, "configuration loaded");

    let mut emulator = None;
    let transport: Box<dyn Transport> = if args.emulate {
        let (transport, handle) = EmulatorTransport::new(variant)?;
        emulator = Some(handle);
        Box::new(transport)
    } else {
        Box::new(MidirBased::new("rust-launchpad", settings.port.clone()))
    };

    let demo = Demo {
        pressed: settings.pressed_color,
        system: settings.system_color,
        system_buttons: layout::resolve(variant)?
            .system_buttons()
            .map(|(_, button)| button)
            .collect(),
    };

    let mut launchpad = Launchpad::new(variant, transport)?;
    launchpad.start(settings.bpm, settings.ticks_per_second, demo)?;
    let settle = Duration::from_secs_f64(3.0 / settings.ticks_per_second);

    for line in io::stdin().lock().lines() {
        let line = line?;
        match &emulator {
            Some(handle) => {
                if let Err(e) = tap(handle, variant, &line, settle) {
                    eprintln!("{e:#}");
                }
            }
            None => tracing::info!(connected = launchpad.is_connected(), "press Ctrl-D to quit"),
        }
    }

    launchpad.stop();
    Ok(())
}

fn detect_variant() -> anyhow::Result<Variant> {
    let found = discovery::detect()?;
    let (variant, port) = found
        .into_iter()
        .next()
        .context("no Launchpad found, pass --variant or --list-ports")?;
    tracing::info!(?variant, %port, "detected device");
    Ok(variant)
}

/// Handles `press x y` and `release x y` for an inner pad of the emulated device.
fn tap(handle: &EmulatorHandle, variant: Variant, line: &str, settle: Duration) -> anyhow::Result<()> {
    let mut words = line.split_whitespace();
    let Some(action) = words.next() else {
        return Ok(());
    };
    let coords: Vec<u8> = words
        .map(str::parse)
        .collect::<Result<_, _>>()
        .context("coordinates must be numbers")?;
    let &[x, y] = coords.as_slice() else {
        anyhow::bail!("expected `press x y` or `release x y`, got {line:?}");
    };
    if x >= INNER_SIZE || y >= INNER_SIZE {
        anyhow::bail!("({x}, {y}) is outside the inner area");
    }
    let tables = layout::resolve(variant)?;
    let (ox, oy) = tables.inner_offset();
    let midi = tables.midi_at(x + ox, y + oy);
    match action {
        "press" => handle.press(midi),
        "release" => handle.release(midi),
        other => anyhow::bail!("unknown action {other:?}"),
    }
    // Give the logic loop time to pick the input up and render.
    thread::sleep(settle);
    println!("{}", handle.draw());
    Ok(())
}
