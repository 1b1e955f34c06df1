use std::path::Path;

use serde::Deserialize;

use crate::layout::Variant;
use crate::midi::controller::discovery::PortMatcher;
use crate::midi::model::DataByte;
use crate::renderer::state::colors;

// YAML specific configuration

#[derive(Debug, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            bpm: default_bpm(),
            ticks_per_second: default_ticks_per_second(),
        }
    }
}

fn default_bpm() -> f64 {
    120.0
}

fn default_ticks_per_second() -> f64 {
    60.0
}

#[derive(Debug, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_pressed")]
    pub pressed: DataByte,
    #[serde(default = "default_system")]
    pub system: DataByte,
}

impl Default for ColorConfig {
    fn default() -> Self {
        ColorConfig {
            pressed: default_pressed(),
            system: default_system(),
        }
    }
}

fn default_pressed() -> DataByte {
    DataByte::masked(colors::GREEN)
}

fn default_system() -> DataByte {
    DataByte::masked(colors::ORANGE)
}

#[derive(Debug, Default, Deserialize)]
pub struct LaunchpadConfig {
    pub variant: Option<Variant>,
    /// Substring of the MIDI port name. Defaults to the variant's own port name.
    pub port: Option<String>,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub colors: ColorConfig,
}

// Parsed part - from configuration to application specific

#[derive(Debug)]
pub struct Settings {
    pub variant: Variant,
    pub port: PortMatcher,
    pub bpm: f64,
    pub ticks_per_second: f64,
    pub pressed_color: u8,
    pub system_color: u8,
}

/// Completes `config` with the variant chosen elsewhere (command line or port detection).
pub fn parse(config: LaunchpadConfig, variant: Variant) -> Settings {
    Settings {
        variant,
        port: config
            .port
            .map_or_else(|| PortMatcher::for_variant(variant), PortMatcher::containing),
        bpm: config.timing.bpm,
        ticks_per_second: config.timing.ticks_per_second,
        pressed_color: config.colors.pressed.as_u8(),
        system_color: config.colors.system.as_u8(),
    }
}

pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> anyhow::Result<LaunchpadConfig> {
    let conf_file = std::fs::File::open(path)?;
    let yaml_value: serde_yaml::Value = serde_yaml::from_reader(conf_file)?;
    from_value(yaml_value)
}

pub fn load_from_str(yaml: &str) -> anyhow::Result<LaunchpadConfig> {
    from_value(serde_yaml::from_str(yaml)?)
}

fn from_value(mut yaml_value: serde_yaml::Value) -> anyhow::Result<LaunchpadConfig> {
    // Workaround for merge anchors.
    // https://github.com/dtolnay/serde-yaml/issues/317
    yaml_value.apply_merge()?;
    Ok(serde_yaml::from_value(yaml_value)?)
}
