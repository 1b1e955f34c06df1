use midir::{MidiIO, MidiOutput};

use crate::layout::{self, Variant};
use crate::midi::controller::TransportError;

/// Which port names belong to a device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortMatcher {
    name: String,
    sub_name: Option<String>,
}

impl PortMatcher {
    /// Product name and port sub-name as the variant reports them.
    pub fn for_variant(variant: Variant) -> PortMatcher {
        let def = layout::tables::definition(variant);
        PortMatcher {
            name: def.port_name.to_string(),
            sub_name: Some(def.port_sub_name.to_string()),
        }
    }

    /// Any port whose name contains `name`.
    pub fn containing(name: impl Into<String>) -> PortMatcher {
        PortMatcher {
            name: name.into(),
            sub_name: None,
        }
    }

    pub fn matches(&self, port_name: &str) -> bool {
        port_name.contains(&self.name)
            && self
                .sub_name
                .as_deref()
                .map_or(true, |sub| port_name.contains(sub))
    }

    pub fn describe(&self) -> String {
        match &self.sub_name {
            Some(sub) => format!("{} ({})", self.name, sub),
            None => self.name.clone(),
        }
    }
}

pub fn find_port<IO: MidiIO>(io: &IO, matcher: &PortMatcher) -> Option<IO::Port> {
    io.ports().into_iter().find(|p| {
        io.port_name(p)
            .ok()
            .filter(|pn| matcher.matches(pn))
            .is_some()
    })
}

/// Names of every MIDI output port currently visible.
pub fn list_ports() -> Result<Vec<String>, TransportError> {
    let midi_out = MidiOutput::new("rust-launchpad-discovery")
        .map_err(|e| TransportError::Io(Box::new(e)))?;
    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect())
}

/// Every connected device whose port name matches a known variant.
pub fn detect() -> Result<Vec<(Variant, String)>, TransportError> {
    Ok(list_ports()?
        .into_iter()
        .filter_map(|name| classify(&name).map(|variant| (variant, name)))
        .collect())
}

pub fn classify(port_name: &str) -> Option<Variant> {
    Variant::ALL
        .into_iter()
        .find(|&variant| PortMatcher::for_variant(variant).matches(port_name))
}
