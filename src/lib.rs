//! Hardware abstraction for the Launchpad family of grid controllers.

pub mod configuration;
pub mod device;
pub mod extensions;
pub mod launchpad;
pub mod layout;
pub mod midi;
pub mod renderer;
pub mod scheduler;

pub use launchpad::{Launchpad, LaunchpadError, Lights, TickHandler};
pub use layout::{SystemButton, Variant};
pub use midi::registry::model::{Address, ButtonDescriptor, InputEvent, InputKind};
pub use renderer::state::{colors, LightState};
