pub mod controller;
pub mod model;
pub mod registry;
pub mod sysex;
