//! IKEA Dirigera hub and the devices paired with it.

pub mod hub;
pub mod light;
pub mod plug;

pub use hub::{Hub, HubConfig, HubError};
pub use light::DirigeraLight;
pub use plug::DirigeraPlug;
