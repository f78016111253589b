pub mod dirigera;
pub mod dummy;
pub mod gpio;

pub use dirigera::{DirigeraLight, DirigeraPlug, Hub, HubConfig, HubError};
pub use dummy::DummyLamp;
pub use gpio::{GpioError, GpioLamp};
