pub mod color;
pub mod device_set;
pub mod traits;

pub use color::{Color, Palette};
pub use device_set::{DeviceSet, DeviceSlot};
pub use traits::{Device, DeviceError, HEALTH_CHECK_HOLD};
