use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::traits::{Device, DeviceError};

/// Named positions a device can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSlot {
    /// GPIO recording lamp
    Lamp,
    RgbLight,
    SunsetPlug,
    SpotlightPlug,
}

impl DeviceSlot {
    pub const ALL: [DeviceSlot; 4] = [
        DeviceSlot::Lamp,
        DeviceSlot::RgbLight,
        DeviceSlot::SunsetPlug,
        DeviceSlot::SpotlightPlug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceSlot::Lamp => "lamp",
            DeviceSlot::RgbLight => "rgb_light",
            DeviceSlot::SunsetPlug => "sunset_plug",
            DeviceSlot::SpotlightPlug => "spotlight_plug",
        }
    }
}

impl fmt::Display for DeviceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The devices available to this process. Built once at startup and then
/// shared read-only; an empty slot means the feature is disabled.
#[derive(Clone, Default)]
pub struct DeviceSet {
    devices: HashMap<DeviceSlot, Arc<dyn Device>>,
}

impl DeviceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: DeviceSlot, device: Arc<dyn Device>) -> Self {
        self.insert(slot, device);
        self
    }

    pub fn insert(&mut self, slot: DeviceSlot, device: Arc<dyn Device>) {
        log::info!("{} bound to {}", slot, device.name());
        self.devices.insert(slot, device);
    }

    /// Bind the outcome of constructing a device. A failed construction leaves
    /// the slot empty and is reported once here.
    pub fn bind(&mut self, slot: DeviceSlot, device: Result<Arc<dyn Device>, DeviceError>) -> bool {
        match device {
            Ok(device) => {
                self.insert(slot, device);
                true
            }
            Err(e) => {
                log::warn!("{} unavailable, continuing without it: {}", slot, e);
                false
            }
        }
    }

    pub fn get(&self, slot: DeviceSlot) -> Option<&Arc<dyn Device>> {
        self.devices.get(&slot)
    }

    /// Present devices in slot order.
    pub fn present(&self) -> impl Iterator<Item = (DeviceSlot, &Arc<dyn Device>)> {
        DeviceSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.devices.get(&slot).map(|device| (slot, device)))
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl fmt::Debug for DeviceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.present().map(|(slot, device)| (slot, device.name())))
            .finish()
    }
}
