use std::time::Duration;

use async_trait::async_trait;
use reclight_core::{Color, Device, DeviceError};
use serde_json::{json, Value};

use super::hub::{select, Hub, HubDevice};

const KIND: &str = "outlet";
const HEALTH_CHECK_HOLD: Duration = Duration::from_millis(200);

fn power(on: bool) -> Value {
    json!({ "isOn": on })
}

fn start_off() -> Value {
    json!({ "startupOnOff": "startOff" })
}

/// A smart outlet switching whatever is plugged into it.
pub struct DirigeraPlug {
    hub: Hub,
    id: String,
    name: String,
}

impl DirigeraPlug {
    /// Pick the outlet out of a device list fetched from `hub` and make it
    /// come back off after a power cut.
    pub async fn find(
        hub: &Hub,
        devices: &[HubDevice],
        name: &str,
    ) -> Result<Self, DeviceError> {
        let device = select(devices, KIND, name)?;
        let plug = Self {
            hub: hub.clone(),
            id: device.id,
            name: name.to_string(),
        };
        plug.set(start_off()).await?;
        log::info!("Dirigera plug '{}' found", name);
        Ok(plug)
    }

    async fn set(&self, attributes: Value) -> Result<(), DeviceError> {
        self.hub
            .patch(&self.id, attributes)
            .await
            .map_err(|e| DeviceError::command(&self.name, e))
    }
}

#[async_trait]
impl Device for DirigeraPlug {
    fn name(&self) -> &str {
        &self.name
    }

    async fn turn_on(&self, _color: Option<Color>) -> Result<(), DeviceError> {
        log::info!("Turning on plug {}", self.name);
        self.set(power(true)).await
    }

    async fn turn_off(&self) -> Result<(), DeviceError> {
        log::info!("Turning off plug {}", self.name);
        self.set(power(false)).await
    }

    async fn health_check(&self) -> Result<(), DeviceError> {
        self.turn_on(None).await?;
        tokio::time::sleep(HEALTH_CHECK_HOLD).await;
        self.turn_off().await?;
        log::info!("Plug {} OK", self.name);
        Ok(())
    }
}
