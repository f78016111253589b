use std::time::Duration;

use async_trait::async_trait;
use reclight_core::{Color, Device, DeviceError};
use serde_json::{json, Value};

use super::hub::{select, Hub, HubDevice};

const KIND: &str = "light";
const HEALTH_OK: Color = Color::rgb(0x47, 0xff, 0x88);
const HEALTH_IDLE: Color = Color::rgb(0xff, 0x75, 0x8f);
const HEALTH_CHECK_HOLD: Duration = Duration::from_secs(2);

/// A color-capable light paired with the hub, found by the name it was given
/// in the IKEA Home smart app.
pub struct DirigeraLight {
    hub: Hub,
    id: String,
    name: String,
}

impl DirigeraLight {
    /// Pick the light out of a device list fetched from `hub`.
    pub fn find(hub: &Hub, devices: &[HubDevice], name: &str) -> Result<Self, DeviceError> {
        let device = select(devices, KIND, name)?;
        log::info!("Dirigera light '{}' found ({})", name, device.id);
        Ok(Self {
            hub: hub.clone(),
            id: device.id,
            name: name.to_string(),
        })
    }

    async fn set(&self, attributes: Value) -> Result<(), DeviceError> {
        self.hub
            .patch(&self.id, attributes)
            .await
            .map_err(|e| DeviceError::command(&self.name, e))
    }
}

fn power(on: bool) -> Value {
    json!({ "isOn": on })
}

/// Hue in degrees and saturation as a 0-1 fraction.
fn color_attributes(color: Color) -> Value {
    let (hue, saturation, _) = color.to_hsv();
    json!({
        "colorHue": hue,
        "colorSaturation": f64::from(saturation) / 100.0,
    })
}

/// Brightness follows the color's value. The hub rejects a level of 0.
fn level_attributes(color: Color) -> Value {
    let (_, _, value) = color.to_hsv();
    json!({ "lightLevel": value.clamp(1, 100) })
}

#[async_trait]
impl Device for DirigeraLight {
    fn name(&self) -> &str {
        &self.name
    }

    async fn turn_on(&self, color: Option<Color>) -> Result<(), DeviceError> {
        // The light ignores color changes while it is off
        self.set(power(true)).await?;
        if let Some(color) = color {
            self.set(color_attributes(color)).await?;
            self.set(level_attributes(color)).await?;
        }
        Ok(())
    }

    async fn turn_off(&self) -> Result<(), DeviceError> {
        self.set(power(false)).await
    }

    async fn health_check(&self) -> Result<(), DeviceError> {
        log::info!("Performing health check for Dirigera light {}", self.name);
        self.turn_on(Some(HEALTH_OK)).await?;
        tokio::time::sleep(HEALTH_CHECK_HOLD).await;
        self.turn_on(Some(HEALTH_IDLE)).await?;
        log::info!("Dirigera light {} ready", self.name);
        Ok(())
    }
}
