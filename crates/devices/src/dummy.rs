use async_trait::async_trait;
use reclight_core::{Color, Device, DeviceError};

/// Stands in for the GPIO lamp away from the Raspberry Pi. Only logs.
pub struct DummyLamp {
    name: String,
}

impl DummyLamp {
    pub fn new() -> Self {
        log::info!("Dummy lamp in use");
        Self {
            name: "dummy lamp".to_string(),
        }
    }
}

impl Default for DummyLamp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Device for DummyLamp {
    fn name(&self) -> &str {
        &self.name
    }

    async fn turn_on(&self, color: Option<Color>) -> Result<(), DeviceError> {
        match color {
            Some(color) => log::info!("Dummy: turning on ({})", color),
            None => log::info!("Dummy: turning on"),
        }
        Ok(())
    }

    async fn turn_off(&self) -> Result<(), DeviceError> {
        log::info!("Dummy: turning off");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_never_fails() {
        let lamp = DummyLamp::new();
        lamp.turn_on(Some(Color::rgb(255, 0, 0))).await.unwrap();
        lamp.turn_off().await.unwrap();
        lamp.health_check().await.unwrap();
    }
}
