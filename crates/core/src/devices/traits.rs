use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::color::Color;

/// How long the default health check leaves the device on.
pub const HEALTH_CHECK_HOLD: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum DeviceError {
    /// Missing or invalid configuration. The device stays absent.
    #[error("configuration error: {0}")]
    Config(String),
    #[error("device '{0}' not found")]
    NotFound(String),
    #[error("{device}: {reason}")]
    Command { device: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DeviceError {
    pub fn command(device: impl Into<String>, reason: impl ToString) -> Self {
        DeviceError::Command {
            device: device.into(),
            reason: reason.to_string(),
        }
    }
}

/// What every indicator device can do.
///
/// Implementations own their timeouts; the dispatcher never cancels a call.
#[async_trait]
pub trait Device: Send + Sync {
    /// Human readable name used in logs.
    fn name(&self) -> &str;

    /// Switch on. Devices without color support ignore `color`.
    async fn turn_on(&self, color: Option<Color>) -> Result<(), DeviceError>;

    async fn turn_off(&self) -> Result<(), DeviceError>;

    /// Visible self-test ending in a known state.
    async fn health_check(&self) -> Result<(), DeviceError> {
        self.turn_off().await?;
        self.turn_on(None).await?;
        tokio::time::sleep(HEALTH_CHECK_HOLD).await;
        self.turn_off().await?;
        log::info!("{} ready", self.name());
        Ok(())
    }
}
