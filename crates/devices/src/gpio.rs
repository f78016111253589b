//! Lamp wired to a Raspberry Pi GPIO line, driven through the sysfs interface.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use reclight_core::{Color, Device, DeviceError};
use thiserror::Error;

pub const SYSFS_GPIO: &str = "/sys/class/gpio";

// udev may take a moment to hand the freshly exported line over
const EXPORT_POLL: Duration = Duration::from_millis(50);
const EXPORT_ATTEMPTS: u32 = 10;

#[derive(Debug, Error)]
pub enum GpioError {
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("gpio{0} did not appear after export")]
    NotExported(u32),
}

impl From<GpioError> for DeviceError {
    fn from(e: GpioError) -> Self {
        DeviceError::command("gpio lamp", e)
    }
}

fn write(path: &Path, value: &str) -> Result<(), GpioError> {
    fs::write(path, value).map_err(|source| GpioError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub struct GpioLamp {
    name: String,
    pin: u32,
    value_path: PathBuf,
}

impl GpioLamp {
    pub fn open(pin: u32) -> Result<Self, GpioError> {
        Self::open_at(Path::new(SYSFS_GPIO), pin)
    }

    /// Export `pin` below `base` if needed and configure it as an output.
    pub fn open_at(base: &Path, pin: u32) -> Result<Self, GpioError> {
        let line = base.join(format!("gpio{}", pin));

        if !line.exists() {
            write(&base.join("export"), &pin.to_string())?;
        }

        let direction = line.join("direction");
        let mut attempts = 0;
        while !direction.exists() {
            attempts += 1;
            if attempts >= EXPORT_ATTEMPTS {
                return Err(GpioError::NotExported(pin));
            }
            thread::sleep(EXPORT_POLL);
        }
        write(&direction, "out")?;

        log::info!("Set gpio{} as output", pin);
        Ok(Self {
            name: format!("lamp (gpio{})", pin),
            pin,
            value_path: line.join("value"),
        })
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    async fn set(&self, high: bool) -> Result<(), DeviceError> {
        let level = if high { "1" } else { "0" };
        tokio::fs::write(&self.value_path, level)
            .await
            .map_err(|source| GpioError::Write {
                path: self.value_path.clone(),
                source,
            })?;
        log::debug!("gpio{} = {}", self.pin, level);
        Ok(())
    }
}

#[async_trait]
impl Device for GpioLamp {
    fn name(&self) -> &str {
        &self.name
    }

    async fn turn_on(&self, _color: Option<Color>) -> Result<(), DeviceError> {
        self.set(true).await
    }

    async fn turn_off(&self) -> Result<(), DeviceError> {
        self.set(false).await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn fake_sysfs(pin: u32) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(format!("gpio{}", pin))).unwrap();
        fs::write(dir.path().join(format!("gpio{}/direction", pin)), "in").unwrap();
        dir
    }

    fn read(dir: &TempDir, file: &str) -> String {
        fs::read_to_string(dir.path().join(file)).unwrap()
    }

    #[tokio::test]
    async fn test_on_off_writes_value() {
        let sysfs = fake_sysfs(23);
        let lamp = GpioLamp::open_at(sysfs.path(), 23).unwrap();

        assert_eq!(read(&sysfs, "gpio23/direction"), "out");
        assert_eq!(lamp.name(), "lamp (gpio23)");

        lamp.turn_on(None).await.unwrap();
        assert_eq!(read(&sysfs, "gpio23/value"), "1");
        lamp.turn_off().await.unwrap();
        assert_eq!(read(&sysfs, "gpio23/value"), "0");
    }

    #[test]
    fn test_already_exported_line_is_not_exported_again() {
        let sysfs = fake_sysfs(4);
        GpioLamp::open_at(sysfs.path(), 4).unwrap();
        assert!(!sysfs.path().join("export").exists());
    }

    #[test]
    fn test_export_that_never_appears() {
        let sysfs = TempDir::new().unwrap();
        let result = GpioLamp::open_at(sysfs.path(), 17);

        assert_eq!(read(&sysfs, "export"), "17");
        assert!(matches!(result, Err(GpioError::NotExported(17))));
    }

    #[tokio::test]
    async fn test_write_failure_is_a_device_error() {
        let sysfs = fake_sysfs(5);
        let lamp = GpioLamp::open_at(sysfs.path(), 5).unwrap();
        fs::remove_dir_all(sysfs.path().join("gpio5")).unwrap();

        assert!(matches!(
            lamp.turn_on(None).await,
            Err(DeviceError::Command { .. })
        ));
    }
}
