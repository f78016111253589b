use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::devices::Palette;
use crate::dispatch::PlanTable;
use crate::midi::ActionTable;

/// Everything about the bridge that varies per deployment: which controller
/// layout to expect, what each action does, and which devices to look for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub classifier: ActionTable,
    pub plans: PlanTable,
    pub palette: Palette,
    pub devices: DeviceSettings,
}

/// Device names as set in the IKEA Home smart app, and the lamp's GPIO line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DeviceSettings {
    pub lamp_gpio: Option<u32>,
    pub rgb_light: Option<String>,
    pub sunset_plug: Option<String>,
    pub spotlight_plug: Option<String>,
}

/// Persisted configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub settings: Settings,
    pub created_at: String,
    pub modified_at: String,
}

/// Loads and saves [`Settings`] as JSON.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self {
            config_path,
            settings: Settings::default(),
        }
    }

    /// Load settings from the configuration file, writing the defaults there
    /// first if it does not exist yet.
    pub fn load(&mut self) -> Result<Settings, ConfigError> {
        if !self.config_path.exists() {
            log::info!(
                "No config at {}, writing defaults",
                self.config_path.display()
            );
            self.save()?;
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|source| ConfigError::Read {
                path: self.config_path.clone(),
                source,
            })?;

        let config_file: ConfigFile = serde_json::from_str(&content)?;

        if config_file.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Config file version {} doesn't match application version {}",
                config_file.version,
                env!("CARGO_PKG_VERSION")
            );
        }

        Self::validate_settings(&config_file.settings).map_err(ConfigError::Validation)?;

        self.settings = config_file.settings;
        Ok(self.settings.clone())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            if parent != Path::new("") && parent != Path::new(".") {
                fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                    path: self.config_path.clone(),
                    source,
                })?;
            }
        }

        let now = chrono::Utc::now().to_rfc3339();
        let config_file = ConfigFile {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: self.settings.clone(),
            created_at: now.clone(),
            modified_at: now,
        };

        let content = serde_json::to_string_pretty(&config_file)?;
        fs::write(&self.config_path, content).map_err(|source| ConfigError::Write {
            path: self.config_path.clone(),
            source,
        })?;

        Ok(())
    }

    pub fn update_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        Self::validate_settings(&settings).map_err(ConfigError::Validation)?;
        self.settings = settings;
        self.save()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn validate_settings(settings: &Settings) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(table_errors) = settings.classifier.validate() {
            errors.extend(table_errors);
        }
        if let Err(plan_errors) = settings.plans.validate(&settings.palette) {
            errors.extend(plan_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config validation errors: {}", .0.join(", "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::devices::{Color, DeviceSlot};
    use crate::dispatch::{Operation, PlannedOp};
    use crate::midi::{Action, ActionRule};

    #[test]
    fn test_load_writes_defaults_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("reclight.json");

        let mut manager = ConfigManager::new(config_path.clone());
        let settings = manager.load().unwrap();

        assert_eq!(settings, Settings::default());
        assert!(config_path.exists());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("reclight.json");

        let mut settings = Settings::default();
        settings.devices.rgb_light = Some("recording_light".to_string());
        settings.palette = Palette::default().with("studio", Color::rgb(1, 2, 3));
        settings.classifier = ActionTable::new(vec![ActionRule::new(60, Some(127), Action::Play)]);

        let mut manager = ConfigManager::new(config_path.clone());
        manager.update_settings(settings.clone()).unwrap();

        let mut manager2 = ConfigManager::new(config_path);
        let loaded = manager2.load().unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(manager2.settings().devices.rgb_light.as_deref(), Some("recording_light"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("reclight.json");
        fs::write(
            &config_path,
            r#"{
                "version": "0.0.1",
                "settings": { "devices": { "sunset_plug": "sunset" } },
                "created_at": "",
                "modified_at": ""
            }"#,
        )
        .unwrap();

        let loaded = ConfigManager::new(config_path).load().unwrap();
        assert_eq!(loaded.devices.sunset_plug.as_deref(), Some("sunset"));
        assert_eq!(loaded.plans, PlanTable::default());
        assert_eq!(loaded.classifier, ActionTable::default());
    }

    #[test]
    fn test_validation_rejects_unknown_colors() {
        let mut settings = Settings::default();
        settings.plans = PlanTable::empty().with(
            Action::Play,
            vec![PlannedOp::new(
                DeviceSlot::RgbLight,
                Operation::on_color("ultraviolet"),
            )],
        );
        let errors = ConfigManager::validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 1);

        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new(temp_dir.path().join("reclight.json"));
        assert!(matches!(
            manager.update_settings(settings),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("reclight.json");
        fs::write(&config_path, "{ not json").unwrap();

        assert!(matches!(
            ConfigManager::new(config_path).load(),
            Err(ConfigError::Parse(_))
        ));
    }
}
