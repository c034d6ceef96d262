use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "train_hub".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

/// Discovery and command pacing for the hub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSettings {
    /// Case-insensitive substring matched against advertised names
    #[serde(default = "default_name_pattern")]
    pub name_pattern: String,
    #[serde(default = "default_scan_timeout_ms")]
    pub scan_timeout_ms: u64,
    /// Wait after subscribing before the hub accepts commands
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Wait after every motor command
    #[serde(default = "default_write_delay_ms")]
    pub write_delay_ms: u64,
    #[serde(default = "default_speed_step")]
    pub speed_step: i32,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            name_pattern: default_name_pattern(),
            scan_timeout_ms: default_scan_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            write_delay_ms: default_write_delay_ms(),
            speed_step: default_speed_step(),
        }
    }
}

impl HubSettings {
    /// Largest step a single key press may move the speed
    pub const MAX_SPEED_STEP: i32 = 100;

    /// Bring hand-edited values back into range
    pub fn normalize(&mut self) {
        self.speed_step = self.speed_step.clamp(1, Self::MAX_SPEED_STEP);
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }
}

fn default_name_pattern() -> String {
    "HUB".to_string()
}
fn default_scan_timeout_ms() -> u64 {
    5000
}
fn default_settle_delay_ms() -> u64 {
    500
}
fn default_write_delay_ms() -> u64 {
    100
}
fn default_speed_step() -> i32 {
    10
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log_settings: LogSettings,
    #[serde(default)]
    pub hub: HubSettings,
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    /// Load settings from `path`, or from the user config directory when none is given.
    /// A missing file yields defaults; a malformed one is an error.
    pub fn new(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let settings_path = match path {
            Some(path) => path,
            None => Self::get_settings_path()?,
        };
        let mut settings = if settings_path.exists() {
            Self::load_from_file(&settings_path)?
        } else {
            Settings::default()
        };
        settings.hub.normalize();

        Ok(Self {
            settings,
            settings_path,
        })
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("TrainHubController");
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed settings file {}", path.display()))?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("train_hub_settings_{}_{}", std::process::id(), name))
            .join("settings.json")
    }

    #[test]
    fn test_defaults_match_hub_timing() {
        let hub = HubSettings::default();
        assert_eq!(hub.name_pattern, "HUB");
        assert_eq!(hub.settle_delay(), Duration::from_millis(500));
        assert_eq!(hub.write_delay(), Duration::from_millis(100));
        assert_eq!(hub.speed_step, 10);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "hub": { "name_pattern": "train" } }"#).unwrap();
        assert_eq!(settings.hub.name_pattern, "train");
        assert_eq!(settings.hub.scan_timeout_ms, 5000);
        assert_eq!(settings.log_settings.level, "info");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = temp_settings_path("missing");
        let service = SettingsService::new(Some(path.clone())).unwrap();
        assert_eq!(service.path(), path.as_path());
        assert_eq!(service.get().hub.speed_step, 10);
    }

    #[test]
    fn test_oversized_step_clamped_on_load() {
        let path = temp_settings_path("huge_step");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "hub": { "speed_step": 2147483647 } }"#).unwrap();

        let service = SettingsService::new(Some(path.clone())).unwrap();
        assert_eq!(service.get().hub.speed_step, 100);

        fs::write(&path, r#"{ "hub": { "speed_step": -5 } }"#).unwrap();
        let service = SettingsService::new(Some(path.clone())).unwrap();
        assert_eq!(service.get().hub.speed_step, 1);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = temp_settings_path("malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "hub": { "speed_step": "ten" } "#).unwrap();

        let err = SettingsService::new(Some(path.clone())).err().unwrap();
        assert!(format!("{:#}", err).contains("Malformed settings file"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_save_then_reload() {
        let path = temp_settings_path("roundtrip");
        let mut service = SettingsService::new(Some(path.clone())).unwrap();
        service.get_mut().hub.speed_step = 25;
        service.save().unwrap();

        let reloaded = SettingsService::new(Some(path.clone())).unwrap();
        assert_eq!(reloaded.get().hub.speed_step, 25);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
