//! Driver configuration
//!
//! Stored as TOML, by default at `~/.config/speededitor/config.toml`:
//!
//! ```toml
//! [device]
//! path = "/dev/hidraw3"
//!
//! [session]
//! initial_mode = "shuttle"
//! mode_keys_select_wheel = true
//!
//! [wheel]
//! idle_timeout_ms = 150
//! accumulator = "reset_on_mode_switch"
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use speededitor::{SessionConfig, WheelConfig};
use speededitor_transport::{PID_SPEED_EDITOR, VENDOR_ID};

/// Which device to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// hidraw path; when unset the first device with `vid`/`pid` is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub vid: u16,
    pub pid: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: None,
            vid: VENDOR_ID,
            pid: PID_SPEED_EDITOR,
        }
    }
}

/// Complete driver configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub device: DeviceConfig,
    pub session: SessionConfig,
    pub wheel: WheelConfig,
}

impl DriverConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("speededitor")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: DriverConfig = toml::from_str(&content)?;
            config.wheel.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speededitor::{AccumulatorPolicy, WheelMode};

    #[test]
    fn test_default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.device.vid, 0x1edb);
        assert_eq!(config.device.pid, 0xda0e);
        assert_eq!(config.device.path, None);
        assert_eq!(config.session.initial_mode, WheelMode::Jog);
        assert_eq!(config.wheel.idle_timeout_ms, 100);
    }

    #[test]
    fn test_partial_file() {
        let config: DriverConfig = toml::from_str(
            r#"
            [session]
            initial_mode = "scroll"

            [wheel]
            noise_threshold = 50
            accumulator = "reset_on_mode_switch"
            "#,
        )
        .unwrap();

        assert_eq!(config.session.initial_mode, WheelMode::Scroll);
        assert!(config.session.mode_keys_select_wheel);
        assert_eq!(config.wheel.noise_threshold, 50);
        assert_eq!(config.wheel.accumulator, AccumulatorPolicy::ResetOnModeSwitch);
        assert_eq!(config.wheel.jog_max, 100.0);
        assert_eq!(config.device, DeviceConfig::default());
    }

    #[test]
    fn test_roundtrip() {
        let mut config = DriverConfig::default();
        config.device.path = Some("/dev/hidraw7".into());
        config.wheel.emit_interval_ms = 20;

        let toml_str = config.to_toml().unwrap();
        assert!(toml_str.contains("[wheel]"));
        assert!(toml_str.contains("initial_mode = \"jog\""));
        let parsed: DriverConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result: Result<DriverConfig, _> = toml::from_str("[session]\ninitial_mode = \"spin\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_wheel_rejected_on_load() {
        let dir = std::env::temp_dir().join(format!("speededitor-test-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let inverted = dir.join("inverted.toml");
        std::fs::write(&inverted, "[wheel]\njog_min = 100.0\njog_max = 0.0\n").unwrap();
        let err = DriverConfig::load(&inverted).unwrap_err();
        assert!(err.to_string().contains("jog_min"), "{err}");

        let nan = dir.join("nan.toml");
        std::fs::write(&nan, "[wheel]\njog_max = nan\n").unwrap();
        assert!(DriverConfig::load(&nan).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_gives_default() {
        let path = std::env::temp_dir().join("speededitor-test-missing/config.toml");
        let config = DriverConfig::load(&path).unwrap();
        assert_eq!(config, DriverConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("speededitor-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        let mut config = DriverConfig::default();
        config.session.initial_mode = WheelMode::Shuttle;

        config.save(&path).unwrap();
        assert_eq!(DriverConfig::load(&path).unwrap(), config);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
