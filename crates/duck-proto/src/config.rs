use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub log_tail: LogTailConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Base URL of the device control service, e.g. `http://duck.local:3000`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Poll periods in milliseconds, one per cadence group.
///
/// The groups mirror how often each kind of data actually changes on the
/// device: sleep state flips within a second, sensors every few seconds,
/// lists and memory every ten, backups rarely, settings almost never.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_sleep_ms")]
    pub sleep_ms: u64,
    #[serde(default = "default_sensors_ms")]
    pub sensors_ms: u64,
    #[serde(default = "default_lists_ms")]
    pub lists_ms: u64,
    #[serde(default = "default_backups_ms")]
    pub backups_ms: u64,
    #[serde(default = "default_settings_ms")]
    pub settings_ms: u64,
    /// Delay before the confirmation re-poll that follows a successful action.
    #[serde(default = "default_confirm_delay_ms")]
    pub confirm_delay_ms: u64,
    /// A fresh snapshot older than this is shown as stale.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogTailConfig {
    #[serde(default = "default_log_period_ms")]
    pub period_ms: u64,
    /// How many journal lines to request per fetch.
    #[serde(default = "default_log_lines")]
    pub lines: u32,
    /// Rows from the bottom edge that still count as "at bottom".
    #[serde(default = "default_bottom_threshold")]
    pub bottom_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_success_ms")]
    pub success_indicator_ms: u64,
    #[serde(default = "default_error_ms")]
    pub error_indicator_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            sleep_ms: default_sleep_ms(),
            sensors_ms: default_sensors_ms(),
            lists_ms: default_lists_ms(),
            backups_ms: default_backups_ms(),
            settings_ms: default_settings_ms(),
            confirm_delay_ms: default_confirm_delay_ms(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl Default for LogTailConfig {
    fn default() -> Self {
        Self {
            period_ms: default_log_period_ms(),
            lines: default_log_lines(),
            bottom_threshold: default_bottom_threshold(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            success_indicator_ms: default_success_ms(),
            error_indicator_ms: default_error_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_sleep_ms() -> u64 {
    1_000
}

fn default_sensors_ms() -> u64 {
    5_000
}

fn default_lists_ms() -> u64 {
    10_000
}

fn default_backups_ms() -> u64 {
    30_000
}

fn default_settings_ms() -> u64 {
    60_000
}

fn default_confirm_delay_ms() -> u64 {
    1_000
}

fn default_stale_after_secs() -> u64 {
    60
}

fn default_log_period_ms() -> u64 {
    2_000
}

fn default_log_lines() -> u32 {
    50
}

fn default_bottom_threshold() -> usize {
    1
}

fn default_success_ms() -> u64 {
    2_000
}

fn default_error_ms() -> u64 {
    6_000
}

fn default_tick_ms() -> u64 {
    100
}

impl PollingConfig {
    pub fn confirm_delay(&self) -> Duration {
        Duration::from_millis(self.confirm_delay_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        if let Some(url) = platform::device_url_override() {
            config.device.base_url = url;
        }
        Ok(config)
    }

    /// Load from `path`, writing a default file there first if none exists.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("wrote default config to {}", path.display());
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            polling: PollingConfig::default(),
            log_tail: LogTailConfig::default(),
            ui: UiConfig::default(),
        }
    }
}
