//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use sensordash_core::email::EmailConfig;
use sensordash_core::store::DEFAULT_TIMEOUT;
use sensordash_core::table::{PAGE_SIZES, nearest_page_size};
use sensordash_core::view::DEFAULT_CHART_POINTS;
use sensordash_core::worker::DEFAULT_POLL_INTERVAL;
use sensordash_core::{ThresholdConfig, VoiceConfig};

use crate::cli::StoreArgs;

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote store connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Polling schedule
    #[serde(default)]
    pub polling: PollingConfig,

    /// Alert thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Which alert channels are enabled
    #[serde(default)]
    pub alerts: AlertsConfig,

    /// EmailJS account used by the email channel
    #[serde(default)]
    pub email: EmailConfig,

    /// External speech recognizer
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Interactive dashboard settings
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Remote store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database URL.
    pub url: Option<String>,
    /// Auth token or database secret.
    pub auth: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            auth: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Polling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds between fetches.
    pub interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Per-channel switches. All channels are enabled by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub notice: bool,
    pub desktop: bool,
    pub audio: bool,
    pub email: bool,
    pub alert_log: bool,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            notice: true,
            desktop: true,
            audio: true,
            email: true,
            alert_log: true,
        }
    }
}

/// Dashboard settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Number of readings plotted.
    pub chart_points: usize,
    /// Initial table page size, snapped to one of 10, 15, 20 or 30.
    #[serde(deserialize_with = "offered_page_size")]
    pub page_size: usize,
    /// Directory CSV exports are written to. Defaults to the working directory.
    pub export_directory: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            chart_points: DEFAULT_CHART_POINTS,
            page_size: PAGE_SIZES[0],
            export_directory: None,
        }
    }
}

fn offered_page_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    usize::deserialize(deserializer).map(nearest_page_size)
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sensordash")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Apply command-line and environment overrides.
    pub fn with_store_args(mut self, args: &StoreArgs) -> Self {
        if let Some(url) = &args.url {
            self.store.url = Some(url.clone());
        }
        if let Some(auth) = &args.auth {
            self.store.auth = Some(auth.clone());
        }
        self
    }
}

/// Resolve the config file path from `--config` or the default location.
pub fn config_path(explicit: Option<&PathBuf>) -> PathBuf {
    explicit.cloned().unwrap_or_else(Config::path)
}

/// Directory for log files and other runtime data.
#[cfg(feature = "tui")]
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sensordash")
}
