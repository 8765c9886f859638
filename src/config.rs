use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// When set, tracing output is also written to daily-rolling files in this
    /// directory.
    #[serde(default)]
    pub log_directory: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Discord webhook receiving the hourly chart pair. Left unset, the hourly
    /// gate still fires but delivery is skipped with a warning.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_data_dir")]
    pub data_directory: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_idle_threshold_secs")]
    pub idle_threshold_seconds: u64,
}

fn default_service_name() -> String {
    "banwatch".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_url() -> String {
    "https://api.plancke.io/hypixel/v1/punishmentStats".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_data_dir() -> String {
    ".".to_string()
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_idle_threshold_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_level: default_log_level(),
            log_directory: None,
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            webhook_url: None,
            data_directory: default_data_dir(),
            poll_interval_seconds: default_poll_interval_secs(),
            idle_threshold_seconds: default_idle_threshold_secs(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> &'static str {
        "config/banwatch.toml"
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let raw = fs::read_to_string(path_ref)
            .with_context(|| format!("failed to read configuration from {}", path_ref.display()))?;
        let mut config: Self = toml::from_str(&raw).with_context(|| {
            format!("failed to parse configuration from {}", path_ref.display())
        })?;
        if config.service_name.trim().is_empty() {
            config.service_name = default_service_name();
        }
        if config.poll_interval_seconds == 0 {
            config.poll_interval_seconds = default_poll_interval_secs();
        }
        Ok(config)
    }
}
