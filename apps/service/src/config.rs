use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Monitor, MonitorStatus, Recipient};
use crate::monitoring::SchedulerSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write config: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no config path available")]
    PathUnavailable,

    #[error("invalid monitor url `{url}`: {source}")]
    InvalidUrl { url: String, source: url::ParseError },
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub monitors: Vec<MonitorSeed>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub probe_interval_seconds: u64,
    pub resync_interval_seconds: u64,
    pub resync_settle_seconds: u64,
    pub probe_timeout_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            probe_interval_seconds: 60,
            resync_interval_seconds: 600,
            resync_settle_seconds: 15,
            probe_timeout_seconds: 10,
        }
    }
}

impl SchedulerConfig {
    pub fn settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            probe_interval: std::time::Duration::from_secs(self.probe_interval_seconds),
            resync_interval: std::time::Duration::from_secs(self.resync_interval_seconds),
            settle_delay: std::time::Duration::from_secs(self.resync_settle_seconds),
            probe_timeout: std::time::Duration::from_secs(self.probe_timeout_seconds),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Endpoint notifications are POSTed to; log-only when unset.
    pub endpoint: Option<String>,
}

/// Monitor definition as written in the config file. Runtime fields
/// (status, current code, last checked) are filled in at load time.
#[derive(Debug, Serialize, Deserialize)]
pub struct MonitorSeed {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_expected_status")]
    pub expected_status_code: u16,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub interval_seconds: Option<u64>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

fn default_expected_status() -> u16 {
    200
}

fn default_active() -> bool {
    true
}

impl MonitorSeed {
    fn into_monitor(self) -> Monitor {
        Monitor {
            id: Uuid::new_v4(),
            project_id: self.project_id,
            title: self.title,
            url: self.url,
            expected_status_code: self.expected_status_code,
            current_status_code: None,
            status: MonitorStatus::Unknown,
            online: false,
            active: self.active,
            interval_seconds: self.interval_seconds,
            timeout_seconds: self.timeout_seconds,
            retries: self.retries,
            recipients: self.recipients,
            last_checked: None,
        }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/sitewatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::PathUnavailable);
    };

    Ok(path.join("sitewatch/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current Internal Configuration State:")?;
        writeln!(f, "  Scheduler")?;
        writeln!(f, "    Probe Interval: {}s", self.scheduler.probe_interval_seconds)?;
        writeln!(f, "    Resync Interval: {}s", self.scheduler.resync_interval_seconds)?;
        writeln!(f, "    Resync Settle Delay: {}s", self.scheduler.resync_settle_seconds)?;
        writeln!(f, "    Probe Timeout: {}s", self.scheduler.probe_timeout_seconds)?;
        writeln!(f, "  Notify")?;
        writeln!(
            f,
            "    Endpoint: {}",
            self.notify.endpoint.as_deref().unwrap_or("(log only)")
        )?;
        writeln!(f, "  Monitors: {}", self.monitors.len())?;
        for monitor in &self.monitors {
            writeln!(f, "    {} -> {}", monitor.title, monitor.url)?;
        }

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/sitewatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        let config: Config = if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(ConfigError::Read)?;
            toml::from_str(raw_string.as_str())?
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::Write)?;
        }

        fs::write(path, config_str).map_err(ConfigError::Write)
    }

    /// Every seeded monitor must carry a parseable URL.
    fn validate(&self) -> Result<(), ConfigError> {
        for monitor in &self.monitors {
            url::Url::parse(&monitor.url).map_err(|source| ConfigError::InvalidUrl {
                url: monitor.url.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Turn the seed list into registry-ready monitor records.
    pub fn seed_monitors(self) -> Vec<Monitor> {
        self.monitors.into_iter().map(MonitorSeed::into_monitor).collect()
    }
}
