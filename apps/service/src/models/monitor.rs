use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted status of a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    Online,
    Offline,
    Unknown,
}

impl std::fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorStatus::Online => write!(f, "online"),
            MonitorStatus::Offline => write!(f, "offline"),
            MonitorStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Someone to contact when a monitor changes state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// One target checked on a recurring schedule.
///
/// The registry owns the authoritative record; the scheduler only works
/// on per-cycle snapshots of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    pub id: Uuid,
    pub project_id: String,
    pub title: String,
    pub url: String,
    pub expected_status_code: u16,
    #[serde(default)]
    pub current_status_code: Option<u16>,
    pub status: MonitorStatus,
    pub online: bool,
    pub active: bool,
    /// Probe cadence override; the scheduler default applies when unset.
    #[serde(default)]
    pub interval_seconds: Option<u64>,
    /// Probe timeout override; the scheduler default applies when unset.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
}

impl Monitor {
    /// Email addresses of recipients that have notifications enabled.
    pub fn enabled_recipients(&self) -> Vec<String> {
        self.recipients
            .iter()
            .filter(|recipient| recipient.enabled)
            .map(|recipient| recipient.email.clone())
            .collect()
    }
}
