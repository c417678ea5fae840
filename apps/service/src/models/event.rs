use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of transition an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Down,
    Up,
    Generic,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Down => write!(f, "down"),
            EventKind::Up => write!(f, "up"),
            EventKind::Generic => write!(f, "generic"),
        }
    }
}

/// Append-only audit record for a monitor transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub monitor_id: Uuid,
    pub project_id: String,
    pub kind: EventKind,
    pub status_code: u16,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Fields for an event about to be recorded; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub monitor_id: Uuid,
    pub project_id: String,
    pub kind: EventKind,
    pub status_code: u16,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl NewEvent {
    pub fn now(
        monitor_id: Uuid,
        project_id: impl Into<String>,
        kind: EventKind,
        status_code: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            monitor_id,
            project_id: project_id.into(),
            kind,
            status_code,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
