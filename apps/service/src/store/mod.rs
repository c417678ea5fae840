/// Storage boundary for monitors and events.
///
/// The scheduler core only ever talks to these traits; durable backends
/// live behind them. `memory` provides the process-local implementation
/// used by the daemon and the tests.
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, Monitor, MonitorStatus, NewEvent};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Authoritative source of monitor records.
#[async_trait]
pub trait MonitorRegistry: Send + Sync {
    /// Monitors that should currently have a check job.
    async fn list_active_monitors(&self) -> Result<Vec<Monitor>, StoreError>;

    async fn get_monitor(&self, id: Uuid) -> Result<Monitor, StoreError>;

    /// Write the result of a transition back to the record.
    async fn update_monitor_status(
        &self,
        id: Uuid,
        status: MonitorStatus,
        status_code: u16,
        online: bool,
    ) -> Result<Monitor, StoreError>;
}

/// Append-only audit trail of monitor transitions.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create_event(&self, event: NewEvent) -> Result<Event, StoreError>;

    /// Cascade used when a monitor is retired; returns how many events
    /// were removed.
    async fn delete_events_for_monitor(&self, monitor_id: Uuid) -> Result<u64, StoreError>;
}
