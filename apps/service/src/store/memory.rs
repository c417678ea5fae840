use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{EventStore, MonitorRegistry, StoreError};
use crate::models::{Event, Monitor, MonitorStatus, NewEvent};

/// In-memory monitor registry.
#[derive(Default)]
pub struct MemoryRegistry {
    monitors: Mutex<HashMap<Uuid, Monitor>>,
}

impl MemoryRegistry {
    pub fn new(monitors: impl IntoIterator<Item = Monitor>) -> Self {
        Self {
            monitors: Mutex::new(
                monitors.into_iter().map(|monitor| (monitor.id, monitor)).collect(),
            ),
        }
    }

    pub fn remove(&self, id: Uuid) -> Option<Monitor> {
        self.monitors.lock().unwrap().remove(&id)
    }
}

#[async_trait]
impl MonitorRegistry for MemoryRegistry {
    async fn list_active_monitors(&self) -> Result<Vec<Monitor>, StoreError> {
        let monitors = self.monitors.lock().unwrap();
        Ok(monitors.values().filter(|monitor| monitor.active).cloned().collect())
    }

    async fn get_monitor(&self, id: Uuid) -> Result<Monitor, StoreError> {
        let monitors = self.monitors.lock().unwrap();
        monitors.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update_monitor_status(
        &self,
        id: Uuid,
        status: MonitorStatus,
        status_code: u16,
        online: bool,
    ) -> Result<Monitor, StoreError> {
        let mut monitors = self.monitors.lock().unwrap();
        let monitor = monitors.get_mut(&id).ok_or(StoreError::NotFound)?;
        monitor.status = status;
        monitor.current_status_code = Some(status_code);
        monitor.online = online;
        monitor.last_checked = Some(Utc::now());
        Ok(monitor.clone())
    }
}

/// In-memory append-only event store.
#[derive(Default)]
pub struct MemoryEventStore {
    events: Mutex<Vec<Event>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events_for(&self, monitor_id: Uuid) -> Vec<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.monitor_id == monitor_id)
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn create_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        let event = Event {
            id: Uuid::new_v4(),
            monitor_id: event.monitor_id,
            project_id: event.project_id,
            kind: event.kind,
            status_code: event.status_code,
            message: event.message,
            timestamp: event.timestamp,
        };
        self.events.lock().unwrap().push(event.clone());
        Ok(event)
    }

    async fn delete_events_for_monitor(&self, monitor_id: Uuid) -> Result<u64, StoreError> {
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|event| event.monitor_id != monitor_id);
        Ok((before - events.len()) as u64)
    }
}
