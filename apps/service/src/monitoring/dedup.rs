use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// Tracks which monitors already have an outstanding alert.
///
/// An entry spans one failure streak: set on the first failing probe,
/// cleared on recovery or when the monitor's check job is rebuilt.
/// Operations for one monitor never interleave in steady state (a monitor
/// has at most one in-flight probe), but entries for different monitors
/// are touched concurrently, so the map sits behind a mutex.
#[derive(Clone, Default)]
pub struct DedupTracker {
    outstanding: Arc<Mutex<HashMap<Uuid, String>>>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_outstanding(&self, id: Uuid) -> bool {
        self.outstanding.lock().unwrap().contains_key(&id)
    }

    pub fn mark_outstanding(&self, id: Uuid, title: &str) {
        self.outstanding.lock().unwrap().insert(id, title.to_string());
    }

    pub fn clear(&self, id: Uuid) {
        self.outstanding.lock().unwrap().remove(&id);
    }

    #[cfg(test)]
    pub fn outstanding_count(&self) -> usize {
        self.outstanding.lock().unwrap().len()
    }
}
