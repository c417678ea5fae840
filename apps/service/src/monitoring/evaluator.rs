use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::dedup::DedupTracker;
use super::prober::ProbeOutcome;
use crate::models::{Event, EventKind, Monitor, MonitorStatus, NewEvent};
use crate::notify::{self, Notifier};
use crate::store::{EventStore, MonitorRegistry, StoreError};

/// Externally reported state change for a monitor, e.g. from an agent
/// posting to the API boundary. `stable: true` means the target is healthy
/// again; `stable: false` reports it down.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertRequest {
    pub monitor_id: Uuid,
    pub status_code: u16,
    pub stable: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Turns probe outcomes into monitor transitions.
///
/// Each transition writes the monitor status, appends an audit event, and
/// requests a notification. Notifications are best-effort: a channel
/// failure is logged and never rolls back the state or event write.
pub struct StateEvaluator {
    registry: Arc<dyn MonitorRegistry>,
    events: Arc<dyn EventStore>,
    notifier: Arc<dyn Notifier>,
    dedup: DedupTracker,
}

impl StateEvaluator {
    pub fn new(
        registry: Arc<dyn MonitorRegistry>,
        events: Arc<dyn EventStore>,
        notifier: Arc<dyn Notifier>,
        dedup: DedupTracker,
    ) -> Self {
        Self { registry, events, notifier, dedup }
    }

    /// Feed one probe outcome through the state machine.
    ///
    /// `monitor` is the check job's snapshot; the down/up handlers re-fetch
    /// the authoritative record before mutating it.
    pub async fn evaluate(
        &self,
        monitor: &Monitor,
        outcome: ProbeOutcome,
    ) -> Result<(), StoreError> {
        match outcome {
            ProbeOutcome::TransportFailure(reason) => {
                // Always surfaced, never deduplicated, and never counted as
                // an offline transition: the target may be fine while the
                // probe path is not.
                error!("Error retrieving {}: {reason}", monitor.title);
                let subject = format!("{} could not be reached", monitor.title);
                let body =
                    format!("Probe for {} ({}) failed: {reason}", monitor.title, monitor.url);
                self.send_logged(&monitor.enabled_recipients(), &subject, &body).await;
                Ok(())
            }
            ProbeOutcome::Status(code) if code != monitor.expected_status_code => {
                let message = issue_message(monitor, code);
                if self.dedup.has_outstanding(monitor.id) {
                    debug!("Already sent alert for {}.", monitor.title);
                    return Ok(());
                }
                error!("{message}");
                self.handle_monitor_down(monitor.id, code, &message).await?;
                self.dedup.mark_outstanding(monitor.id, &monitor.title);
                Ok(())
            }
            ProbeOutcome::Status(code) => {
                if self.dedup.has_outstanding(monitor.id) {
                    self.handle_monitor_up(monitor.id, code).await?;
                    self.dedup.clear(monitor.id);
                    info!("{} is back online. Status code: {code}.", monitor.title);
                } else {
                    debug!("{} is operating normally. Status code: {code}.", monitor.title);
                }
                Ok(())
            }
        }
    }

    /// Route an externally reported alert to the up or down handler.
    pub async fn handle_alert(&self, request: AlertRequest) -> Result<Event, StoreError> {
        // Resolve the monitor first so a bad id is a clean not-found.
        let monitor = self.registry.get_monitor(request.monitor_id).await?;

        if request.stable {
            self.handle_monitor_up(monitor.id, request.status_code).await
        } else {
            let message = request
                .message
                .unwrap_or_else(|| issue_message(&monitor, request.status_code));
            self.handle_monitor_down(monitor.id, request.status_code, &message).await
        }
    }

    /// Transition a monitor to offline: persist the status, append a down
    /// event, and email every enabled recipient.
    pub async fn handle_monitor_down(
        &self,
        id: Uuid,
        status_code: u16,
        message: &str,
    ) -> Result<Event, StoreError> {
        let monitor = self.registry.get_monitor(id).await?;

        let event = self
            .events
            .create_event(NewEvent::now(
                monitor.id,
                monitor.project_id.clone(),
                EventKind::Down,
                status_code,
                message,
            ))
            .await?;

        self.registry
            .update_monitor_status(monitor.id, MonitorStatus::Offline, status_code, false)
            .await?;

        let subject = format!("{} is down", monitor.title);
        let body =
            format!("{} is down. Status code: {status_code}. Message: {message}", monitor.title);
        self.send_logged(&monitor.enabled_recipients(), &subject, &body).await;

        Ok(event)
    }

    /// Transition a monitor back to online: persist the status, append an
    /// up event, and hand the notification to the queue.
    pub async fn handle_monitor_up(
        &self,
        id: Uuid,
        status_code: u16,
    ) -> Result<Event, StoreError> {
        let monitor = self.registry.get_monitor(id).await?;

        let event = self
            .events
            .create_event(NewEvent::now(
                monitor.id,
                monitor.project_id.clone(),
                EventKind::Up,
                status_code,
                "Monitor is back online.",
            ))
            .await?;

        self.registry
            .update_monitor_status(monitor.id, MonitorStatus::Online, status_code, true)
            .await?;

        let payload = json!({
            "recipients": [monitor.enabled_recipients().join(",")],
            "subject": format!("{} is back online.", monitor.title),
            "body": format!(
                "Monitor {} is back online. Status code: {status_code}",
                monitor.title
            ),
        });
        self.publish_logged(notify::NOTIFICATIONS_TOPIC, notify::EMAIL_ACTION, payload).await;

        Ok(event)
    }

    /// Retire a monitor: drop its event history, append one synthetic
    /// record of the deletion, and announce it on the queue.
    pub async fn handle_monitor_deleted(&self, id: Uuid) -> Result<Event, StoreError> {
        let monitor = self.registry.get_monitor(id).await?;

        let removed = self.events.delete_events_for_monitor(monitor.id).await?;
        debug!("Dropped {removed} events for retired monitor {}.", monitor.title);

        let event = self
            .events
            .create_event(NewEvent::now(
                monitor.id,
                monitor.project_id.clone(),
                EventKind::Generic,
                200,
                format!("Monitor {} deleted.", monitor.title),
            ))
            .await?;

        self.dedup.clear(monitor.id);

        let payload = serde_json::to_value(&monitor).unwrap_or_else(|_| json!({}));
        self.publish_logged(notify::MONITORS_TOPIC, notify::DELETE_ACTION, payload).await;

        Ok(event)
    }

    async fn send_logged(&self, recipients: &[String], subject: &str, body: &str) {
        if let Err(err) = self.notifier.send(recipients, subject, body).await {
            warn!("Failed to send notification \"{subject}\": {err}");
        }
    }

    async fn publish_logged(&self, topic: &str, action: &str, payload: serde_json::Value) {
        if let Err(err) = self.notifier.publish(topic, action, payload).await {
            warn!("Failed to publish to {topic}/{action}: {err}");
        }
    }
}

fn issue_message(monitor: &Monitor, received: u16) -> String {
    format!(
        "Issue detected with {}! Expected: {}, received: {received}.",
        monitor.title, monitor.expected_status_code
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::notify::NotifyError;
    use crate::store::memory::{MemoryEventStore, MemoryRegistry};

    struct RecordingNotifier {
        sent: Mutex<Vec<(Vec<String>, String, String)>>,
        published: Mutex<Vec<(String, String, serde_json::Value)>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self { sent: Mutex::new(Vec::new()), published: Mutex::new(Vec::new()), fail: false }
        }

        fn failing() -> Self {
            Self { fail: true, ..Self::new() }
        }

        fn sent(&self) -> Vec<(Vec<String>, String, String)> {
            self.sent.lock().unwrap().clone()
        }

        fn published(&self) -> Vec<(String, String, serde_json::Value)> {
            self.published.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(
            &self,
            recipients: &[String],
            subject: &str,
            body: &str,
        ) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Rejected("unavailable".into()));
            }
            self.sent.lock().unwrap().push((
                recipients.to_vec(),
                subject.to_string(),
                body.to_string(),
            ));
            Ok(())
        }

        async fn publish(
            &self,
            topic: &str,
            action: &str,
            payload: serde_json::Value,
        ) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Rejected("unavailable".into()));
            }
            self.published.lock().unwrap().push((
                topic.to_string(),
                action.to_string(),
                payload,
            ));
            Ok(())
        }
    }

    fn sample_monitor() -> Monitor {
        Monitor {
            id: Uuid::new_v4(),
            project_id: "proj-1".into(),
            title: "Example".into(),
            url: "https://example.com".into(),
            expected_status_code: 200,
            current_status_code: None,
            status: MonitorStatus::Unknown,
            online: false,
            active: true,
            interval_seconds: None,
            timeout_seconds: None,
            retries: 0,
            recipients: vec![crate::models::Recipient {
                name: "Ops".into(),
                email: "ops@example.com".into(),
                phone: None,
                enabled: true,
            }],
            last_checked: None,
        }
    }

    struct Fixture {
        registry: Arc<MemoryRegistry>,
        events: Arc<MemoryEventStore>,
        notifier: Arc<RecordingNotifier>,
        evaluator: StateEvaluator,
        monitor: Monitor,
    }

    fn fixture_with(notifier: RecordingNotifier) -> Fixture {
        let monitor = sample_monitor();
        let registry = Arc::new(MemoryRegistry::new([monitor.clone()]));
        let events = Arc::new(MemoryEventStore::new());
        let notifier = Arc::new(notifier);
        let evaluator = StateEvaluator::new(
            registry.clone(),
            events.clone(),
            notifier.clone(),
            DedupTracker::new(),
        );
        Fixture { registry, events, notifier, evaluator, monitor }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingNotifier::new())
    }

    #[tokio::test]
    async fn full_outage_and_recovery_cycle() {
        let f = fixture();

        // Passing probe on a fresh monitor: no event, no notification.
        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(200)).await.unwrap();
        assert!(f.events.events_for(f.monitor.id).is_empty());
        assert!(f.notifier.sent().is_empty());

        // First failing probe: one down event, one email, status offline.
        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(503)).await.unwrap();
        let events = f.events.events_for(f.monitor.id);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Down);
        assert_eq!(events[0].status_code, 503);
        let stored = f.registry.get_monitor(f.monitor.id).await.unwrap();
        assert_eq!(stored.status, MonitorStatus::Offline);
        assert!(!stored.online);
        assert_eq!(f.notifier.sent().len(), 1);
        assert_eq!(f.notifier.sent()[0].1, "Example is down");

        // Second failing probe in the same streak: deduplicated.
        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(503)).await.unwrap();
        assert_eq!(f.events.events_for(f.monitor.id).len(), 1);
        assert_eq!(f.notifier.sent().len(), 1);

        // Recovery: one up event via the queue, status online.
        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(200)).await.unwrap();
        let events = f.events.events_for(f.monitor.id);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, EventKind::Up);
        let stored = f.registry.get_monitor(f.monitor.id).await.unwrap();
        assert_eq!(stored.status, MonitorStatus::Online);
        assert!(stored.online);
        let published = f.notifier.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, notify::NOTIFICATIONS_TOPIC);
        assert_eq!(published[0].1, notify::EMAIL_ACTION);

        // Steady-state success after recovery: nothing further.
        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(200)).await.unwrap();
        assert_eq!(f.events.events_for(f.monitor.id).len(), 2);
        assert_eq!(f.notifier.published().len(), 1);
    }

    #[tokio::test]
    async fn new_streak_alerts_again_after_recovery() {
        let f = fixture();

        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(503)).await.unwrap();
        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(200)).await.unwrap();
        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(500)).await.unwrap();

        let events = f.events.events_for(f.monitor.id);
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].kind, EventKind::Down);
        assert_eq!(events[2].status_code, 500);
        assert_eq!(f.notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn transport_failure_notifies_but_never_mutates() {
        let f = fixture();

        for _ in 0..2 {
            f.evaluator
                .evaluate(&f.monitor, ProbeOutcome::TransportFailure("dns error".into()))
                .await
                .unwrap();
        }

        // Reported every time, no dedup, no state change, no event.
        assert_eq!(f.notifier.sent().len(), 2);
        assert!(f.events.events_for(f.monitor.id).is_empty());
        let stored = f.registry.get_monitor(f.monitor.id).await.unwrap();
        assert_eq!(stored.status, MonitorStatus::Unknown);

        // A later failing probe still opens a fresh streak normally.
        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(503)).await.unwrap();
        assert_eq!(f.events.events_for(f.monitor.id).len(), 1);
    }

    #[tokio::test]
    async fn exact_status_match_only() {
        let f = fixture();

        // 204 is "success" in HTTP terms but not the expected 200.
        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(204)).await.unwrap();

        let events = f.events.events_for(f.monitor.id);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Down);
    }

    #[tokio::test]
    async fn alert_intake_routes_down_with_message() {
        let f = fixture();

        let event = f
            .evaluator
            .handle_alert(AlertRequest {
                monitor_id: f.monitor.id,
                status_code: 500,
                stable: false,
                message: Some("boom".into()),
            })
            .await
            .unwrap();

        assert_eq!(event.kind, EventKind::Down);
        assert_eq!(event.status_code, 500);
        assert_eq!(event.message, "boom");
        let stored = f.registry.get_monitor(f.monitor.id).await.unwrap();
        assert_eq!(stored.status, MonitorStatus::Offline);
    }

    #[tokio::test]
    async fn alert_intake_routes_stable_to_up_handler() {
        let f = fixture();

        let event = f
            .evaluator
            .handle_alert(AlertRequest {
                monitor_id: f.monitor.id,
                status_code: 200,
                stable: true,
                message: None,
            })
            .await
            .unwrap();

        assert_eq!(event.kind, EventKind::Up);
        let stored = f.registry.get_monitor(f.monitor.id).await.unwrap();
        assert!(stored.online);
    }

    #[tokio::test]
    async fn alert_for_unknown_monitor_is_not_found() {
        let f = fixture();

        let result = f
            .evaluator
            .handle_alert(AlertRequest {
                monitor_id: Uuid::new_v4(),
                status_code: 500,
                stable: false,
                message: Some("boom".into()),
            })
            .await;

        assert!(matches!(result, Err(StoreError::NotFound)));
        assert!(f.events.all().is_empty());
    }

    #[tokio::test]
    async fn down_handler_fails_cleanly_when_monitor_vanishes() {
        let f = fixture();
        f.registry.remove(f.monitor.id);

        let result = f.evaluator.handle_monitor_down(f.monitor.id, 503, "gone").await;

        assert!(matches!(result, Err(StoreError::NotFound)));
        assert!(f.events.all().is_empty());
    }

    #[tokio::test]
    async fn notification_failure_does_not_roll_back_transition() {
        let f = fixture_with(RecordingNotifier::failing());

        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(503)).await.unwrap();

        // The state write and the event survive the failed send.
        let stored = f.registry.get_monitor(f.monitor.id).await.unwrap();
        assert_eq!(stored.status, MonitorStatus::Offline);
        assert_eq!(f.events.events_for(f.monitor.id).len(), 1);

        // And the streak is deduplicated as usual afterwards.
        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(503)).await.unwrap();
        assert_eq!(f.events.events_for(f.monitor.id).len(), 1);
    }

    #[tokio::test]
    async fn retiring_a_monitor_cascades_events() {
        let f = fixture();

        f.evaluator.evaluate(&f.monitor, ProbeOutcome::Status(503)).await.unwrap();
        let event = f.evaluator.handle_monitor_deleted(f.monitor.id).await.unwrap();

        assert_eq!(event.kind, EventKind::Generic);
        let remaining = f.events.events_for(f.monitor.id);
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].message.contains("deleted"));
        assert_eq!(f.notifier.published().last().unwrap().0, notify::MONITORS_TOPIC);
    }
}
