/// Notification boundary.
///
/// The evaluator only decides *whether* to notify; rendering and delivery
/// belong to the channel behind this trait. Both paths are best-effort:
/// a failed notification is logged by the caller and never rolls back the
/// state or event write that preceded it.
pub mod webhook;

use async_trait::async_trait;
use thiserror::Error;

/// Queue topic for downstream notification consumers.
pub const NOTIFICATIONS_TOPIC: &str = "notifications";
/// Queue topic for monitor lifecycle messages.
pub const MONITORS_TOPIC: &str = "monitors";

/// Queue action for email delivery requests.
pub const EMAIL_ACTION: &str = "email";
/// Queue action announcing a retired monitor.
pub const DELETE_ACTION: &str = "delete";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("channel rejected notification: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Synchronous delivery of one message to a set of recipients.
    async fn send(&self, recipients: &[String], subject: &str, body: &str)
    -> Result<(), NotifyError>;

    /// Fire-and-forget publish to the downstream queue.
    async fn publish(
        &self,
        topic: &str,
        action: &str,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError>;
}

/// Notifier that only writes to the log. Used when no channel endpoint is
/// configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!("notification ({}): {subject} - {body}", recipients.join(", "));
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        action: &str,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        tracing::info!("queued notification {topic}/{action}: {payload}");
        Ok(())
    }
}
