use async_trait::async_trait;
use serde_json::json;

use super::{Notifier, NotifyError};

/// Notifier that POSTs JSON payloads to a single HTTP endpoint.
///
/// Direct sends and queue publishes share the endpoint; the receiving
/// service routes on the payload shape.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, endpoint: endpoint.into() })
    }

    async fn post(&self, payload: serde_json::Value) -> Result<(), NotifyError> {
        let response = self.client.post(&self.endpoint).json(&payload).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected(format!(
                "endpoint returned {}",
                response.status().as_u16()
            )))
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        self.post(json!({
            "recipients": recipients,
            "subject": subject,
            "body": body,
        }))
        .await
    }

    async fn publish(
        &self,
        topic: &str,
        action: &str,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        self.post(json!({
            "topic": topic,
            "action": action,
            "payload": payload,
        }))
        .await
    }
}
