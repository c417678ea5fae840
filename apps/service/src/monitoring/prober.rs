use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// What one probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The target answered; any HTTP status is a valid observation.
    Status(u16),
    /// The target could not be reached (DNS, refused connection, timeout).
    TransportFailure(String),
}

/// Performs one network check against a monitor's URL.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome;
}

/// HTTP prober backed by a shared reqwest client.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Result<Self> {
        // No client-wide timeout; each probe applies the monitor's own.
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome {
        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => ProbeOutcome::Status(response.status().as_u16()),
            Err(error) => ProbeOutcome::TransportFailure(error.to_string()),
        }
    }
}
