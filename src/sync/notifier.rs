use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Post-install reload signal to the host process. The synchronizer logs a
/// failed notification and keeps the installed file; the host picks the new
/// config up on its own schedule instead.
#[async_trait]
pub trait ReloadNotifier: Send + Sync {
    async fn notify(&self) -> Result<()>;
}

/// Notifies the host by POSTing to its reload endpoint.
#[derive(Debug, Clone)]
pub struct HttpReloadNotifier {
    client: Client,
    endpoint: String,
}

impl HttpReloadNotifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ReloadNotifier for HttpReloadNotifier {
    async fn notify(&self) -> Result<()> {
        let response = self.client.post(&self.endpoint).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("reload endpoint answered {}", response.status()));
        }
        Ok(())
    }
}
