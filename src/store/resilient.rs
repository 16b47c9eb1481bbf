use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::observability::metrics::get_metrics;
use crate::store::fallback::FallbackStore;
use crate::store::remote::RemoteKeyValue;

pub const PROBE_COOLDOWN_DEFAULT: Duration = Duration::from_secs(5);

/// Key/value facade that never returns an error to its caller.
///
/// Every call goes to the remote store first; on any remote failure the call
/// is answered from the in-process fallback and the remote is skipped for a
/// probe-cooldown window before being tried again. While the fallback is
/// serving, cross-process guarantees (notably the single-flight lock) are
/// best-effort only.
pub struct ResilientKvStore {
    remote: Option<Arc<dyn RemoteKeyValue>>,
    fallback: FallbackStore,
    probe_cooldown: Duration,
    /// Remote is skipped until this instant after a failure.
    downgraded_until: Mutex<Option<Instant>>,
}

/// Health snapshot for the host's health endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreHealth {
    pub remote_configured: bool,
    pub remote_available: bool,
    pub fallback_entries: usize,
}

impl ResilientKvStore {
    pub fn new(remote: Option<Arc<dyn RemoteKeyValue>>) -> Self {
        Self::with_probe_cooldown(remote, PROBE_COOLDOWN_DEFAULT)
    }

    pub fn with_probe_cooldown(
        remote: Option<Arc<dyn RemoteKeyValue>>,
        probe_cooldown: Duration,
    ) -> Self {
        Self {
            remote,
            fallback: FallbackStore::new(),
            probe_cooldown,
            downgraded_until: Mutex::new(None),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        if let Some(remote) = self.remote_target().await {
            match remote.get(key).await {
                Ok(value) => {
                    self.mark_up().await;
                    return value;
                }
                Err(err) => self.mark_down("get", &err).await,
            }
        }
        self.fallback.get(key).await
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        if let Some(remote) = self.remote_target().await {
            match remote.set(key, value, ttl).await {
                Ok(()) => {
                    self.mark_up().await;
                    return;
                }
                Err(err) => self.mark_down("set", &err).await,
            }
        }
        self.fallback.set(key, value, ttl).await;
    }

    /// Returns true iff this call created the key.
    pub async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> bool {
        if let Some(remote) = self.remote_target().await {
            match remote.set_if_absent(key, value, ttl).await {
                Ok(created) => {
                    self.mark_up().await;
                    return created;
                }
                Err(err) => self.mark_down("set_if_absent", &err).await,
            }
        }
        self.fallback.set_if_absent(key, value, ttl).await
    }

    pub async fn delete(&self, key: &str) {
        if let Some(remote) = self.remote_target().await {
            match remote.delete(key).await {
                Ok(()) => {
                    self.mark_up().await;
                    return;
                }
                Err(err) => self.mark_down("delete", &err).await,
            }
        }
        self.fallback.delete(key).await;
    }

    pub async fn health(&self) -> StoreHealth {
        StoreHealth {
            remote_configured: self.remote.is_some(),
            remote_available: self.remote.is_some() && self.remote_usable().await,
            fallback_entries: self.fallback.len().await,
        }
    }

    /// The remote client, unless none is configured or a downgrade window is
    /// still open.
    async fn remote_target(&self) -> Option<&Arc<dyn RemoteKeyValue>> {
        let remote = self.remote.as_ref()?;
        if self.remote_usable().await {
            Some(remote)
        } else {
            None
        }
    }

    async fn remote_usable(&self) -> bool {
        let downgraded = self.downgraded_until.lock().await;
        match *downgraded {
            Some(until) => Instant::now() >= until,
            None => true,
        }
    }

    async fn mark_down(&self, op: &str, err: &anyhow::Error) {
        warn!("remote store {op} failed, serving from fallback: {err}");
        get_metrics().await.store_fallbacks.with_label_values(&[op]).inc();
        let mut downgraded = self.downgraded_until.lock().await;
        *downgraded = Some(Instant::now() + self.probe_cooldown);
    }

    async fn mark_up(&self) {
        let mut downgraded = self.downgraded_until.lock().await;
        if downgraded.is_some() {
            debug!("remote store recovered");
            *downgraded = None;
        }
    }
}
