use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::credentials::provider::{CredentialFactory, CredentialHandle};
use crate::helpers::time::{effective_ttl, now_u64};
use crate::observability::metrics::get_metrics;
use crate::store::resilient::ResilientKvStore;

static LOCK_MARKER: &str = "locked";

#[derive(Debug, Error)]
pub enum CredentialError {
    /// The identity-provider call failed; no token can be synthesized.
    #[error("identity provider fetch failed: {source}")]
    Provider {
        #[source]
        source: anyhow::Error,
    },
}

/// Tunables for the credential cache. Lock backoff and recheck placement are
/// deliberately knobs, not fixed behavior.
#[derive(Debug, Clone)]
pub struct CredentialCacheOptions {
    pub scope: String,
    /// Namespace prefix for shared-store keys.
    pub key_prefix: String,
    /// Served TTL reserves this margin before true expiry.
    pub token_buffer: Duration,
    /// TTL floor; prevents immediate re-fetch loops on near-expired tokens.
    pub min_ttl: Duration,
    /// Lock record TTL; reclaims the lock if the holder crashes.
    pub lock_ttl: Duration,
    /// Single fixed wait when another caller holds the lock.
    pub lock_backoff: Duration,
}

impl Default for CredentialCacheOptions {
    fn default() -> Self {
        Self {
            scope: String::new(),
            key_prefix: "token".to_owned(),
            token_buffer: Duration::from_secs(300),
            min_ttl: Duration::from_secs(60),
            lock_ttl: Duration::from_secs(10),
            lock_backoff: Duration::from_millis(500),
        }
    }
}

/// Token cache with best-effort cluster-wide single flight.
///
/// The common path is one store read. On a miss, an advisory lock record
/// (`set_if_absent` with a short TTL) dedupes concurrent fetches; a caller
/// that loses the lock waits one backoff, rechecks the cache, and then
/// fetches anyway rather than blocking on a slow or crashed holder. The lock
/// is never a consensus primitive: under contention combined with fallback
/// mode, duplicate provider calls are an accepted tradeoff.
pub struct CredentialCache {
    store: Arc<ResilientKvStore>,
    factory: Arc<dyn CredentialFactory>,
    /// Per-identity provider handles, reused across calls. The map lock is
    /// held only for lookup/insert, never across a fetch, so unrelated
    /// identities do not contend.
    handles: Mutex<HashMap<String, Arc<dyn CredentialHandle>>>,
    opts: CredentialCacheOptions,
}

impl CredentialCache {
    pub fn new(
        store: Arc<ResilientKvStore>,
        factory: Arc<dyn CredentialFactory>,
        opts: CredentialCacheOptions,
    ) -> Self {
        Self {
            store,
            factory,
            handles: Mutex::new(HashMap::new()),
            opts,
        }
    }

    /// Returns a usable access token for the identity.
    ///
    /// Provider errors always propagate; store and lock failures never do.
    /// The provider call itself is not bounded here; callers impose their
    /// own overall timeout.
    pub async fn get_token(&self, identity: &str) -> Result<String, CredentialError> {
        let metrics = get_metrics().await;
        let cache_key = self.cache_key(identity);
        let lock_key = Self::lock_key(&cache_key);

        if let Some(token) = self.store.get(&cache_key).await {
            metrics.token_cache_hits.inc();
            debug!("token cache hit");
            return Ok(token);
        }
        metrics.token_cache_misses.inc();
        debug!("token cache miss");

        let lock_acquired = self
            .store
            .set_if_absent(&lock_key, LOCK_MARKER, self.opts.lock_ttl)
            .await;

        if !lock_acquired {
            metrics.lock_contention.inc();
            debug!("token fetch in flight elsewhere, backing off once");
            sleep(self.opts.lock_backoff).await;
            if let Some(token) = self.store.get(&cache_key).await {
                return Ok(token);
            }
            // The holder may be slow or crashed; its lock TTL will reclaim
            // the record. Fetch anyway instead of waiting another interval.
            warn!("lock holder did not populate the cache, fetching anyway");
        }

        let result = self.fetch_and_cache(identity, &cache_key).await;

        if lock_acquired {
            self.store.delete(&lock_key).await;
        }
        result
    }

    /// Drops the cached token so the next call fetches a fresh one. Used by
    /// the request pipeline after an authentication rejection.
    pub async fn invalidate(&self, identity: &str) {
        let cache_key = self.cache_key(identity);
        self.store.delete(&cache_key).await;
        debug!("cached token invalidated");
    }

    async fn fetch_and_cache(
        &self,
        identity: &str,
        cache_key: &str,
    ) -> Result<String, CredentialError> {
        // Last recheck before paying for a provider round trip; closes the
        // race with a holder that populated the cache during lock traffic.
        if let Some(token) = self.store.get(cache_key).await {
            return Ok(token);
        }

        let metrics = get_metrics().await;
        let handle = self.handle_for(identity).await;

        metrics.provider_fetches.inc();
        info!("fetching fresh token from identity provider");
        let token = match handle.token(&self.opts.scope).await {
            Ok(token) => token,
            Err(source) => {
                metrics.provider_fetch_failures.inc();
                return Err(CredentialError::Provider { source });
            }
        };

        let ttl = effective_ttl(
            token.expires_at_unix,
            now_u64(),
            self.opts.token_buffer,
            self.opts.min_ttl,
        );
        self.store.set(cache_key, &token.value, ttl).await;
        info!("token cached for {}s", ttl.as_secs());
        Ok(token.value)
    }

    async fn handle_for(&self, identity: &str) -> Arc<dyn CredentialHandle> {
        let mut handles = self.handles.lock().await;
        if let Some(handle) = handles.get(identity) {
            return handle.clone();
        }
        debug!("creating credential handle for new identity");
        let handle = self.factory.for_identity(identity);
        handles.insert(identity.to_owned(), handle.clone());
        handle
    }

    /// Truncated hash of the identity; the raw identity never reaches the
    /// shared store.
    pub(crate) fn cache_key(&self, identity: &str) -> String {
        let digest = Sha256::digest(identity.as_bytes());
        let hash: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
        format!("{}:{hash}", self.opts.key_prefix)
    }

    pub(crate) fn lock_key(cache_key: &str) -> String {
        format!("{cache_key}:lock")
    }
}
