use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Remote shared key/value store collaborator (e.g. a Redis-compatible
/// service shared by all sidecar replicas).
///
/// Every operation may fail at any time without warning; callers absorb
/// failures instead of retrying here. The store guarantees per-call
/// atomicity only; composing calls is never atomic.
#[async_trait]
pub trait RemoteKeyValue: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Returns true iff this call created the key.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    async fn delete(&self, key: &str) -> Result<()>;
}
