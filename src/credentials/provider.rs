use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Token returned by the identity provider.
#[derive(Debug, Clone)]
pub struct ProviderToken {
    pub value: String,
    pub expires_at_unix: u64, // UNIX TIMESTAMP
}

impl ProviderToken {
    pub fn new(value: String, expires_at_unix: u64) -> Self {
        Self {
            value,
            expires_at_unix,
        }
    }
}

/// One identity's credential handle at the identity provider.
///
/// Handles are created once per identity and reused across fetches. The
/// provider call carries no internal retry; a failure surfaces as-is.
#[async_trait]
pub trait CredentialHandle: Send + Sync {
    async fn token(&self, scope: &str) -> Result<ProviderToken>;
}

/// Builds credential handles. Called at most once per identity; the cache
/// pools the result.
pub trait CredentialFactory: Send + Sync {
    fn for_identity(&self, identity: &str) -> Arc<dyn CredentialHandle>;
}
