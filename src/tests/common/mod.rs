// tests/common/mod.rs
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::credentials::cache::CredentialCacheOptions;
use crate::credentials::provider::{CredentialFactory, CredentialHandle, ProviderToken};
use crate::helpers::time::now_u64;
use crate::store::remote::RemoteKeyValue;
use crate::store::resilient::ResilientKvStore;
use crate::sync::source::ConfigSource;

pub const VALID_DOC: &str = "model_list:
  - model_name: gpt-4o
    params:
      model: azure/gpt-4o
";

pub const VALID_DOC_V2: &str = "model_list:
  - model_name: gpt-4o
    params:
      model: azure/gpt-4o
  - model_name: sonnet
    params:
      model: bedrock/sonnet
";

pub const CORRUPT_DOC: &str = "model_list: []
";

/// In-memory stand-in for the remote shared store, with a failure switch
/// and a call counter.
#[derive(Default)]
pub struct MockRemoteStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    failing: AtomicBool,
    pub calls: AtomicUsize,
}

impl MockRemoteStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(anyhow!("remote store unreachable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteKeyValue for MockRemoteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        let mut map = self.entries.lock().await;
        match map.get(key) {
            Some((value, expiry)) if Instant::now() < *expiry => Ok(Some(value.clone())),
            Some(_) => {
                map.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.check()?;
        let mut map = self.entries.lock().await;
        map.insert(key.to_owned(), (value.to_owned(), Instant::now() + ttl));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.check()?;
        let mut map = self.entries.lock().await;
        if let Some((_, expiry)) = map.get(key) {
            if Instant::now() < *expiry {
                return Ok(false);
            }
        }
        map.insert(key.to_owned(), (value.to_owned(), Instant::now() + ttl));
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check()?;
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

pub fn store_with_remote(remote: Arc<MockRemoteStore>) -> Arc<ResilientKvStore> {
    Arc::new(ResilientKvStore::with_probe_cooldown(
        Some(remote as Arc<dyn RemoteKeyValue>),
        Duration::from_millis(100),
    ))
}

pub fn store_without_remote() -> Arc<ResilientKvStore> {
    Arc::new(ResilientKvStore::new(None))
}

/// Cache tunables with short timings so contention tests stay fast.
pub fn test_cache_options() -> CredentialCacheOptions {
    CredentialCacheOptions {
        scope: "test".to_owned(),
        key_prefix: "tok".to_owned(),
        token_buffer: Duration::from_secs(300),
        min_ttl: Duration::from_secs(60),
        lock_ttl: Duration::from_secs(2),
        lock_backoff: Duration::from_millis(200),
    }
}

/// Provider handle that counts fetches and hands out predictable tokens.
pub struct CountingHandle {
    identity: String,
    fetches: Arc<AtomicUsize>,
    ttl_seconds: u64,
    fail: Arc<AtomicBool>,
    delay: Duration,
}

#[async_trait]
impl CredentialHandle for CountingHandle {
    async fn token(&self, _scope: &str) -> Result<ProviderToken> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("provider rejected the request"));
        }
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ProviderToken::new(
            format!("token-{}-{n}", self.identity),
            now_u64() + self.ttl_seconds,
        ))
    }
}

pub struct CountingFactory {
    pub fetches: Arc<AtomicUsize>,
    pub created: Arc<AtomicUsize>,
    pub fail: Arc<AtomicBool>,
    pub ttl_seconds: u64,
    pub delay: Duration,
}

impl CountingFactory {
    pub fn new(ttl_seconds: u64) -> Arc<Self> {
        Arc::new(Self {
            fetches: Arc::new(AtomicUsize::new(0)),
            created: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
            ttl_seconds,
            delay: Duration::ZERO,
        })
    }

    pub fn with_delay(ttl_seconds: u64, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            fetches: Arc::new(AtomicUsize::new(0)),
            created: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
            ttl_seconds,
            delay,
        })
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl CredentialFactory for CountingFactory {
    fn for_identity(&self, identity: &str) -> Arc<dyn CredentialHandle> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Arc::new(CountingHandle {
            identity: identity.to_owned(),
            fetches: self.fetches.clone(),
            ttl_seconds: self.ttl_seconds,
            fail: self.fail.clone(),
            delay: self.delay,
        })
    }
}

/// Config source fed from a scripted queue of fetch results and probe
/// indicators.
#[derive(Default)]
pub struct ScriptedConfigSource {
    fetches: Mutex<VecDeque<Result<Vec<u8>, String>>>,
    probes: Mutex<VecDeque<String>>,
    pub fetch_calls: AtomicUsize,
}

impl ScriptedConfigSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn push_doc(&self, doc: &str) {
        self.fetches
            .lock()
            .await
            .push_back(Ok(doc.as_bytes().to_vec()));
    }

    pub async fn push_fetch_error(&self, message: &str) {
        self.fetches.lock().await.push_back(Err(message.to_owned()));
    }

    pub async fn push_probe(&self, indicator: &str) {
        self.probes.lock().await.push_back(indicator.to_owned());
    }

    pub fn fetch_call_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigSource for ScriptedConfigSource {
    async fn probe(&self) -> Result<Option<String>> {
        Ok(self.probes.lock().await.pop_front())
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        match self.fetches.lock().await.pop_front() {
            Some(Ok(bytes)) => Ok(bytes),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted source exhausted")),
        }
    }
}
