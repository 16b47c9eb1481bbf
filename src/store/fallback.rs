use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// In-process fallback cache: key -> (value, absolute expiry).
///
/// Serves only while the remote store is unreachable. Not durable, not
/// shared across processes; expired entries are treated as absent and
/// pruned lazily on read.
#[derive(Debug, Default)]
pub struct FallbackStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl FallbackStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut map = self.entries.lock().await;
        match map.get(key) {
            Some((value, expiry)) if Instant::now() < *expiry => Some(value.clone()),
            Some(_) => {
                // expired, prune
                map.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let mut map = self.entries.lock().await;
        map.insert(key.to_owned(), (value.to_owned(), Instant::now() + ttl));
    }

    /// Returns true iff no live entry existed for the key.
    pub async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> bool {
        let mut map = self.entries.lock().await;
        if let Some((_, expiry)) = map.get(key) {
            if Instant::now() < *expiry {
                return false;
            }
        }
        map.insert(key.to_owned(), (value.to_owned(), Instant::now() + ttl));
        true
    }

    pub async fn delete(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
