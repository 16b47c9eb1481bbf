use serde::Deserialize;
use std::time::Duration;

use crate::credentials::cache::CredentialCacheOptions;

/// ================================
/// Sidecar-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SidecarSettings {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub credentials: CredentialSettings,
    pub sync: SyncSettings,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreSettings {
    /// Remote shared-store endpoint; when absent the process-local fallback
    /// serves everything.
    pub endpoint: Option<String>,
    /// How long the remote is skipped after a failure before re-probing.
    #[serde(default = "default_probe_cooldown_seconds")]
    pub probe_cooldown_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CredentialSettings {
    /// Scope requested from the identity provider.
    #[serde(default)]
    pub scope: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Tokens are refreshed this many seconds before true expiry.
    #[serde(default = "default_token_buffer_seconds")]
    pub token_buffer_seconds: u64,
    #[serde(default = "default_min_ttl_seconds")]
    pub min_ttl_seconds: u64,
    #[serde(default = "default_lock_ttl_seconds")]
    pub lock_ttl_seconds: u64,
    #[serde(default = "default_lock_backoff_ms")]
    pub lock_backoff_ms: u64,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            scope: String::new(),
            key_prefix: default_key_prefix(),
            token_buffer_seconds: default_token_buffer_seconds(),
            min_ttl_seconds: default_min_ttl_seconds(),
            lock_ttl_seconds: default_lock_ttl_seconds(),
            lock_backoff_ms: default_lock_backoff_ms(),
        }
    }
}

impl CredentialSettings {
    pub fn cache_options(&self) -> CredentialCacheOptions {
        CredentialCacheOptions {
            scope: self.scope.clone(),
            key_prefix: self.key_prefix.clone(),
            token_buffer: Duration::from_secs(self.token_buffer_seconds),
            min_ttl: Duration::from_secs(self.min_ttl_seconds),
            lock_ttl: Duration::from_secs(self.lock_ttl_seconds),
            lock_backoff: Duration::from_millis(self.lock_backoff_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncSettings {
    /// Path of the active configuration file the host reads. `.bak` and
    /// `.tmp` siblings are derived from it.
    pub active_path: String,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_bootstrap_retry_seconds")]
    pub bootstrap_retry_seconds: u64,
    /// Host reload endpoint; no notification when absent.
    pub reload_endpoint: Option<String>,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "json".to_string())
            .to_lowercase()
            .as_str()
        {
            "compact" | "text" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

fn default_probe_cooldown_seconds() -> u64 {
    5
}

fn default_key_prefix() -> String {
    "token".to_string()
}

fn default_token_buffer_seconds() -> u64 {
    300
}

fn default_min_ttl_seconds() -> u64 {
    60
}

fn default_lock_ttl_seconds() -> u64 {
    10
}

fn default_lock_backoff_ms() -> u64 {
    500
}

fn default_poll_interval_seconds() -> u64 {
    60
}

fn default_bootstrap_retry_seconds() -> u64 {
    5
}
