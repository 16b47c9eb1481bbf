use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::observability::metrics::get_metrics;
use crate::sync::installer::ConfigSlot;
use crate::sync::notifier::ReloadNotifier;
use crate::sync::source::ConfigSource;
use crate::sync::validator::validate_document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Uninitialized,
    /// Bootstrapping; no configuration has been installed yet.
    Syncing,
    /// The active file reflects the latest valid remote document.
    Active,
    /// The last cycle failed; the active file is stale but valid.
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Probe indicator or content fingerprint matched the applied document.
    Unchanged,
    /// A new valid document was installed.
    Installed,
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Object store unreachable; the cycle is skipped and retried.
    #[error("config fetch failed: {source}")]
    Fetch {
        #[source]
        source: anyhow::Error,
    },
    /// Candidate malformed; discarded without touching the active file.
    #[error("config validation failed: {}", .issues.join("; "))]
    Validation { issues: Vec<String> },
    /// Filesystem failure during backup/rename; active file retained.
    #[error("config install failed: {source}")]
    Install {
        #[source]
        source: std::io::Error,
    },
}

/// Keeps the local configuration file in step with the remote document,
/// never exposing a partial or invalid file.
pub struct ConfigSynchronizer {
    source: Arc<dyn ConfigSource>,
    slot: ConfigSlot,
    notifier: Option<Arc<dyn ReloadNotifier>>,
    state: SyncState,
    /// Fingerprint of the last *installed* document. Cleared on a failed
    /// cycle so rejected bytes are re-validated and previously-good content
    /// can be re-applied; never set for a rejected candidate.
    last_applied_fingerprint: Option<String>,
    last_probe_indicator: Option<String>,
}

impl ConfigSynchronizer {
    pub fn new(source: Arc<dyn ConfigSource>, slot: ConfigSlot) -> Self {
        Self {
            source,
            slot,
            notifier: None,
            state: SyncState::Uninitialized,
            last_applied_fingerprint: None,
            last_probe_indicator: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ReloadNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn slot(&self) -> &ConfigSlot {
        &self.slot
    }

    /// First fetch+validate+install, retried on a fixed delay indefinitely:
    /// the host cannot start without an initial configuration.
    pub async fn bootstrap(&mut self, retry_delay: Duration) {
        loop {
            match self.poll().await {
                Ok(_) => {
                    info!("initial configuration installed");
                    return;
                }
                Err(err) => {
                    error!(
                        "bootstrap sync failed, retrying in {}s: {err}",
                        retry_delay.as_secs()
                    );
                    sleep(retry_delay).await;
                }
            }
        }
    }

    /// One full sync cycle. Non-reentrant by construction: the periodic
    /// driver awaits each cycle before scheduling the next.
    pub async fn poll(&mut self) -> Result<SyncOutcome, SyncError> {
        if self.state == SyncState::Uninitialized {
            self.state = SyncState::Syncing;
        }

        let result = self.cycle().await;
        let metrics = get_metrics().await;
        match &result {
            Ok(outcome) => {
                self.state = SyncState::Active;
                let label = match outcome {
                    SyncOutcome::Unchanged => "unchanged",
                    SyncOutcome::Installed => "installed",
                };
                metrics.sync_cycles.with_label_values(&[label]).inc();
            }
            Err(err) => {
                metrics.sync_cycles.with_label_values(&["failed"]).inc();
                match err {
                    SyncError::Validation { .. } | SyncError::Install { .. } => {
                        // Force a full re-validation next cycle; a rejected
                        // candidate must never poison later re-application
                        // of content that once validated.
                        self.last_applied_fingerprint = None;
                        self.last_probe_indicator = None;
                    }
                    SyncError::Fetch { .. } => {}
                }
                if self.state != SyncState::Syncing {
                    self.state = SyncState::Degraded;
                }
            }
        }
        result
    }

    async fn cycle(&mut self) -> Result<SyncOutcome, SyncError> {
        let probe_indicator = self
            .source
            .probe()
            .await
            .map_err(|source| SyncError::Fetch { source })?;
        if let Some(indicator) = &probe_indicator {
            if self.last_probe_indicator.as_deref() == Some(indicator.as_str()) {
                debug!("config unchanged (probe indicator match)");
                return Ok(SyncOutcome::Unchanged);
            }
        }

        let bytes = self
            .source
            .fetch()
            .await
            .map_err(|source| SyncError::Fetch { source })?;
        let fingerprint = fingerprint(&bytes);

        if self.last_applied_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            debug!("config unchanged (fingerprint match)");
            // Content is identical to the applied document; remembering the
            // indicator just skips the next download.
            if probe_indicator.is_some() {
                self.last_probe_indicator = probe_indicator;
            }
            return Ok(SyncOutcome::Unchanged);
        }

        if let Err(issues) = validate_document(&bytes) {
            get_metrics().await.config_validation_errors.inc();
            warn!("candidate config rejected ({} issues)", issues.len());
            return Err(SyncError::Validation { issues });
        }

        self.slot
            .install(&bytes)
            .await
            .map_err(|source| SyncError::Install { source })?;
        self.last_applied_fingerprint = Some(fingerprint);
        // Always overwritten, even with `None`: an indicator kept from a
        // superseded install would match a later revert to that version and
        // mask the change.
        self.last_probe_indicator = probe_indicator;
        get_metrics().await.config_installs.inc();
        info!(
            "configuration installed ({} bytes) at {}",
            bytes.len(),
            self.slot.active_path().display()
        );

        if let Some(notifier) = &self.notifier {
            if let Err(err) = notifier.notify().await {
                warn!("host reload notification failed (config already installed): {err}");
            }
        }
        Ok(SyncOutcome::Installed)
    }

    /// Periodic driver, spawned by the orchestrator after `bootstrap`.
    ///
    /// One cycle at a time; shutdown is honored only between cycles so an
    /// in-flight install is never interrupted mid-rename.
    pub async fn run(mut self, poll_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately and bootstrap already ran.
        ticker.tick().await;

        info!(
            "config sync loop started (interval={}s)",
            poll_interval.as_secs()
        );
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.poll().await {
                        error!("config sync cycle failed: {err}");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("config sync loop stopping");
                        return;
                    }
                }
            }
        }
    }
}

/// SHA-256 content fingerprint, hex encoded.
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
