use crate::config::settings::SidecarSettings;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load settings from a YAML file, then apply environment overrides.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<SidecarSettings> {
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("reading settings file {}", path.as_ref().display()))?;
    let mut settings: SidecarSettings = serde_yaml::from_str(&raw)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn apply_env_overrides(settings: &mut SidecarSettings) {
    if let Ok(endpoint) = std::env::var("SIDECAR_STORE_ENDPOINT") {
        settings.store.endpoint = Some(endpoint);
    }
    if let Ok(interval) = std::env::var("CONFIG_RELOAD_INTERVAL") {
        if let Ok(seconds) = interval.parse() {
            settings.sync.poll_interval_seconds = seconds;
        }
    }
}
