use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// The three sibling paths forming the atomic-install state:
/// `<name>` (active), `<name>.bak` (last good), `<name>.tmp` (transient).
///
/// All three live in the same directory so the final rename is atomic.
#[derive(Debug, Clone)]
pub struct ConfigSlot {
    active: PathBuf,
    last_good: PathBuf,
    temp: PathBuf,
}

impl ConfigSlot {
    pub fn new(active: impl Into<PathBuf>) -> Self {
        let active = active.into();
        let last_good = sibling(&active, "bak");
        let temp = sibling(&active, "tmp");
        Self {
            active,
            last_good,
            temp,
        }
    }

    pub fn active_path(&self) -> &Path {
        &self.active
    }

    pub fn last_good_path(&self) -> &Path {
        &self.last_good
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// Installs a validated candidate: temp write, best-effort snapshot of
    /// the current active file to last-good, then one atomic rename. A
    /// reader never observes a partially written active file; on any error
    /// the previous active file is untouched and the temp file is removed.
    pub async fn install(&self, candidate: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.active.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        fs::write(&self.temp, candidate).await?;

        // Keep the outgoing active file as the rollback point. Absence is
        // normal on first install; other snapshot failures must not block
        // the install itself.
        match fs::copy(&self.active, &self.last_good).await {
            Ok(_) => debug!("last-good snapshot refreshed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!("could not snapshot active config to last-good: {err}"),
        }

        if let Err(err) = fs::rename(&self.temp, &self.active).await {
            let _ = fs::remove_file(&self.temp).await;
            return Err(err);
        }
        Ok(())
    }

    /// Restores the last-good snapshot over the active path.
    pub async fn rollback(&self) -> io::Result<()> {
        fs::copy(&self.last_good, &self.active).await.map(|_| ())
    }
}

fn sibling(active: &Path, suffix: &str) -> PathBuf {
    let mut name = active.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
