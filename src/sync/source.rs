use anyhow::Result;
use async_trait::async_trait;

/// Remote object-store collaborator holding the configuration document.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Cheap change indicator (e.g. an object-store etag). `None` means the
    /// source cannot answer cheaply and the caller must download.
    async fn probe(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Downloads the current document bytes.
    async fn fetch(&self) -> Result<Vec<u8>>;
}
