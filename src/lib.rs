//! # Proxy Sidecar Core
//!
//! State coordination for a long-running sidecar that front-ends an LLM
//! proxy process. Two subsystems do the real work:
//! - `credentials`: lazily fetched access tokens, cached in a shared store
//!   with single-flight coordination and a process-local fallback
//! - `sync`: hot configuration reload from a remote object store with
//!   atomic install and a last-good rollback file
//!
//! Modules:
//! - `config`: sidecar settings (YAML + env overrides)
//! - `store`: resilient key/value access (remote first, local fallback)
//! - `credentials`: credential cache and identity-provider seams
//! - `sync`: config fetch, validation, atomic install, host notification

pub mod config;
pub mod credentials;
pub mod helpers;
pub mod observability;
pub mod store;
pub mod sync;
pub mod tests;
pub mod utils;

pub use crate::credentials::cache::{CredentialCache, CredentialError};
pub use crate::store::resilient::ResilientKvStore;
pub use crate::sync::synchronizer::{ConfigSynchronizer, SyncError, SyncOutcome, SyncState};
