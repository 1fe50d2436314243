//! Where patch snapshots are kept between sessions.

use crate::map::PatchMap;
use anyhow::Error;
use core::future::Future;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// The storage key for one host's overrides: `<namespace>:<host>`.
///
/// The host is used as-is. Ports are part of it, so `example.com:8080` and `example.com` are
/// different sites.
pub fn storage_key(namespace: &str, host: &str) -> String {
    format!("{namespace}:{host}")
}

/// Async key/value storage holding one [`PatchMap`] per key.
pub trait PatchStorage: Send + Sync + 'static {
    /// Load the snapshot stored under `key`, if any.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<PatchMap>, Error>> + Send;

    /// Replace the snapshot stored under `key`.
    ///
    /// # Errors
    /// Returns an error if the write did not complete; the previous snapshot may remain.
    fn set(&self, key: &str, patch: PatchMap) -> impl Future<Output = Result<(), Error>> + Send;

    /// Delete whatever is stored under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be updated.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send;
}

/// In-process storage. Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, PatchMap>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous read of the snapshot under `key`.
    pub fn snapshot(&self, key: &str) -> Option<PatchMap> {
        self.entries.lock().get(key).cloned()
    }

    /// Synchronous write, for seeding.
    pub fn insert(&self, key: &str, patch: PatchMap) {
        self.entries.lock().insert(key.to_owned(), patch);
    }
}

impl PatchStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<PatchMap>, Error> {
        Ok(self.snapshot(key))
    }

    async fn set(&self, key: &str, patch: PatchMap) -> Result<(), Error> {
        self.insert(key, patch);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
