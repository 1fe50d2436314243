//! File-backed patch storage.

use anyhow::{Error, anyhow};
use patch::{PatchMap, PatchStorage};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{read as tokio_fs_read, write as tokio_fs_write};
use tokio::sync::Mutex;

type Entries = BTreeMap<String, PatchMap>;

/// One JSON file mapping storage keys to patch maps.
///
/// Writes are read-modify-write of the whole file and are serialized through this value, so
/// share one instance per file. A missing file reads as empty.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Entries, Error> {
        match tokio_fs_read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| anyhow!("Corrupt store file {}: {err}", self.path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(err) => Err(anyhow!(
                "Failed to read store file {}: {err}",
                self.path.display()
            )),
        }
    }

    async fn write_entries(&self, entries: &Entries) -> Result<(), Error> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio_fs_write(&self.path, bytes)
            .await
            .map_err(|err| anyhow!("Failed to write store file {}: {err}", self.path.display()))
    }
}

impl PatchStorage for JsonFileStorage {
    async fn get(&self, key: &str) -> Result<Option<PatchMap>, Error> {
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, patch: PatchMap) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_owned(), patch);
        self.write_entries(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries).await
    }
}
