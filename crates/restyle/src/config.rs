//! Runtime configuration.
//!
//! Configuration can be loaded from environment variables or constructed programmatically.

use core::time::Duration;
use patch::storage_key;
use std::env;
use std::path::PathBuf;

/// Default storage namespace. Keys look like `restyle:example.com`.
pub const DEFAULT_NAMESPACE: &str = "restyle";
/// Default quiet period before an edit is saved.
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 200;
/// Default store file, relative to the working directory.
pub const DEFAULT_STORE_FILE: &str = "restyle-store.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestyleConfig {
    /// Prefix of every storage key
    pub namespace: String,
    /// Debounce period for saves in milliseconds
    pub save_debounce_ms: u64,
    /// JSON file holding every site's overrides
    pub store_path: PathBuf,
}

impl Default for RestyleConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_NAMESPACE.to_owned(),
            DEFAULT_SAVE_DEBOUNCE_MS,
            PathBuf::from(DEFAULT_STORE_FILE),
        )
    }
}

impl RestyleConfig {
    /// Construct a config with explicit values. An empty namespace falls back to the default.
    pub fn new(namespace: String, save_debounce_ms: u64, store_path: PathBuf) -> Self {
        let namespace = if namespace.is_empty() {
            DEFAULT_NAMESPACE.to_owned()
        } else {
            namespace
        };
        Self {
            namespace,
            save_debounce_ms,
            store_path,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `RESTYLE_NAMESPACE`: storage key prefix (default: `restyle`)
    /// - `RESTYLE_SAVE_DEBOUNCE_MS`: save debounce in milliseconds (default: 200)
    /// - `RESTYLE_STORE`: path of the store file (default: `restyle-store.json`)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let namespace = env::var("RESTYLE_NAMESPACE").unwrap_or_default();
        let save_debounce_ms = env::var("RESTYLE_SAVE_DEBOUNCE_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SAVE_DEBOUNCE_MS);
        let store_path = env::var_os("RESTYLE_STORE")
            .filter(|path| !path.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STORE_FILE), PathBuf::from);
        Self::new(namespace, save_debounce_ms, store_path)
    }

    pub const fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    /// Storage key for `host` under this config's namespace.
    pub fn storage_key(&self, host: &str) -> String {
        storage_key(&self.namespace, host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RestyleConfig::default();
        assert_eq!(config.save_delay(), Duration::from_millis(200));
        assert_eq!(config.storage_key("example.com"), "restyle:example.com");
        assert_eq!(config.store_path, PathBuf::from("restyle-store.json"));
    }

    #[test]
    fn empty_namespace_uses_default() {
        let config = RestyleConfig::new(String::new(), 50, PathBuf::from("x.json"));
        assert_eq!(config.namespace, "restyle");
        assert_eq!(config.storage_key("a.test:8080"), "restyle:a.test:8080");
    }
}
