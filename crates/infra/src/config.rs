//! Store selection from the environment.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `REPDESK_STORE=memory` | in-process store, nothing persisted |
//! | `REPDESK_DATABASE_URL` | remote PostgreSQL store |
//! | `REPDESK_LOCAL_DB` | SQLite file path for the local store |
//!
//! Without any of them the local store lives in the OS data directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::store::{DataStore, LocalStore, MemoryStore, RemoteStore};

pub const STORE_VAR: &str = "REPDESK_STORE";
pub const DATABASE_URL_VAR: &str = "REPDESK_DATABASE_URL";
pub const LOCAL_DB_VAR: &str = "REPDESK_LOCAL_DB";

/// Which backend to open, decided once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Local { path: PathBuf },
    Remote { url: String },
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration from an arbitrary variable source.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if var(STORE_VAR).is_some_and(|v| v.trim().eq_ignore_ascii_case("memory")) {
            return StoreConfig::Memory;
        }
        if let Some(url) = var(DATABASE_URL_VAR) {
            return StoreConfig::Remote { url };
        }
        let path = var(LOCAL_DB_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_local_path);
        StoreConfig::Local { path }
    }

    /// Open the configured backend.
    pub async fn open(&self) -> anyhow::Result<Arc<dyn DataStore>> {
        let store: Arc<dyn DataStore> = match self {
            StoreConfig::Memory => Arc::new(MemoryStore::new()),
            StoreConfig::Local { path } => Arc::new(
                LocalStore::open(path)
                    .await
                    .with_context(|| format!("local store at {:?}", path))?,
            ),
            StoreConfig::Remote { url } => Arc::new(
                RemoteStore::connect(url)
                    .await
                    .context("remote store")?,
            ),
        };
        tracing::info!(backend = store.backend(), "data store opened");
        Ok(store)
    }
}

/// `<data dir>/repdesk/repdesk.db`, falling back to `~/.local/share`.
pub fn default_local_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".local")
            .join("share")
    });
    base.join("repdesk").join("repdesk.db")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_local_store_in_data_dir() {
        let config = StoreConfig::from_lookup(lookup(&[]));
        assert_eq!(config, StoreConfig::Local { path: default_local_path() });
        assert!(default_local_path().ends_with("repdesk/repdesk.db"));
    }

    #[test]
    fn database_url_selects_remote() {
        let config = StoreConfig::from_lookup(lookup(&[
            (DATABASE_URL_VAR, "postgres://localhost/repdesk"),
            (LOCAL_DB_VAR, "/tmp/ignored.db"),
        ]));
        assert_eq!(
            config,
            StoreConfig::Remote { url: "postgres://localhost/repdesk".into() }
        );
    }

    #[test]
    fn memory_override_wins() {
        let config = StoreConfig::from_lookup(lookup(&[
            (STORE_VAR, "Memory"),
            (DATABASE_URL_VAR, "postgres://localhost/repdesk"),
        ]));
        assert_eq!(config, StoreConfig::Memory);
    }

    #[test]
    fn explicit_local_path_and_blank_values() {
        let config = StoreConfig::from_lookup(lookup(&[
            (DATABASE_URL_VAR, "  "),
            (LOCAL_DB_VAR, "/tmp/repdesk-test.db"),
        ]));
        assert_eq!(
            config,
            StoreConfig::Local { path: PathBuf::from("/tmp/repdesk-test.db") }
        );
    }

    #[tokio::test]
    async fn opens_memory_backend() {
        let store = StoreConfig::Memory.open().await.unwrap();
        assert_eq!(store.backend(), "memory");
    }
}
