//! Persisted settings: listening port and custom miner names.
//!
//! [`SettingsStore`] is the persistence boundary. [`Preferences`] keeps the
//! live copy in memory, answers lookups synchronously, and writes through
//! to the store in the background.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{watch, Mutex};

use crate::config::{validate_port, DEFAULT_PORT};
use crate::error::StorageError;

/// Settings file name inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Persisted user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_port")]
    pub discovery_port: u16,
    /// Custom display names keyed by miner address
    #[serde(default)]
    pub miner_names: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            discovery_port: DEFAULT_PORT,
            miner_names: BTreeMap::new(),
        }
    }
}

/// Where settings are persisted.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Settings, StorageError>;
    async fn save(&self, settings: &Settings) -> Result<(), StorageError>;
}

/// JSON file store.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    /// Create a store writing `settings.json` into `dir`.
    pub fn new(dir: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&dir)
            .map_err(|e| StorageError::DirectoryAccess(format!("{}: {}", dir.display(), e)))?;

        Ok(Self {
            path: dir.join(SETTINGS_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<Settings, StorageError> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(settings)?;

        // Write then rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}

/// In-memory store for ephemeral runs and tests.
#[derive(Default)]
pub struct MemorySettingsStore {
    saved: parking_lot::Mutex<Option<Settings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last settings written, if any.
    pub fn saved(&self) -> Option<Settings> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Settings, StorageError> {
        Ok(self.saved.lock().clone().unwrap_or_default())
    }

    async fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        *self.saved.lock() = Some(settings.clone());
        Ok(())
    }
}

struct Inner {
    current: watch::Sender<Settings>,
    store: Arc<dyn SettingsStore>,
    write_lock: Mutex<()>,
}

impl Inner {
    async fn persist(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        // Taken under the write lock so the last writer always saves the
        // newest state, whatever order background writes run in.
        let snapshot = self.current.borrow().clone();
        self.store.save(&snapshot).await
    }
}

/// Live settings with background write-through.
#[derive(Clone)]
pub struct Preferences {
    inner: Arc<Inner>,
}

impl Preferences {
    /// Load from `store`. An unreadable or corrupt store yields defaults.
    pub async fn load(store: Arc<dyn SettingsStore>) -> Self {
        let settings = match store.load().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load settings, using defaults: {}", e);
                Settings::default()
            }
        };
        tracing::debug!(
            "Loaded settings: port {}, {} custom miner names",
            settings.discovery_port,
            settings.miner_names.len()
        );

        Self::with_settings(store, settings)
    }

    /// Start from known settings without reading the store.
    pub fn with_settings(store: Arc<dyn SettingsStore>, settings: Settings) -> Self {
        let (current, _) = watch::channel(settings);
        Self {
            inner: Arc::new(Inner {
                current,
                store,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// In-memory only, nothing is persisted beyond the process.
    pub fn ephemeral() -> Self {
        Self::with_settings(Arc::new(MemorySettingsStore::new()), Settings::default())
    }

    pub fn get(&self) -> Settings {
        self.inner.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.inner.current.subscribe()
    }

    pub fn port(&self) -> u16 {
        self.inner.current.borrow().discovery_port
    }

    /// Validate, apply and persist a new listening port.
    pub fn set_port(&self, port: u16) -> Result<(), StorageError> {
        let port = validate_port(port)?;
        self.update(|settings| settings.discovery_port = port);
        Ok(())
    }

    pub fn miner_name(&self, id: &str) -> Option<String> {
        self.inner.current.borrow().miner_names.get(id).cloned()
    }

    pub fn miner_names(&self) -> BTreeMap<String, String> {
        self.inner.current.borrow().miner_names.clone()
    }

    /// Apply `f` to the in-memory settings and persist in the background.
    ///
    /// The in-memory change is visible immediately; persistence failures
    /// are logged and never reported back.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        self.inner.current.send_modify(f);
        self.persist_in_background();
    }

    /// Persist the current settings and wait for the result.
    pub async fn flush(&self) -> Result<(), StorageError> {
        self.inner.persist().await
    }

    fn persist_in_background(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime, settings change kept in memory only");
            return;
        };

        let inner = self.inner.clone();
        handle.spawn(async move {
            if let Err(e) = inner.persist().await {
                tracing::warn!("Failed to persist settings: {}", e);
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Store whose writes always fail.
    pub(crate) struct FailingStore;

    #[async_trait]
    impl SettingsStore for FailingStore {
        async fn load(&self) -> Result<Settings, StorageError> {
            Err(StorageError::DirectoryAccess("unavailable".to_string()))
        }

        async fn save(&self, _settings: &Settings) -> Result<(), StorageError> {
            Err(StorageError::DirectoryAccess("read-only".to_string()))
        }
    }

    fn create_test_store() -> (FileSettingsStore, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(temp_dir.path().to_path_buf()).unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_missing_file_loads_defaults() {
        let (store, _tmp) = create_test_store();
        assert_eq!(store.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _tmp) = create_test_store();
        let mut settings = Settings::default();
        settings.discovery_port = 23456;
        settings
            .miner_names
            .insert("10.0.0.5".to_string(), "Rig-A".to_string());

        store.save(&settings).await.unwrap();

        assert_eq!(store.load().await.unwrap(), settings);
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("discoveryPort"));
        assert!(raw.contains("minerNames"));
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let (store, _tmp) = create_test_store();
        std::fs::write(store.path(), r#"{"minerNames": {"10.0.0.1": "a"}}"#).unwrap();

        let settings = store.load().await.unwrap();
        assert_eq!(settings.discovery_port, DEFAULT_PORT);
        assert_eq!(settings.miner_names.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_defaults() {
        let (store, _tmp) = create_test_store();
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().await.is_err());

        let prefs = Preferences::load(Arc::new(store)).await;
        assert_eq!(prefs.get(), Settings::default());
    }

    #[tokio::test]
    async fn test_update_persists() {
        let store = Arc::new(MemorySettingsStore::new());
        let prefs = Preferences::load(store.clone()).await;

        prefs.set_port(20000).unwrap();
        prefs.flush().await.unwrap();

        assert_eq!(prefs.port(), 20000);
        assert_eq!(store.saved().unwrap().discovery_port, 20000);
    }

    #[tokio::test]
    async fn test_set_port_rejects_privileged() {
        let prefs = Preferences::ephemeral();
        assert!(prefs.set_port(80).is_err());
        assert_eq!(prefs.port(), DEFAULT_PORT);
    }

    #[tokio::test]
    async fn test_subscribe_sees_changes() {
        let prefs = Preferences::ephemeral();
        let mut rx = prefs.subscribe();

        prefs.update(|s| {
            s.miner_names
                .insert("10.0.0.9".to_string(), "north".to_string());
        });

        assert!(rx.has_changed().unwrap());
        assert_eq!(
            rx.borrow_and_update().miner_names.get("10.0.0.9").map(String::as_str),
            Some("north")
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_memory_state() {
        let prefs = Preferences::load(Arc::new(FailingStore)).await;
        prefs.update(|s| {
            s.miner_names
                .insert("10.0.0.5".to_string(), "Rig-A".to_string());
        });

        assert!(prefs.flush().await.is_err());
        assert_eq!(prefs.miner_name("10.0.0.5").as_deref(), Some("Rig-A"));
    }
}
