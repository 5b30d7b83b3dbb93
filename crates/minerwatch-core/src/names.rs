//! Custom miner names.
//!
//! A side lookup table over [`Preferences`]: the receiver asks it for an
//! override before normalizing a packet, operators write to it. It never
//! touches the registry itself.

use std::collections::BTreeMap;
use tokio::sync::watch;

use crate::error::StorageError;
use crate::storage::{Preferences, Settings};

#[derive(Clone)]
pub struct NameOverlay {
    preferences: Preferences,
}

impl NameOverlay {
    pub fn new(preferences: Preferences) -> Self {
        Self { preferences }
    }

    /// Custom name for `id`, if one is set.
    pub fn resolve(&self, id: &str) -> Option<String> {
        self.preferences.miner_name(id)
    }

    /// Set the custom name for `id`. A blank name removes the override.
    ///
    /// Takes effect immediately; persistence happens in the background.
    pub fn set(&self, id: &str, name: &str) {
        let name = name.trim();
        self.preferences.update(|settings| {
            if name.is_empty() {
                settings.miner_names.remove(id);
            } else {
                settings
                    .miner_names
                    .insert(id.to_string(), name.to_string());
            }
        });
        tracing::debug!("Custom name for {} set to {:?}", id, name);
    }

    /// All overrides, ordered by id.
    pub fn all(&self) -> BTreeMap<String, String> {
        self.preferences.miner_names()
    }

    pub fn clear(&self) {
        self.preferences.update(|settings| settings.miner_names.clear());
    }

    /// Notified whenever the underlying settings change.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.preferences.subscribe()
    }

    /// Wait until the current overrides are persisted.
    pub async fn flush(&self) -> Result<(), StorageError> {
        self.preferences.flush().await
    }
}
