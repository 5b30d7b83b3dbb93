//! Snapshot publication.
//!
//! The current snapshot is an immutable `Arc` swapped wholesale on every
//! registry change, so readers never see a half-applied update and never
//! hold a lock the ingestion path waits on.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::types::Device;

/// Ordered, immutable view of the registry at one point in time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Increments with every publication
    pub revision: u64,
    pub published_at: DateTime<Utc>,
    /// Online first, then by id
    pub devices: Vec<Device>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            revision: 0,
            published_at: Utc::now(),
            devices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn get(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn online_count(&self) -> usize {
        self.devices.iter().filter(|d| d.status.is_online()).count()
    }
}

pub struct SnapshotPublisher {
    tx: watch::Sender<Arc<Snapshot>>,
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(Snapshot::empty()));
        Self { tx }
    }

    /// Replace the current snapshot. Subscribers are woken once.
    pub fn publish(&self, devices: Vec<Device>) -> Arc<Snapshot> {
        let revision = self.tx.borrow().revision + 1;
        let snapshot = Arc::new(Snapshot {
            revision,
            published_at: Utc::now(),
            devices,
        });
        self.tx.send_replace(snapshot.clone());

        tracing::trace!(
            "Published snapshot #{} ({} miners, {} online)",
            revision,
            snapshot.len(),
            snapshot.online_count()
        );
        snapshot
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}
