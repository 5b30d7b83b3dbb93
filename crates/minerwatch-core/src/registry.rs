//! Device registry.
//!
//! Single authority for miner state. Every mutation happens under one
//! lock and republishes the snapshot before the lock is released, so
//! snapshots are published in mutation order.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::publisher::{Snapshot, SnapshotPublisher};
use crate::types::{Device, DeviceStatus};

struct Entry {
    device: Device,
    /// Monotonic receive time, drives liveness
    last_seen: Instant,
}

/// Outcome of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

pub struct Registry {
    entries: Mutex<HashMap<String, Entry>>,
    publisher: SnapshotPublisher,
    staleness_threshold: Duration,
}

impl Registry {
    pub fn new(staleness_threshold: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            publisher: SnapshotPublisher::new(),
            staleness_threshold,
        }
    }

    pub fn staleness_threshold(&self) -> Duration {
        self.staleness_threshold
    }

    /// Insert or replace the record for `device.id`, stamped now.
    pub fn upsert(&self, device: Device) -> Upsert {
        self.upsert_at(device, Instant::now())
    }

    /// Insert or replace the record for `device.id`, received at `now`.
    ///
    /// Marks the record online. A custom name already on the record
    /// survives unless the incoming record carries its own.
    pub fn upsert_at(&self, mut device: Device, now: Instant) -> Upsert {
        let mut entries = self.entries.lock();

        if device.custom_name.is_none() {
            if let Some(prev) = entries.get(&device.id) {
                device.apply_custom_name(prev.device.custom_name.clone());
            }
        }
        device.status = DeviceStatus::Online;
        device.last_seen = Utc::now();

        let id = device.id.clone();
        let outcome = match entries.insert(id, Entry { device, last_seen: now }) {
            Some(_) => Upsert::Replaced,
            None => Upsert::Inserted,
        };

        self.publish_locked(&entries);
        outcome
    }

    pub fn get(&self, id: &str) -> Option<Device> {
        self.entries.lock().get(id).map(|e| e.device.clone())
    }

    /// Monotonic time of the last packet attributed to `id`.
    pub fn last_seen(&self, id: &str) -> Option<Instant> {
        self.entries.lock().get(id).map(|e| e.last_seen)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Current published snapshot. Never blocks on the registry lock.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.publisher.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.publisher.subscribe()
    }

    /// Flip `id` to offline. Returns whether anything changed.
    pub fn mark_offline(&self, id: &str) -> bool {
        let mut entries = self.entries.lock();
        let changed = Self::mark_offline_locked(&mut entries, id);
        if changed {
            self.publish_locked(&entries);
        }
        changed
    }

    /// Demote every online record older than the staleness threshold.
    ///
    /// Publishes once if anything changed; returns the number demoted.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock();

        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, e)| {
                e.device.status.is_online()
                    && now.saturating_duration_since(e.last_seen) > self.staleness_threshold
            })
            .map(|(id, _)| id.clone())
            .collect();

        let demoted = stale
            .iter()
            .filter(|id| Self::mark_offline_locked(&mut entries, id))
            .count();

        if demoted > 0 {
            self.publish_locked(&entries);
        }
        demoted
    }

    /// Apply or clear a custom name on an existing record in place.
    pub fn set_custom_name(&self, id: &str, name: Option<String>) -> bool {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(id) else {
            return false;
        };
        entry.device.apply_custom_name(name);
        self.publish_locked(&entries);
        true
    }

    /// Drop the custom name from every record. Publishes once if any record
    /// carried one; returns how many did.
    pub fn clear_custom_names(&self) -> usize {
        let mut entries = self.entries.lock();

        let mut cleared = 0;
        for entry in entries.values_mut() {
            if entry.device.custom_name.is_some() {
                entry.device.apply_custom_name(None);
                cleared += 1;
            }
        }

        if cleared > 0 {
            self.publish_locked(&entries);
        }
        cleared
    }

    /// Remove every record and its last-seen history.
    pub fn clear_all(&self) {
        let mut entries = self.entries.lock();
        entries.clear();
        self.publish_locked(&entries);
    }

    fn mark_offline_locked(entries: &mut HashMap<String, Entry>, id: &str) -> bool {
        match entries.get_mut(id) {
            Some(entry) if entry.device.status.is_online() => {
                entry.device.status = DeviceStatus::Offline;
                true
            }
            _ => false,
        }
    }

    fn publish_locked(&self, entries: &HashMap<String, Entry>) {
        let mut devices: Vec<Device> = entries.values().map(|e| e.device.clone()).collect();
        sort_devices(&mut devices);
        self.publisher.publish(devices);
    }
}

/// Online before offline, then id ascending.
pub fn sort_devices(devices: &mut [Device]) {
    devices.sort_by(|a, b| {
        b.status
            .is_online()
            .cmp(&a.status.is_online())
            .then_with(|| a.id.cmp(&b.id))
    });
}
