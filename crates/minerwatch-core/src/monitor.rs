//! Framework-agnostic monitor service.
//!
//! Wires the registry, receiver, liveness monitor and name overlay
//! together behind the operational controls front-ends use.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::liveness::LivenessMonitor;
use crate::names::NameOverlay;
use crate::publisher::Snapshot;
use crate::receiver::Receiver;
use crate::registry::Registry;
use crate::storage::Preferences;

struct LivenessTask {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct MinerMonitor {
    config: MonitorConfig,
    registry: Arc<Registry>,
    receiver: Receiver,
    names: NameOverlay,
    liveness: Mutex<Option<LivenessTask>>,
}

impl MinerMonitor {
    pub fn new(config: MonitorConfig, preferences: Preferences) -> Self {
        let registry = Arc::new(Registry::new(config.staleness_threshold));
        let names = NameOverlay::new(preferences);
        let receiver = Receiver::new(registry.clone(), names.clone(), config.recv_buffer_size);

        Self {
            config,
            registry,
            receiver,
            names,
            liveness: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Start listening on `port` (no-op if already listening there) and
    /// make sure the liveness monitor is running. Returns the bound port.
    pub async fn start(&self, port: u16) -> Result<u16> {
        let local_port = self.receiver.start(port).await?;

        let mut liveness = self.liveness.lock().await;
        let running = liveness
            .as_ref()
            .map(|l| !l.task.is_finished())
            .unwrap_or(false);
        if !running {
            let cancel = CancellationToken::new();
            let task = LivenessMonitor::new(self.registry.clone(), self.config.sweep_interval)
                .spawn(cancel.clone());
            *liveness = Some(LivenessTask { cancel, task });
        }

        Ok(local_port)
    }

    /// Stop the listener and the liveness monitor. Registry content stays.
    pub async fn stop(&self) {
        self.receiver.stop().await;

        if let Some(liveness) = self.liveness.lock().await.take() {
            liveness.cancel.cancel();
            if let Err(e) = liveness.task.await {
                tracing::warn!("Liveness monitor ended abnormally: {}", e);
            }
        }
    }

    pub async fn restart(&self, port: u16) -> Result<u16> {
        tracing::info!("Restarting listener on port {}", port);
        self.stop().await;
        self.start(port).await
    }

    /// Alias of [`MinerMonitor::stop`] for whole-subsystem teardown.
    pub async fn shutdown(&self) {
        self.stop().await;
    }

    /// Forget every miner and its last-seen history.
    pub fn clear_miners(&self) {
        self.registry.clear_all();
        tracing::info!("Cleared all miners");
    }

    /// Set (or, with a blank name, remove) a miner's custom name.
    ///
    /// Reflected in the snapshot immediately, even before the next packet.
    pub fn set_custom_name(&self, id: &str, name: &str) {
        self.names.set(id, name);
        self.registry.set_custom_name(id, self.names.resolve(id));
    }

    pub fn get_custom_name(&self, id: &str) -> Option<String> {
        self.names.resolve(id)
    }

    /// Remove every custom name, from the overlay and from live records.
    pub fn clear_custom_names(&self) {
        self.names.clear();
        let cleared = self.registry.clear_custom_names();
        tracing::info!("Cleared custom names ({} live record(s) renamed)", cleared);
    }

    /// All custom names, ordered by id.
    pub fn custom_names(&self) -> BTreeMap<String, String> {
        self.names.all()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.registry.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.registry.subscribe()
    }

    pub fn is_listening(&self) -> bool {
        self.receiver.is_listening()
    }

    pub fn listening(&self) -> watch::Receiver<bool> {
        self.receiver.listening()
    }

    pub async fn local_port(&self) -> Option<u16> {
        self.receiver.local_port().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::types::tests::make_device;

    fn monitor() -> MinerMonitor {
        MinerMonitor::new(MonitorConfig::default(), Preferences::ephemeral())
    }

    #[tokio::test]
    async fn test_custom_name_applies_before_next_packet() {
        let monitor = monitor();
        monitor.registry().upsert(make_device("10.0.0.5"));

        monitor.set_custom_name("10.0.0.5", "Rig-A");

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.get("10.0.0.5").unwrap().display_name, "Rig-A");
        assert_eq!(monitor.get_custom_name("10.0.0.5").as_deref(), Some("Rig-A"));
    }

    #[tokio::test]
    async fn test_clearing_custom_name_restores_derived_name() {
        let monitor = monitor();
        monitor.registry().upsert(make_device("10.0.0.5"));
        monitor.set_custom_name("10.0.0.5", "Rig-A");
        monitor.set_custom_name("10.0.0.5", "");

        assert_eq!(monitor.snapshot().get("10.0.0.5").unwrap().display_name, "Miner-5");
        assert_eq!(monitor.get_custom_name("10.0.0.5"), None);
    }

    #[tokio::test]
    async fn test_clear_custom_names_reaches_registry() {
        let monitor = monitor();
        monitor.registry().upsert(make_device("10.0.0.5"));
        monitor.set_custom_name("10.0.0.5", "Rig-A");

        monitor.clear_custom_names();
        assert!(monitor.custom_names().is_empty());
        assert_eq!(monitor.snapshot().get("10.0.0.5").unwrap().display_name, "Miner-5");

        // A fresh report must not bring the old name back
        let device =
            normalize(br#"{"ip": "10.0.0.5", "Name": "nerd"}"#, None, None).unwrap();
        monitor.registry().upsert(device);

        let shown = monitor.snapshot().get("10.0.0.5").unwrap().display_name.clone();
        assert_eq!(shown, "nerd");
        assert_eq!(monitor.get_custom_name("10.0.0.5"), None);
    }

    #[tokio::test]
    async fn test_clear_miners() {
        let monitor = monitor();
        monitor.registry().upsert(make_device("10.0.0.1"));
        monitor.clear_miners();
        assert!(monitor.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_restart_keeps_registry() {
        let monitor = monitor();
        monitor.start(0).await.unwrap();
        monitor.registry().upsert(make_device("10.0.0.1"));

        monitor.restart(0).await.unwrap();
        assert!(monitor.is_listening());
        assert_eq!(monitor.snapshot().len(), 1);

        monitor.shutdown().await;
        assert!(!monitor.is_listening());
        assert_eq!(monitor.snapshot().len(), 1);
    }
}
