//! Liveness monitor.
//!
//! Demotes miners that have gone quiet. Runs on its own timer, independent
//! of packet arrival, and only ever flips status; records are never removed.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::registry::Registry;

pub struct LivenessMonitor {
    registry: Arc<Registry>,
    sweep_interval: Duration,
}

impl LivenessMonitor {
    pub fn new(registry: Arc<Registry>, sweep_interval: Duration) -> Self {
        Self {
            registry,
            sweep_interval,
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Sweep every `sweep_interval` until cancelled. The first sweep runs
    /// immediately.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(
            "Liveness monitor started (sweep every {:?}, stale after {:?})",
            self.sweep_interval,
            self.registry.staleness_threshold()
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let demoted = self.registry.sweep(Instant::now());
                    if demoted > 0 {
                        tracing::info!("{} miner(s) went offline", demoted);
                    }
                }
            }
        }

        tracing::debug!("Liveness monitor stopped");
    }
}
