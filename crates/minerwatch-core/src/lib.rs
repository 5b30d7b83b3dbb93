//! MinerWatch core library.
//!
//! Listens for the JSON status broadcasts LAN miners send over UDP and
//! keeps a live, queryable registry of every miner's last-known state.
//!
//! Data flow: socket → [`receiver`] → [`normalize`] → [`registry`] →
//! [`publisher`] → readers. The [`liveness`] monitor demotes miners that
//! go quiet; [`names`] supplies operator-assigned display names.

pub mod config;
pub mod error;
pub mod format;
pub mod liveness;
pub mod monitor;
pub mod names;
pub mod normalize;
pub mod publisher;
pub mod receiver;
pub mod registry;
pub mod storage;
pub mod types;

pub use config::{MonitorConfig, DEFAULT_PORT, STALENESS_THRESHOLD, SWEEP_INTERVAL};
pub use error::{CoreError, NormalizeError, ReceiverError, Result, StorageError};
pub use monitor::MinerMonitor;
pub use names::NameOverlay;
pub use normalize::normalize;
pub use publisher::Snapshot;
pub use registry::Registry;
pub use storage::{FileSettingsStore, Preferences, Settings, SettingsStore};
pub use types::{Device, DeviceStatus};
