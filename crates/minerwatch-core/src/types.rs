//! Type definitions shared by the core and its front-ends.
//!
//! Serialized with camelCase keys so JSON consumers see the same field
//! names the miners' dashboards have always used.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::format;

/// Online/offline status of a miner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, DeviceStatus::Online)
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical record for one miner, keyed by its network address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Network address (primary key)
    pub id: String,
    /// Name reported by or derived from the payload
    pub name: String,
    /// Operator override, if one is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    /// Resolved name: override, else `name`
    pub display_name: String,
    /// Hashrate normalized to KH/s
    #[serde(rename = "hashrateKH")]
    pub hashrate_kh: f64,
    /// Power draw in watts (0 means no data)
    pub power: f64,
    /// Temperature in °C (0 means no data)
    pub temperature: f64,
    pub status: DeviceStatus,
    pub last_seen: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_type: Option<String>,
    /// Hashrate exactly as reported, e.g. "113.1K"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashrate_raw: Option<String>,
    /// Share counters as reported, e.g. "12/1/7.7%"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_shares: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_shares: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<i64>,
    /// WiFi signal strength in dBm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i64>,
    /// Free heap in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_heap: Option<f64>,
    /// Uptime as reported, e.g. "000d 01:23:46"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_in_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Device {
    /// Set or clear the operator override, keeping `display_name` in sync.
    pub fn apply_custom_name(&mut self, custom_name: Option<String>) {
        self.custom_name = custom_name.filter(|n| !n.trim().is_empty());
        self.display_name = self
            .custom_name
            .clone()
            .unwrap_or_else(|| self.name.clone());
    }

    /// Online only if the stored status says so and the last packet is
    /// younger than `threshold`.
    pub fn is_online_at(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        let age = now.signed_duration_since(self.last_seen);
        self.status.is_online()
            && age
                .to_std()
                .map(|age| age < threshold)
                .unwrap_or(true)
    }

    pub fn hashrate_formatted(&self) -> String {
        format!("{:.2} KH/s", self.hashrate_kh)
    }

    pub fn power_formatted(&self) -> String {
        if self.power > 0.0 {
            format!("{:.0} W", self.power)
        } else {
            "N/A".to_string()
        }
    }

    pub fn temperature_formatted(&self) -> String {
        if self.temperature > 0.0 {
            format!("{:.0}°C", self.temperature)
        } else {
            "N/A".to_string()
        }
    }

    pub fn shares_formatted(&self) -> String {
        match (self.accepted_shares, self.rejected_shares, &self.share) {
            (Some(accepted), Some(rejected), _) => format!("{}/{}", accepted, rejected),
            (_, _, Some(raw)) => raw.clone(),
            _ => "N/A".to_string(),
        }
    }

    pub fn uptime_formatted(&self) -> String {
        self.uptime
            .as_deref()
            .map(format::format_uptime)
            .unwrap_or_else(|| "-".to_string())
    }
}
