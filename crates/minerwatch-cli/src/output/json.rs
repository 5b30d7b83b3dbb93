//! JSON-formatted output for CLI.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use minerwatch_core::{Snapshot, STALENESS_THRESHOLD};
use serde::Serialize;
use serde_json::{json, Value};

use super::OutputFormatter;

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }

    fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutput {
    fn format_snapshot(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> String {
        let miners: Vec<Value> = snapshot
            .devices
            .iter()
            .map(|device| {
                let mut value = serde_json::to_value(device).unwrap_or(json!({}));
                if let Value::Object(ref mut map) = value {
                    map.insert(
                        "online".to_string(),
                        json!(device.is_online_at(now, STALENESS_THRESHOLD)),
                    );
                }
                value
            })
            .collect();

        let online = snapshot
            .devices
            .iter()
            .filter(|d| d.is_online_at(now, STALENESS_THRESHOLD))
            .count();

        Self::to_json(&json!({
            "revision": snapshot.revision,
            "publishedAt": snapshot.published_at,
            "miners": miners,
            "count": snapshot.len(),
            "online": online
        }))
    }

    fn format_names(&self, names: &BTreeMap<String, String>) -> String {
        Self::to_json(&json!({
            "names": names,
            "count": names.len()
        }))
    }

    fn format_name(&self, ip: &str, name: Option<&str>) -> String {
        Self::to_json(&json!({
            "ip": ip,
            "name": name
        }))
    }

    fn format_port(&self, port: u16) -> String {
        Self::to_json(&json!({ "port": port }))
    }

    fn format_message(&self, message: &str) -> String {
        Self::to_json(&json!({ "message": message }))
    }
}
