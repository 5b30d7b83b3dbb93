//! Table-formatted output for CLI.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use minerwatch_core::{Device, Snapshot, STALENESS_THRESHOLD};

use super::OutputFormatter;

pub struct TableOutput;

impl TableOutput {
    pub fn new() -> Self {
        Self
    }

    fn status_cell(online: bool) -> Cell {
        if online {
            Cell::new("online").fg(Color::Green)
        } else {
            Cell::new("offline").fg(Color::Red)
        }
    }

    fn last_seen(device: &Device, now: DateTime<Utc>) -> String {
        let secs = now.signed_duration_since(device.last_seen).num_seconds().max(0);
        match secs {
            0..=59 => format!("{}s ago", secs),
            60..=3599 => format!("{}m ago", secs / 60),
            _ => format!("{}h ago", secs / 3600),
        }
    }
}

impl Default for TableOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TableOutput {
    fn format_snapshot(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> String {
        if snapshot.is_empty() {
            return "No miners found.".to_string();
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            "Status", "IP", "Name", "Hashrate", "Temp", "Power", "Shares", "Uptime", "RSSI",
            "Version", "Seen",
        ]);

        let mut online = 0;
        for device in &snapshot.devices {
            let is_online = device.is_online_at(now, STALENESS_THRESHOLD);
            if is_online {
                online += 1;
            }

            table.add_row(vec![
                Self::status_cell(is_online),
                Cell::new(&device.id),
                Cell::new(&device.display_name),
                Cell::new(device.hashrate_formatted()),
                Cell::new(device.temperature_formatted()),
                Cell::new(device.power_formatted()),
                Cell::new(device.shares_formatted()),
                Cell::new(device.uptime_formatted()),
                Cell::new(device.rssi.map(|r| format!("{} dBm", r)).unwrap_or_default()),
                Cell::new(device.version.as_deref().unwrap_or("")),
                Cell::new(Self::last_seen(device, now)),
            ]);
        }

        let total_kh: f64 = snapshot
            .devices
            .iter()
            .filter(|d| d.is_online_at(now, STALENESS_THRESHOLD))
            .map(|d| d.hashrate_kh)
            .sum();

        format!(
            "{}\n\n{} miner(s), {} online, {:.2} KH/s total",
            table,
            snapshot.len(),
            online.to_string().green(),
            total_kh
        )
    }

    fn format_names(&self, names: &BTreeMap<String, String>) -> String {
        if names.is_empty() {
            return "No custom names set.".to_string();
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["IP", "Name"]);
        for (ip, name) in names {
            table.add_row(vec![Cell::new(ip), Cell::new(name)]);
        }
        table.to_string()
    }

    fn format_name(&self, ip: &str, name: Option<&str>) -> String {
        match name {
            Some(name) => format!("{} -> {}", ip, name.bold()),
            None => format!("{} has no custom name", ip),
        }
    }

    fn format_port(&self, port: u16) -> String {
        format!("Listening port: {}", port)
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_renders_explicit_state() {
        let snapshot = Snapshot {
            revision: 0,
            published_at: Utc::now(),
            devices: Vec::new(),
        };
        assert_eq!(
            TableOutput::new().format_snapshot(&snapshot, Utc::now()),
            "No miners found."
        );
    }

    #[test]
    fn test_empty_names() {
        assert_eq!(
            TableOutput::new().format_names(&BTreeMap::new()),
            "No custom names set."
        );
    }
}
