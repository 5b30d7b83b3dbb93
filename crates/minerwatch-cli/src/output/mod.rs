//! Output formatting for CLI results.

pub mod json;
pub mod table;

pub use json::JsonOutput;
pub use table::TableOutput;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use minerwatch_core::Snapshot;

/// Output formatter trait
pub trait OutputFormatter {
    /// Format the miner list as of `now`
    fn format_snapshot(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> String;

    /// Format all custom names
    fn format_names(&self, names: &BTreeMap<String, String>) -> String;

    /// Format a single custom name lookup
    fn format_name(&self, ip: &str, name: Option<&str>) -> String;

    /// Format the saved port
    fn format_port(&self, port: u16) -> String;

    /// Format a generic message
    fn format_message(&self, message: &str) -> String;
}

/// Get the appropriate formatter based on JSON flag
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonOutput::new())
    } else {
        Box::new(TableOutput::new())
    }
}
