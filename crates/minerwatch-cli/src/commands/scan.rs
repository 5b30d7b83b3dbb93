//! Scan command implementation.

use std::time::Duration;

use chrono::Utc;
use minerwatch_core::{MinerMonitor, MonitorConfig, Preferences};

use crate::cli::ScanArgs;
use crate::error::{CliError, Result};
use crate::output::get_formatter;

/// Run the scan command
pub async fn run_scan(args: ScanArgs, preferences: Preferences, json: bool) -> Result<()> {
    if args.duration == 0 {
        return Err(CliError::InvalidArgument(
            "Duration must be at least 1 second".to_string(),
        ));
    }

    let formatter = get_formatter(json);
    let port = args.port.unwrap_or_else(|| preferences.port());
    let monitor = MinerMonitor::new(MonitorConfig::with_port(port), preferences);
    let bound = monitor.start(port).await?;

    if !json {
        println!("Listening on UDP port {} for {} seconds...", bound, args.duration);
    }

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(args.duration)) => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    monitor.shutdown().await;

    let snapshot = monitor.snapshot();
    println!("{}", formatter.format_snapshot(&snapshot, Utc::now()));

    if snapshot.is_empty() {
        return Err(CliError::NoDevicesFound);
    }

    Ok(())
}
