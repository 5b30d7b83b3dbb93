//! Watch command implementation.

use std::io::{self, Write};
use std::time::Duration;

use chrono::Utc;
use colored::*;
use minerwatch_core::{MinerMonitor, MonitorConfig, Preferences};

use crate::cli::WatchArgs;
use crate::error::{CliError, Result};
use crate::output::{get_formatter, OutputFormatter};

/// Redraw cadence so ages and liveness stay current between reports
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Run the watch command
pub async fn run_watch(args: WatchArgs, preferences: Preferences, json: bool) -> Result<()> {
    let port = args.port.unwrap_or_else(|| preferences.port());
    let monitor = MinerMonitor::new(MonitorConfig::with_port(port), preferences);
    let bound = monitor.start(port).await?;

    let formatter = get_formatter(json);
    let mut snapshots = monitor.subscribe();
    let mut listening = monitor.listening();
    let mut refresh = tokio::time::interval(REFRESH_INTERVAL);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                render(&monitor, formatter.as_ref(), bound, json);
            }
            _ = refresh.tick(), if !json => {
                render(&monitor, formatter.as_ref(), bound, json);
            }
            changed = listening.changed() => {
                if changed.is_err() || !*listening.borrow_and_update() {
                    break Err(CliError::Other(format!(
                        "Listener on port {} stopped unexpectedly",
                        bound
                    )));
                }
            }
        }
    };

    monitor.shutdown().await;
    result
}

fn render(monitor: &MinerMonitor, formatter: &dyn OutputFormatter, port: u16, json: bool) {
    let snapshot = monitor.snapshot();

    if json {
        println!("{}", formatter.format_snapshot(&snapshot, Utc::now()));
    } else {
        // Clear screen and print header
        print!("\x1B[2J\x1B[1;1H");
        println!("{}", format!("MinerWatch - UDP port {}", port).bold());
        println!("{}", "Press Ctrl+C to stop".dimmed());
        println!();
        println!("{}", formatter.format_snapshot(&snapshot, Utc::now()));
    }

    io::stdout().flush().ok();
}
