//! Saved listening port.

use minerwatch_core::Preferences;

use crate::cli::{PortArgs, PortCommands};
use crate::error::Result;
use crate::output::get_formatter;

/// Run the port command
pub async fn run_port(args: PortArgs, preferences: Preferences, json: bool) -> Result<()> {
    let formatter = get_formatter(json);

    match args.command {
        PortCommands::Get => {}
        PortCommands::Set(set) => {
            preferences.set_port(set.port)?;
            preferences.flush().await?;
        }
    }

    println!("{}", formatter.format_port(preferences.port()));
    Ok(())
}
