//! Custom name management.

use minerwatch_core::{NameOverlay, Preferences};

use crate::cli::{NameArgs, NameCommands};
use crate::error::{CliError, Result};
use crate::output::get_formatter;

/// Run the name command
pub async fn run_name(args: NameArgs, preferences: Preferences, json: bool) -> Result<()> {
    let formatter = get_formatter(json);
    let names = NameOverlay::new(preferences);

    match args.command {
        NameCommands::Set(set) => {
            if set.ip.trim().is_empty() {
                return Err(CliError::InvalidArgument("IP cannot be empty".to_string()));
            }
            names.set(&set.ip, &set.name);
            names.flush().await?;

            let name = names.resolve(&set.ip);
            println!("{}", formatter.format_name(&set.ip, name.as_deref()));
        }
        NameCommands::Get(get) => {
            let name = names.resolve(&get.ip);
            println!("{}", formatter.format_name(&get.ip, name.as_deref()));
        }
        NameCommands::List => {
            println!("{}", formatter.format_names(&names.all()));
        }
        NameCommands::Clear => {
            names.clear();
            names.flush().await?;
            println!("{}", formatter.format_message("All custom names removed"));
        }
    }

    Ok(())
}
