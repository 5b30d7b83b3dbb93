//! Command implementations.

pub mod name;
pub mod port;
pub mod scan;
pub mod watch;

pub use name::run_name;
pub use port::run_port;
pub use scan::run_scan;
pub use watch::run_watch;

use std::path::PathBuf;
use std::sync::Arc;

use minerwatch_core::storage::default_data_dir;
use minerwatch_core::{FileSettingsStore, Preferences};

use crate::error::{CliError, Result};

/// Open the settings store in `data_dir`, or the platform default.
pub async fn load_preferences(data_dir: Option<PathBuf>) -> Result<Preferences> {
    let dir = data_dir
        .or_else(default_data_dir)
        .ok_or_else(|| CliError::Other("Could not determine a data directory".to_string()))?;

    let store = FileSettingsStore::new(dir)?;
    tracing::debug!("Using settings file {}", store.path().display());

    Ok(Preferences::load(Arc::new(store)).await)
}
