//! Settings persistence.

pub mod settings;

pub use settings::{
    FileSettingsStore, MemorySettingsStore, Preferences, Settings, SettingsStore, SETTINGS_FILE,
};

/// Get the default data directory for MinerWatch.
///
/// Uses the `directories` crate to find the appropriate platform-specific
/// data directory.
pub fn default_data_dir() -> Option<std::path::PathBuf> {
    directories::ProjectDirs::from("", "minerwatch", "minerwatch")
        .map(|dirs| dirs.data_dir().to_path_buf())
}
