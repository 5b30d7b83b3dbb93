//! Error types for MinerWatch CLI.
//!
//! CliError wraps CoreError from the shared library and adds CLI-specific variants.

use minerwatch_core::error::CoreError;
use thiserror::Error;

pub use minerwatch_core::error::{ReceiverError, StorageError};

/// Exit codes for the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NETWORK_ERROR: i32 = 2;
    pub const INVALID_ARGS: i32 = 4;
    pub const NO_DEVICES: i32 = 6;
}

/// Main error type for the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No miners found")]
    NoDevicesFound,

    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(e) => match e {
                CoreError::Receiver(_) => exit_codes::NETWORK_ERROR,
                CoreError::Storage(StorageError::InvalidPort(_)) => exit_codes::INVALID_ARGS,
                _ => exit_codes::GENERAL_ERROR,
            },
            CliError::Io(_) => exit_codes::GENERAL_ERROR,
            CliError::InvalidArgument(_) => exit_codes::INVALID_ARGS,
            CliError::NoDevicesFound => exit_codes::NO_DEVICES,
            CliError::Other(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        CliError::Core(CoreError::Storage(e))
    }
}

impl From<ReceiverError> for CliError {
    fn from(e: ReceiverError) -> Self {
        CliError::Core(CoreError::Receiver(e))
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
