//! Error types for MinerWatch core.

use thiserror::Error;

/// Core error type for shared operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Receiver error: {0}")]
    Receiver(#[from] ReceiverError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Payload normalization failures.
///
/// `NotJson` is the expected outcome for control traffic sharing the port
/// (e.g. discovery probes) and is dropped without being reported.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Payload is not a JSON object")]
    NotJson,

    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("JSON payload is not an object")]
    NotAnObject,

    #[error("Cannot determine miner address")]
    MissingAddress,
}

impl NormalizeError {
    /// Whether this failure belongs to expected non-status traffic.
    pub fn is_silent(&self) -> bool {
        matches!(self, NormalizeError::NotJson)
    }
}

/// Datagram receiver errors
#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("Failed to bind UDP port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Socket error: {0}")]
    Socket(#[from] std::io::Error),
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access storage directory: {0}")]
    DirectoryAccess(String),

    #[error("Invalid port {0}: expected a value between 1024 and 65535")]
    InvalidPort(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
