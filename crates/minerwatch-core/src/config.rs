//! Monitor configuration and defaults.

use std::time::Duration;

use crate::error::StorageError;

/// Default UDP port miners broadcast their status to
pub const DEFAULT_PORT: u16 = 12345;

/// Age past which an online miner is demoted to offline
pub const STALENESS_THRESHOLD: Duration = Duration::from_secs(30);

/// Cadence of the liveness sweep
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Receive buffer; status reports are well under this
pub const RECV_BUFFER_SIZE: usize = 4096;

/// Lowest port accepted for persisted settings
pub const MIN_PORT: u16 = 1024;

/// Runtime configuration for a [`crate::MinerMonitor`].
///
/// Production code uses [`MonitorConfig::default`]; the timing fields are
/// only shortened in tests.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub port: u16,
    pub staleness_threshold: Duration,
    pub sweep_interval: Duration,
    pub recv_buffer_size: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            staleness_threshold: STALENESS_THRESHOLD,
            sweep_interval: SWEEP_INTERVAL,
            recv_buffer_size: RECV_BUFFER_SIZE,
        }
    }
}

impl MonitorConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }
}

/// Check a port against the recommended range for persisted settings.
pub fn validate_port(port: u16) -> Result<u16, StorageError> {
    if port < MIN_PORT {
        return Err(StorageError::InvalidPort(port));
    }
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.port, 12345);
        assert_eq!(config.staleness_threshold, Duration::from_secs(30));
        assert_eq!(config.sweep_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_validate_port() {
        assert!(validate_port(1024).is_ok());
        assert!(validate_port(65535).is_ok());
        assert!(validate_port(12345).is_ok());
        assert!(matches!(validate_port(80), Err(StorageError::InvalidPort(80))));
        assert!(validate_port(0).is_err());
    }
}
