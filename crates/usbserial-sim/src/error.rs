//! Error types for the simulated host

use thiserror::Error;

/// Errors that can occur while building a simulated host
#[derive(Debug, Error)]
pub enum SimError {
    /// Failed to read a device set file
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// Device set JSON is malformed
    #[error("invalid device set: {0}")]
    InvalidDeviceSet(#[from] serde_json::Error),

    /// No attached device has this name
    #[error("no virtual device named {0}")]
    DeviceNotFound(String),

    /// A device with this name is already attached
    #[error("virtual device {0} already attached")]
    DeviceExists(String),
}
