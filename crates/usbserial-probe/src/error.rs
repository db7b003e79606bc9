//! Error types for USB serial probing

use thiserror::Error;

/// Errors raised at the edges of detection
///
/// Resolution itself never fails: every variant here is reported by a
/// collaborator (device listing, port opening, configuration parsing) and
/// turned into "no match" by the prober.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Failed to enumerate attached devices
    #[error("failed to enumerate devices: {0}")]
    EnumerationFailed(#[from] serialport::Error),

    /// Failed to open a device
    #[error("failed to open {device}: {reason}")]
    OpenFailed { device: String, reason: String },

    /// Malformed `vvvv:pppp` identifier
    #[error("invalid USB id {0:?}: expected vvvv:pppp in hex")]
    InvalidUsbId(String),
}
