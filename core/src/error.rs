//! Error types for the portsmanager-core library.

use thiserror::Error;

/// Result type alias for portsmanager operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during port scanning and process management.
#[derive(Error, Debug)]
pub enum Error {
    /// An external tool could not be started (missing, not executable).
    #[error("Failed to launch {program}: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The caller cancelled the scan.
    #[error("Scan cancelled")]
    Cancelled,

    /// Failed to deliver a termination request to a process.
    #[error("Failed to kill process {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    /// Permission denied for an operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The target process does not exist (anymore).
    #[error("Process with PID {0} not found")]
    ProcessNotFound(u32),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
