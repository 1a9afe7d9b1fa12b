//! Error types for the capture pipeline and configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while opening or reading a capture interface.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("Insufficient permissions to capture packets (try running as root)")]
    InsufficientPermissions,

    #[error("Failed to create capture channel: {0}")]
    ChannelCreation(String),

    #[error("Unsupported channel type on interface {0}")]
    UnsupportedChannel(String),

    #[error("Read error: {0}")]
    Read(#[from] io::Error),
}

/// Errors raised while assembling the runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid interface mode '{0}' (expected all, first or catch-all)")]
    InvalidSelection(String),
}
