//! Error types for the virtual keyboard and the input source

use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

use crate::codec::RawEvent;

/// Errors from the uinput output device.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The uinput control file could not be opened
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: Errno,
    },

    /// The kernel refused to create the virtual device
    #[error("Failed to register virtual device '{device}': {source}")]
    Registration {
        device: String,
        #[source]
        source: Errno,
    },

    /// The kernel refused to destroy the virtual device
    #[error("Failed to unregister virtual device '{device}': {source}")]
    Release {
        device: String,
        #[source]
        source: Errno,
    },

    /// Closing the device descriptor failed
    #[error("Failed to close virtual device '{device}': {source}")]
    Close {
        device: String,
        #[source]
        source: Errno,
    },

    /// Writing one record to the device failed
    #[error("Failed to send {event:?} to virtual device '{device}': {source}")]
    Send {
        device: String,
        event: RawEvent,
        #[source]
        source: Errno,
    },

    /// The sink was already released
    #[error("Virtual device '{device}' is closed")]
    Closed { device: String },
}

/// Errors from a physical input device.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open input device {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to grab input device {path}. Is another application using it?")]
    Grab {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read from input device {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
