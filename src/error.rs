// SPDX-License-Identifier: GPL-3.0-only
//! Error types for the crate
//!
//! Resource-acquisition failures are returned synchronously to the caller of
//! the failing operation. Failures inside a readiness dispatch have no caller
//! to return to, so they travel out of the event loop as [`Error::ListenerFault`].

use std::path::PathBuf;

use thiserror::Error;

use crate::device::DeviceAction;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// The device-information subsystem could not be opened
    #[error("Failed to open device-information subsystem: {0}")]
    Init(#[source] std::io::Error),

    /// A monitor could not bind its event socket
    #[error("Failed to subscribe to {event_source} device events: {source}")]
    Subscription {
        event_source: String,
        source: std::io::Error,
    },

    /// The enumeration session could not be opened or scanned
    #[error("Failed to enumerate devices: {0}")]
    Enumeration(#[source] std::io::Error),

    /// `close` was called on a monitor that is already closed
    #[error("Monitor is already closed")]
    AlreadyClosed,

    /// The listener failed while handling a delivered event
    #[error("Listener failed handling {action} event for {}: {source}", .syspath.display())]
    ListenerFault {
        action: DeviceAction,
        syspath: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Poller error
    #[error("Event loop error: {0}")]
    EventLoop(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Error
pub type Result<T> = std::result::Result<T, Error>;
