//! The device link seam.
//!
//! The coordinator and the announcer only ever need two things from the
//! serial connection: whether it is up, and a way to send one line.  Keeping
//! that behind a trait lets the application layer run against a recording
//! mock in tests and against `SerialLink` in production.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use pantry_core::{ConnectionState, DeviceCommand};

/// Error type for the serial transport.
///
/// Every variant leaves the link usable: a failed open stays
/// `Disconnected`, a failed read or write resets to `Disconnected`, and the
/// caller may reconnect.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The port could not be opened or configured.
    #[error("failed to open serial port {port}: {reason}")]
    Open { port: String, reason: String },

    /// Reading from the device failed.
    #[error("serial read failed: {0}")]
    Read(#[source] std::io::Error),

    /// Writing to the device failed.
    #[error("serial write failed: {0}")]
    Write(#[source] std::io::Error),

    /// A write did not complete within the configured timeout.
    #[error("serial write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// A write was attempted while the link was not `Connected`.
    #[error("device link is not connected")]
    NotConnected,
}

/// A line-oriented connection to the device.
#[async_trait]
pub trait DeviceLink: Send + Sync {
    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Writes `line` followed by `\n`.  Writes are serialized: the call
    /// returns only after this line has been handed to the device or has
    /// failed.
    ///
    /// # Errors
    ///
    /// [`TransportError::NotConnected`] when the link is down,
    /// [`TransportError::Write`] or [`TransportError::WriteTimeout`] when the
    /// write fails.
    async fn send_line(&self, line: &str) -> Result<(), TransportError>;

    /// Encodes and sends one outbound command.
    async fn send_command(&self, command: &DeviceCommand) -> Result<(), TransportError> {
        self.send_line(&command.encode()).await
    }

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}
