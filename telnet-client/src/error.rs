//! Error types for the telnet client

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a single command exchange
#[derive(Debug, Error)]
pub enum TelnetError {
    /// Could not open the TCP connection
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing or flushing the command failed
    #[error("Failed to write command: {0}")]
    Write(#[source] std::io::Error),

    /// Reading the response failed
    #[error("Failed to read response: {0}")]
    Read(#[source] std::io::Error),

    /// The response bytes were not valid UTF-8
    #[error("Failed to decode response: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// The exchange did not finish within the configured timeout
    #[error("Exchange timed out after {0:?}")]
    Timeout(Duration),
}
