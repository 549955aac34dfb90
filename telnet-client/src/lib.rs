//! Private telnet client for Oppo device communication
//!
//! This crate provides a minimal command client for the plaintext control
//! protocol spoken by Oppo UDP-20x players on TCP port 23. Every exchange
//! opens its own connection, writes one carriage-return terminated command,
//! optionally reads a single response buffer, and closes the connection.

mod error;

pub use error::TelnetError;

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Telnet port used by Oppo players
pub const DEFAULT_PORT: u16 = 23;

/// Size of the single read performed for a response
pub const DEFAULT_READ_BUFFER_SIZE: usize = 2048;

/// Connection settings for a [`TelnetClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelnetConfig {
    /// Device port (23 on real hardware)
    pub port: u16,
    /// Maximum number of bytes read for one response
    pub read_buffer_size: usize,
    /// Upper bound for a whole exchange. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for TelnetConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            timeout: None,
        }
    }
}

/// A minimal connection-per-command telnet client
#[derive(Debug, Clone, Default)]
pub struct TelnetClient {
    config: TelnetConfig,
}

impl TelnetClient {
    /// Create a new client with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client with custom settings
    pub fn with_config(config: TelnetConfig) -> Self {
        Self { config }
    }

    /// Settings this client was built with
    pub fn config(&self) -> &TelnetConfig {
        &self.config
    }

    /// Send a command without waiting for a response
    pub async fn send(&self, host: &str, command: &str) -> Result<(), TelnetError> {
        self.exchange(host, command, false).await.map(|_| ())
    }

    /// Send a command and return the trimmed response text
    pub async fn query(&self, host: &str, command: &str) -> Result<String, TelnetError> {
        self.exchange(host, command, true)
            .await
            .map(Option::unwrap_or_default)
    }

    async fn exchange(
        &self,
        host: &str,
        command: &str,
        expect_response: bool,
    ) -> Result<Option<String>, TelnetError> {
        let exchange = self.exchange_once(host, command, expect_response);

        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| TelnetError::Timeout(limit))?,
            None => exchange.await,
        }
    }

    async fn exchange_once(
        &self,
        host: &str,
        command: &str,
        expect_response: bool,
    ) -> Result<Option<String>, TelnetError> {
        let mut connection = Connection::open(host, self.config.port).await?;
        connection.write_command(command).await?;

        let raw = if expect_response {
            Some(connection.read_response(self.config.read_buffer_size).await?)
        } else {
            None
        };

        connection.close().await;

        raw.map(decode_response).transpose()
    }
}

/// One open TCP connection to the device.
///
/// Dropping a `Connection` closes the socket, so early returns through `?`
/// never leak it. [`Connection::close`] additionally performs an orderly
/// shutdown on the success path.
struct Connection {
    stream: TcpStream,
}

impl Connection {
    async fn open(host: &str, port: u16) -> Result<Self, TelnetError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| TelnetError::Connect {
                addr: format!("{}:{}", host, port),
                source,
            })?;
        tracing::trace!(host, port, "telnet connection opened");
        Ok(Self { stream })
    }

    async fn write_command(&mut self, command: &str) -> Result<(), TelnetError> {
        self.stream
            .write_all(&encode_command(command))
            .await
            .map_err(TelnetError::Write)?;
        self.stream.flush().await.map_err(TelnetError::Write)
    }

    async fn read_response(&mut self, buffer_size: usize) -> Result<Vec<u8>, TelnetError> {
        let mut buf = vec![0u8; buffer_size];
        let n = self.stream.read(&mut buf).await.map_err(TelnetError::Read)?;
        buf.truncate(n);
        Ok(buf)
    }

    async fn close(mut self) {
        // The exchange already succeeded; a failed shutdown only means the
        // peer went away first.
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!("telnet shutdown failed: {}", e);
        }
    }
}

/// Frame a command for the wire: the command text followed by `\r`
pub fn encode_command(command: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(command.len() + 1);
    bytes.extend_from_slice(command.as_bytes());
    bytes.push(b'\r');
    bytes
}

/// Decode a raw response buffer into trimmed text
pub fn decode_response(raw: Vec<u8>) -> Result<String, TelnetError> {
    let text = String::from_utf8(raw)?;
    Ok(text.trim().to_string())
}
