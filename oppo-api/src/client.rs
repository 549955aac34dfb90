use async_trait::async_trait;
use telnet_client::{TelnetClient, TelnetConfig};

use crate::command::Command;
use crate::error::Result;

/// Byte-level exchange with a device
///
/// This is the seam between the typed command layer and the network. The
/// production implementation is [`TelnetClient`]; tests substitute scripted
/// transports.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write a command and close without reading
    async fn send(&self, host: &str, command: &str) -> Result<()>;

    /// Write a command and return the trimmed response
    async fn query(&self, host: &str, command: &str) -> Result<String>;
}

#[async_trait]
impl Transport for TelnetClient {
    async fn send(&self, host: &str, command: &str) -> Result<()> {
        Ok(TelnetClient::send(self, host, command).await?)
    }

    async fn query(&self, host: &str, command: &str) -> Result<String> {
        Ok(TelnetClient::query(self, host, command).await?)
    }
}

/// A client for executing Oppo commands against actual devices
///
/// This client bridges the typed [`Command`] catalogue and the transport.
/// It holds no connection; every call is an independent exchange.
#[derive(Debug, Clone)]
pub struct OppoClient<T = TelnetClient> {
    transport: T,
}

impl OppoClient<TelnetClient> {
    /// Create a client talking to port 23 with no timeout
    pub fn new() -> Self {
        Self {
            transport: TelnetClient::new(),
        }
    }

    /// Create a client with custom telnet settings
    pub fn with_config(config: TelnetConfig) -> Self {
        Self {
            transport: TelnetClient::with_config(config),
        }
    }
}

impl Default for OppoClient<TelnetClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> OppoClient<T> {
    /// Create a client over a custom transport
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a command without reading a response
    pub async fn send(&self, host: &str, command: &Command) -> Result<()> {
        tracing::debug!(host, command = %command, "sending command");
        self.transport.send(host, &command.wire()).await
    }

    /// Send a command and return the device's response line
    pub async fn query(&self, host: &str, command: &Command) -> Result<String> {
        tracing::debug!(host, command = %command, "querying");
        let response = self.transport.query(host, &command.wire()).await?;
        tracing::debug!(host, command = %command, response = %response, "received response");
        Ok(response)
    }

    /// Run a command, reading a response only when the command produces one
    pub async fn execute(&self, host: &str, command: &Command) -> Result<Option<String>> {
        if command.expects_response() {
            self.query(host, command).await.map(Some)
        } else {
            self.send(host, command).await.map(|_| None)
        }
    }
}
