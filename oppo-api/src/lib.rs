//! High-level Oppo API for device control
//!
//! This crate provides a typed view of the Oppo UDP-20x telnet control
//! protocol. It uses the private `telnet-client` crate for the low-level
//! connection-per-command exchange.
//!
//! ```rust,no_run
//! use oppo_api::{Command, OppoClient, PlaybackStatus};
//!
//! # async fn run() -> oppo_api::Result<()> {
//! let client = OppoClient::new();
//! client.send("192.168.1.60", &Command::Play).await?;
//!
//! let response = client.query("192.168.1.60", &Command::QueryPlayback).await?;
//! if PlaybackStatus::from_response(&response) == Some(PlaybackStatus::Playing) {
//!     println!("playing");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod command;
pub mod error;
pub mod response;

pub use client::{OppoClient, Transport};
pub use command::{Command, MAX_VOLUME};
pub use error::{ApiError, Result, ValidationError};
pub use response::{is_success, parse_volume, PlaybackStatus, PowerStatus, SUCCESS_MARKER};

pub use telnet_client::{TelnetClient, TelnetConfig, DEFAULT_PORT};
