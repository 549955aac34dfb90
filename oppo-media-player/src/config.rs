//! Config entries and player setup
//!
//! A config entry is the host's stored record for one device. On disk it is
//! JSON of the form:
//!
//! ```json
//! { "entry_id": "living-room", "data": { "host": "192.168.1.60" } }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use oppo_api::{TelnetConfig, DEFAULT_PORT};
use serde::{Deserialize, Serialize};

use crate::error::PlayerError;
use crate::player::OppoMediaPlayer;
use crate::state::StateWriter;

const DEFAULT_SCAN_INTERVAL_SECS: u64 = 10;

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL_SECS
}

/// Connection and polling settings for one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Address of the player
    pub host: String,
    /// Telnet port, 23 unless talking to a test rig
    #[serde(default = "default_port")]
    pub port: u16,
    /// Optional per-exchange timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Interval between scheduled state refreshes
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
}

impl PlayerConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            timeout_ms: None,
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
        }
    }

    /// Build from `OPPO_HOST`, `OPPO_PORT`, `OPPO_TIMEOUT_MS` and
    /// `OPPO_SCAN_INTERVAL`
    pub fn from_env() -> Result<Self, PlayerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PlayerError> {
        let host = lookup("OPPO_HOST").ok_or(PlayerError::MissingConfig("OPPO_HOST"))?;
        let mut config = Self::new(host);

        if let Some(port) = lookup("OPPO_PORT") {
            config.port = parse_value("OPPO_PORT", &port)?;
        }
        if let Some(timeout) = lookup("OPPO_TIMEOUT_MS") {
            config.timeout_ms = Some(parse_value("OPPO_TIMEOUT_MS", &timeout)?);
        }
        if let Some(interval) = lookup("OPPO_SCAN_INTERVAL") {
            config.scan_interval_secs = parse_value("OPPO_SCAN_INTERVAL", &interval)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the settings can produce a working player
    pub fn validate(&self) -> Result<(), PlayerError> {
        if self.host.trim().is_empty() {
            return Err(PlayerError::InvalidConfig {
                key: "host",
                value: self.host.clone(),
            });
        }
        if self.port == 0 {
            return Err(PlayerError::InvalidConfig {
                key: "port",
                value: "0".to_string(),
            });
        }
        if self.scan_interval_secs == 0 {
            return Err(PlayerError::InvalidConfig {
                key: "scan_interval_secs",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Transport settings derived from this config
    pub fn telnet_config(&self) -> TelnetConfig {
        TelnetConfig {
            port: self.port,
            timeout: self.timeout_ms.map(Duration::from_millis),
            ..TelnetConfig::default()
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }
}

fn parse_value<V: std::str::FromStr>(key: &'static str, raw: &str) -> Result<V, PlayerError> {
    raw.trim().parse().map_err(|_| PlayerError::InvalidConfig {
        key,
        value: raw.to_string(),
    })
}

/// The host's stored record for one configured device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    pub data: PlayerConfig,
}

impl ConfigEntry {
    pub fn new(data: PlayerConfig) -> Self {
        Self {
            entry_id: None,
            data,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PlayerError> {
        let entry: Self = serde_json::from_str(json)?;
        entry.data.validate()?;
        Ok(entry)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlayerError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| PlayerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Create the entities for a config entry.
///
/// One entry always yields exactly one player.
pub fn setup_entry(entry: &ConfigEntry, writer: Arc<dyn StateWriter>) -> Vec<OppoMediaPlayer> {
    tracing::info!(host = %entry.data.host, "setting up Oppo telnet media player");
    vec![OppoMediaPlayer::from_config(&entry.data, writer)]
}
