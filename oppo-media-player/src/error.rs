use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while setting up a player.
///
/// Command and refresh calls never return errors to the host; this type only
/// covers configuration and scheduling.
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("API error: {0}")]
    ApiError(#[from] oppo_api::ApiError),

    #[error("Failed to read config entry {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config entry: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Missing configuration value: {0}")]
    MissingConfig(&'static str),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfig { key: &'static str, value: String },

    #[error("Update scheduler stopped unexpectedly: {0}")]
    Scheduler(String),
}
