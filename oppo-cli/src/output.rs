//! Rendering player snapshots for the terminal

use anyhow::{Context, Result};
use oppo_media_player::{volume_to_percent, PlayerSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn render(snapshot: &PlayerSnapshot, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!(
            "state: {}  volume: {}%{}",
            snapshot.state,
            volume_to_percent(snapshot.volume),
            if snapshot.muted { "  (muted)" } else { "" }
        )),
        OutputFormat::Json => {
            serde_json::to_string(snapshot).context("Failed to serialize player state")
        }
    }
}
