//! Parsing of device acknowledgement lines
//!
//! Successful responses carry the `@OK` marker, optionally followed by a
//! status word or a number. Anything else is treated as "no information"
//! rather than an error; only a success line with a malformed value is
//! reported as a [`ApiError::ParseError`].

use serde::{Deserialize, Serialize};

use crate::command::MAX_VOLUME;
use crate::error::ApiError;

/// Marker the device includes in every accepted command or query
pub const SUCCESS_MARKER: &str = "@OK";

const POWER_ON_MARKER: &str = "@OK ON";
const POWER_OFF_MARKER: &str = "@OK OFF";

/// Whether a response carries the success marker
pub fn is_success(response: &str) -> bool {
    response.contains(SUCCESS_MARKER)
}

/// Last whitespace-delimited token of a response
fn trailing_token(response: &str) -> Option<&str> {
    response.split_whitespace().last()
}

/// Power status reported by `#QPW`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerStatus {
    On,
    Off,
}

impl PowerStatus {
    /// Classify a `#QPW` response. `None` when neither marker is present.
    pub fn from_response(response: &str) -> Option<Self> {
        if response.contains(POWER_ON_MARKER) {
            Some(PowerStatus::On)
        } else if response.contains(POWER_OFF_MARKER) {
            Some(PowerStatus::Off)
        } else {
            None
        }
    }
}

/// Playback status reported by `#QPL`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

impl PlaybackStatus {
    /// Classify a `#QPL` response by substring of its lowercased last token.
    ///
    /// Returns `None` for responses without the success marker and for
    /// status words that match none of the known states.
    pub fn from_response(response: &str) -> Option<Self> {
        if !is_success(response) {
            return None;
        }

        let status = trailing_token(response)?.to_lowercase();
        if status.contains("play") {
            Some(PlaybackStatus::Playing)
        } else if status.contains("pause") {
            Some(PlaybackStatus::Paused)
        } else if status.contains("stop") {
            Some(PlaybackStatus::Stopped)
        } else {
            None
        }
    }
}

/// Extract the volume percentage from a `#VOL` response.
///
/// * `Ok(None)` - no success marker, nothing to update
/// * `Ok(Some(n))` - the device reported `n` in 0..=100
/// * `Err(ParseError)` - success marker present but the trailing token is
///   missing, non-numeric or out of range
pub fn parse_volume(response: &str) -> Result<Option<u8>, ApiError> {
    if !is_success(response) {
        return Ok(None);
    }

    let token = trailing_token(response)
        .ok_or_else(|| ApiError::ParseError(format!("missing volume in '{}'", response)))?;

    let level: u8 = token.parse().map_err(|_| {
        ApiError::ParseError(format!("non-numeric volume '{}' in '{}'", token, response))
    })?;

    if level > MAX_VOLUME {
        return Err(ApiError::ParseError(format!(
            "volume {} exceeds {} in '{}'",
            level, MAX_VOLUME, response
        )));
    }

    Ok(Some(level))
}
