//! Command catalogue for the Oppo telnet protocol
//!
//! Every command is a short ASCII token prefixed with `#`, optionally
//! followed by a space and a numeric argument. The transport appends the
//! terminating carriage return.

use std::fmt;

use crate::error::ValidationError;

/// Highest volume the device accepts
pub const MAX_VOLUME: u8 = 100;

/// A single command understood by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `#QPW` - query power status
    QueryPower,
    /// `#PON` - power on
    PowerOn,
    /// `#POF` - power off
    PowerOff,
    /// `#PLA` - start playback
    Play,
    /// `#STP` - stop playback
    Stop,
    /// `#PAU` - pause playback
    Pause,
    /// `#VOL` - query volume
    QueryVolume,
    /// `#SVL <n>` - set volume to `n` (0-100)
    SetVolume(u8),
    /// `#MUT` - toggle mute
    MuteToggle,
    /// `#NXT` - next track
    NextTrack,
    /// `#PRE` - previous track
    PreviousTrack,
    /// `#QPL` - query playback status
    QueryPlayback,
}

impl Command {
    /// Build a validated `#SVL` command
    pub fn set_volume(level: u8) -> Result<Self, ValidationError> {
        if level > MAX_VOLUME {
            return Err(ValidationError::range_error("volume", 0, MAX_VOLUME, level));
        }
        Ok(Command::SetVolume(level))
    }

    /// The bare command token, without argument
    pub fn code(&self) -> &'static str {
        match self {
            Command::QueryPower => "#QPW",
            Command::PowerOn => "#PON",
            Command::PowerOff => "#POF",
            Command::Play => "#PLA",
            Command::Stop => "#STP",
            Command::Pause => "#PAU",
            Command::QueryVolume => "#VOL",
            Command::SetVolume(_) => "#SVL",
            Command::MuteToggle => "#MUT",
            Command::NextTrack => "#NXT",
            Command::PreviousTrack => "#PRE",
            Command::QueryPlayback => "#QPL",
        }
    }

    /// The full command text as written to the wire (minus `\r`)
    pub fn wire(&self) -> String {
        match self {
            Command::SetVolume(level) => format!("{} {}", self.code(), level),
            other => other.code().to_string(),
        }
    }

    /// Whether the device's answer to this command carries information
    pub fn expects_response(&self) -> bool {
        matches!(
            self,
            Command::QueryPower
                | Command::QueryVolume
                | Command::QueryPlayback
                | Command::SetVolume(_)
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire())
    }
}
