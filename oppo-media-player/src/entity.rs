//! Host capability contract
//!
//! The home-automation host talks to media players through this small,
//! framework-neutral surface: identity and metadata, read accessors for the
//! cached state, command entry points and a periodic update hook.

use std::collections::BTreeSet;

use async_trait::async_trait;
use bitflags::bitflags;
use oppo_api::PlaybackStatus;
use serde::{Deserialize, Serialize};

use crate::state::PlayerSnapshot;

/// Integration domain, used as the first element of device identifiers
pub const DOMAIN: &str = "oppo_telnet";

/// State of a media player as shown by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaPlayerState {
    /// Device is powered off (or believed to be)
    Off,
    /// Powered on, nothing playing
    Idle,
    /// Currently playing
    Playing,
    /// Playback is paused
    Paused,
}

impl Default for MediaPlayerState {
    fn default() -> Self {
        MediaPlayerState::Off
    }
}

impl From<PlaybackStatus> for MediaPlayerState {
    fn from(status: PlaybackStatus) -> Self {
        match status {
            PlaybackStatus::Playing => MediaPlayerState::Playing,
            PlaybackStatus::Paused => MediaPlayerState::Paused,
            PlaybackStatus::Stopped => MediaPlayerState::Idle,
        }
    }
}

impl std::fmt::Display for MediaPlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MediaPlayerState::Off => "off",
            MediaPlayerState::Idle => "idle",
            MediaPlayerState::Playing => "playing",
            MediaPlayerState::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Device class hint for host UIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaPlayerDeviceClass {
    Tv,
    Speaker,
    Receiver,
}

bitflags! {
    /// Capabilities a media player declares to the host.
    ///
    /// Bit values follow the host's media player feature numbering.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MediaPlayerEntityFeature: u32 {
        const PAUSE = 1;
        const VOLUME_SET = 1 << 2;
        const VOLUME_MUTE = 1 << 3;
        const PREVIOUS_TRACK = 1 << 4;
        const NEXT_TRACK = 1 << 5;
        const TURN_ON = 1 << 7;
        const TURN_OFF = 1 << 8;
        const STOP = 1 << 12;
        const PLAY = 1 << 14;
    }
}

/// Device registry metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// `(domain, id)` pairs identifying the physical device
    pub identifiers: BTreeSet<(String, String)>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

/// The contract a media player entity fulfils for the host.
///
/// Command methods never fail from the host's perspective: transport and
/// protocol problems are logged and leave the cached state untouched.
#[async_trait]
pub trait MediaPlayerEntity: Send + Sync {
    /// Stable identifier, unique per device
    fn unique_id(&self) -> String;

    /// Human-readable name
    fn name(&self) -> String;

    fn device_class(&self) -> MediaPlayerDeviceClass;

    fn supported_features(&self) -> MediaPlayerEntityFeature;

    fn device_info(&self) -> DeviceInfo;

    /// Cached playback/power state
    fn state(&self) -> MediaPlayerState;

    /// Cached volume in 0.0..=1.0
    fn volume_level(&self) -> f64;

    fn is_volume_muted(&self) -> bool;

    /// All cached fields at once
    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            state: self.state(),
            volume: self.volume_level(),
            muted: self.is_volume_muted(),
        }
    }

    async fn set_volume_level(&self, volume: f64);

    async fn media_play(&self);

    async fn media_stop(&self);

    async fn media_pause(&self);

    async fn media_next_track(&self);

    async fn media_previous_track(&self);

    async fn turn_on(&self);

    async fn turn_off(&self);

    async fn mute_volume(&self, mute: bool);

    /// Resynchronize the cached state with the device.
    ///
    /// Hosts call this on a schedule; see [`crate::UpdateScheduler`].
    async fn update(&self);
}
