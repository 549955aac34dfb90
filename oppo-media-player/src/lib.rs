//! # Oppo media player entity
//!
//! Exposes an Oppo UDP-203 Blu-ray player to a home-automation host as a
//! media player entity, driving the device over its telnet command protocol.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use oppo_media_player::{MediaPlayerEntity, OppoMediaPlayer, WatchStateWriter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (writer, mut changes) = WatchStateWriter::new();
//!     let player = OppoMediaPlayer::from_config(
//!         &oppo_media_player::PlayerConfig::new("192.168.1.60"),
//!         Arc::new(writer),
//!     );
//!
//!     player.turn_on().await;
//!     player.set_volume_level(0.35).await;
//!
//!     changes.changed().await.ok();
//!     println!("{:?}", *changes.borrow());
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! oppo-media-player (entity, cache, setup, scheduling)
//!     ↓
//! oppo-api (typed commands and response parsing)
//!     ↓
//! telnet-client (one TCP connection per command)
//! ```
//!
//! Commands and refreshes never return errors. Failures are logged through
//! `tracing` and the cached state is left as it was.

pub mod config;
pub mod entity;
pub mod logging;

mod error;
mod player;
mod scheduler;
mod state;

pub use config::{setup_entry, ConfigEntry, PlayerConfig};
pub use entity::{
    DeviceInfo, MediaPlayerDeviceClass, MediaPlayerEntity, MediaPlayerEntityFeature,
    MediaPlayerState, DOMAIN,
};
pub use error::PlayerError;
pub use player::{volume_to_percent, OppoMediaPlayer, Reply};
pub use scheduler::{UpdateScheduler, UpdateStats};
pub use state::{NoopStateWriter, PlayerSnapshot, StateWriter, WatchStateWriter};

pub use oppo_api::{Command, OppoClient, TelnetConfig, Transport};
