//! Cached player state and the state-change hook

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::entity::MediaPlayerState;

/// Point-in-time copy of a player's cached fields
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub state: MediaPlayerState,
    /// Normalized volume, 0.0..=1.0
    pub volume: f64,
    pub muted: bool,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            state: MediaPlayerState::Off,
            volume: 0.0,
            muted: false,
        }
    }
}

/// Notification hook invoked after every cache mutation and every refresh.
///
/// The host decides what "writing state" means: pushing to a UI, a bus, a
/// channel. Implementations must not block.
pub trait StateWriter: Send + Sync {
    fn write_state(&self, snapshot: PlayerSnapshot);
}

impl<F> StateWriter for F
where
    F: Fn(PlayerSnapshot) + Send + Sync,
{
    fn write_state(&self, snapshot: PlayerSnapshot) {
        self(snapshot)
    }
}

/// Discards notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStateWriter;

impl StateWriter for NoopStateWriter {
    fn write_state(&self, _snapshot: PlayerSnapshot) {}
}

/// Publishes every notification on a `tokio::sync::watch` channel
#[derive(Debug)]
pub struct WatchStateWriter {
    sender: watch::Sender<PlayerSnapshot>,
}

impl WatchStateWriter {
    /// Create the writer along with a first receiver
    pub fn new() -> (Self, watch::Receiver<PlayerSnapshot>) {
        let (sender, receiver) = watch::channel(PlayerSnapshot::default());
        (Self { sender }, receiver)
    }

    /// Additional receiver observing the same channel
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.sender.subscribe()
    }
}

impl StateWriter for WatchStateWriter {
    fn write_state(&self, snapshot: PlayerSnapshot) {
        // send_replace keeps the value even when no receiver is alive
        self.sender.send_replace(snapshot);
    }
}
