//! Periodic state refresh
//!
//! Hosts without their own polling loop can hand an entity to an
//! [`UpdateScheduler`], which calls [`MediaPlayerEntity::update`] on a fixed
//! interval until shut down.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::entity::MediaPlayerEntity;
use crate::error::PlayerError;

/// Background task refreshing one entity
#[derive(Debug)]
pub struct UpdateScheduler {
    interval: Duration,
    task_handle: JoinHandle<()>,
    shutdown_signal: watch::Sender<bool>,
    started_at: SystemTime,
    update_count: Arc<AtomicU64>,
}

impl UpdateScheduler {
    /// Spawn the refresh loop. The first update runs immediately.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn start<E>(entity: Arc<E>, interval: Duration) -> Self
    where
        E: MediaPlayerEntity + ?Sized + 'static,
    {
        let (shutdown_signal, shutdown_rx) = watch::channel(false);
        let update_count = Arc::new(AtomicU64::new(0));
        let task_count = Arc::clone(&update_count);

        let task_handle = tokio::spawn(async move {
            Self::update_loop(entity, interval, shutdown_rx, task_count).await;
        });

        Self {
            interval,
            task_handle,
            shutdown_signal,
            started_at: SystemTime::now(),
            update_count,
        }
    }

    async fn update_loop<E>(
        entity: Arc<E>,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
        update_count: Arc<AtomicU64>,
    ) where
        E: MediaPlayerEntity + ?Sized,
    {
        let unique_id = entity.unique_id();
        tracing::debug!(entity = %unique_id, ?interval, "starting update loop");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    entity.update().await;
                    update_count.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(entity = %unique_id, state = %entity.state(), "state refreshed");
                }
                changed = shutdown_rx.changed() => {
                    // A dropped sender also ends the loop
                    let stop = changed.is_err() || *shutdown_rx.borrow();
                    if stop {
                        break;
                    }
                }
            }
        }

        tracing::debug!(entity = %unique_id, "update loop ended");
    }

    /// Interval between refreshes
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        !self.task_handle.is_finished()
    }

    pub fn stats(&self) -> UpdateStats {
        UpdateStats {
            interval: self.interval,
            started_at: self.started_at,
            update_count: self.update_count.load(Ordering::Relaxed),
            is_running: self.is_running(),
        }
    }

    /// Stop the loop and wait for it to finish.
    ///
    /// An update already in flight completes first.
    pub async fn shutdown(self) -> Result<(), PlayerError> {
        let _ = self.shutdown_signal.send(true);

        self.task_handle
            .await
            .map_err(|e| PlayerError::Scheduler(format!("Failed to await update loop: {}", e)))
    }
}

/// Statistics for an update loop
#[derive(Debug, Clone)]
pub struct UpdateStats {
    pub interval: Duration,
    pub started_at: SystemTime,
    pub update_count: u64,
    pub is_running: bool,
}
