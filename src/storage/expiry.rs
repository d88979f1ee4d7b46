//! Background Expiry Sweeper
//!
//! Lazy expiry in `get` only catches keys somebody asks for. A key that
//! expires and is never read again would stay in memory forever, so every
//! store runs a sweeper task that drains the expiration heap on a fixed
//! interval.
//!
//! ## Design
//!
//! The sweeper is a Tokio task with two states:
//!
//! ```text
//!            sleep(interval) elapsed
//!   ┌──────┐ ─────────────────────────> ┌──────────┐
//!   │ Idle │                            │ Sweeping │  lock held, pop every
//!   └──────┘ <───────────────────────── └──────────┘  record due by now
//!      │          pass finished
//!      │ shutdown signal
//!      ▼
//!    exit
//! ```
//!
//! A sweep pass takes the store lock once and releases it when the heap's
//! minimum is in the future (or the heap is empty).

use crate::storage::engine::StoreCore;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Shortest interval the sweeper will run at.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryConfig {
    /// Interval between sweeps (default: 1s)
    pub interval: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

impl ExpiryConfig {
    /// Sets the interval between sweeps.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// A handle to a running expiry sweeper.
///
/// When this handle is dropped, the sweeper task is told to stop.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,

    /// The sweeper task, taken by `shutdown` to join it
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ExpirySweeper {
    /// Starts sweeping `core` as a background task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub(crate) fn start<V: Send + 'static>(core: Arc<StoreCore<V>>, config: ExpiryConfig) -> Self {
        let interval = config.interval.max(MIN_INTERVAL);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(sweeper_loop(core, interval, shutdown_rx));

        info!(interval_ms = interval.as_millis(), "Background expiry sweeper started");

        Self {
            shutdown_tx,
            task: Mutex::new(Some(task)),
        }
    }

    /// Signals the sweeper to stop without waiting for it.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!("Background expiry sweeper stopped");
        }
    }

    /// Signals the sweeper to stop and waits until the task has exited.
    pub async fn shutdown(&self) {
        self.stop();

        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Expiry sweeper task ended abnormally");
            }
        }
    }

    /// Returns true while the sweeper task is alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop<V: Send + 'static>(
    core: Arc<StoreCore<V>>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let report = core.sweep_expired();

        if report.evicted > 0 {
            debug!(
                evicted = report.evicted,
                keys_remaining = report.keys_remaining,
                "Expired keys cleaned up"
            );
        }
    }
}
