//! Heartbeat service implementation.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::session::SessionCore;

/// Background task that replays the last telemetry snapshot as a heartbeat.
///
/// The task waits `initial_delay`, then on every tick re-sends the account
/// figures of the cached snapshot (event type forced to `heartbeat`, fresh
/// timestamp, no attestation) and sleeps `interval`. Ticks with nothing cached
/// are skipped but still followed by a full sleep.
///
/// Shutdown is cooperative: [`HeartbeatService::shutdown`] signals the task and
/// waits for it to leave at its next suspension point. Dropping the service
/// without calling `shutdown` closes the signal channel, which the task also
/// treats as a stop request.
pub struct HeartbeatService {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl HeartbeatService {
    /// Spawn the heartbeat loop for `core` on the current runtime.
    pub(crate) fn spawn(core: Arc<SessionCore>, initial_delay: Duration, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            session = %core.id(),
            "Heartbeat service started (interval={:?}, initial_delay={:?})",
            interval,
            initial_delay
        );

        let task = tokio::spawn(run(core, initial_delay, interval, shutdown_rx));

        Self { shutdown_tx, task }
    }

    /// Returns `true` once the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the loop to stop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.task.await {
            if e.is_panic() {
                error!("Heartbeat task panicked: {}", panic_message(&*e.into_panic()));
            }
        }
    }
}

async fn run(
    core: Arc<SessionCore>,
    initial_delay: Duration,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    if !sleep_unless_shutdown(initial_delay, &mut shutdown_rx).await {
        debug!(session = %core.id(), "Heartbeat service stopped before first tick");
        return;
    }

    loop {
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown_rx) => break,
            outcome = AssertUnwindSafe(tick(&core)).catch_unwind() => {
                if let Err(panic) = outcome {
                    error!(session = %core.id(), "Heartbeat tick failed: {}", panic_message(&*panic));
                }
            }
        }

        if !sleep_unless_shutdown(interval, &mut shutdown_rx).await {
            break;
        }
    }

    debug!(session = %core.id(), "Heartbeat service stopped");
}

async fn tick(core: &SessionCore) {
    let Some(cached) = core.state().last_snapshot().await else {
        debug!(session = %core.id(), "No telemetry cached yet, skipping heartbeat");
        return;
    };

    let result = core.send_snapshot(cached.to_heartbeat()).await;
    debug!(
        session = %core.id(),
        status = result.status().unwrap_or("-"),
        "Heartbeat sent"
    );
}

/// Sleep for `duration`. Returns `false` if shutdown was requested first.
async fn sleep_unless_shutdown(duration: Duration, shutdown_rx: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        _ = shutdown_requested(shutdown_rx) => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Resolves once `true` is sent or the sender is gone.
async fn shutdown_requested(shutdown_rx: &mut watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
