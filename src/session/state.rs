//! Shared session state: the last telemetry snapshot and the halt latch.
//!
//! The heartbeat task and any number of host calls read and write this
//! concurrently. The snapshot is replaced whole under a lock, so readers never
//! observe a partially written snapshot. The halt flag only ever goes from
//! `false` to `true`.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::telemetry::TelemetrySnapshot;

/// Snapshot cache and halt latch for one session.
///
/// ```
/// use kuneo::session::SessionState;
///
/// # tokio_test::block_on(async {
/// let state = SessionState::new();
/// assert!(state.last_snapshot().await.is_none());
/// assert!(state.latch_halt());
/// assert!(!state.latch_halt());
/// assert!(state.is_halted());
/// # })
/// ```
#[derive(Debug, Default)]
pub struct SessionState {
    last_snapshot: RwLock<Option<TelemetrySnapshot>>,
    halted: AtomicBool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached snapshot. Last writer wins.
    pub async fn record_snapshot(&self, snapshot: TelemetrySnapshot) {
        *self.last_snapshot.write().await = Some(snapshot);
    }

    /// Clone of the cached snapshot, if any telemetry was attempted yet.
    pub async fn last_snapshot(&self) -> Option<TelemetrySnapshot> {
        self.last_snapshot.read().await.clone()
    }

    /// Latch the halt flag. Returns `true` if this call performed the
    /// transition, `false` if the session was already halted.
    pub fn latch_halt(&self) -> bool {
        !self.halted.swap(true, Ordering::SeqCst)
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }
}
