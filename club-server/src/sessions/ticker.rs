//! Display ticker for running sessions
//!
//! Periodically recomputes elapsed play time for every RUNNING session and
//! broadcasts it as a `Tick` event. Read-side and best-effort only: it
//! never persists, never blocks a transition, and can be cancelled at any
//! point without losing time, since authoritative elapsed time is always
//! derived from the snapshot's own fields.

use super::manager::SessionManager;
use crate::storage::StorageResult;
use parking_lot::RwLock;
use shared::session::SessionEvent;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Periodic elapsed-time broadcaster.
pub struct SessionTicker {
    manager: Arc<SessionManager>,
    interval: Duration,
    shutdown: CancellationToken,
    /// Last broadcast value per table, to skip unchanged seconds
    last_broadcast: RwLock<HashMap<String, i64>>,
}

impl SessionTicker {
    pub fn new(manager: Arc<SessionManager>, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            manager,
            interval,
            shutdown,
            last_broadcast: RwLock::new(HashMap::new()),
        }
    }

    /// Run until cancelled. A failing pass is logged and the next tick
    /// retries; display updates are not worth failing the task over.
    pub async fn run(self) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Session ticker started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.tick() {
                        tracing::error!(error = %e, "Ticker pass failed");
                    }
                }
            }
        }

        tracing::info!("Session ticker stopped");
    }

    /// One pass: broadcast elapsed time for running sessions that moved.
    fn tick(&self) -> StorageResult<()> {
        let now = shared::util::now_millis();
        let sessions = self.manager.storage().list_sessions()?;

        let mut seen = self.last_broadcast.write();
        seen.retain(|table_id, _| {
            sessions
                .iter()
                .any(|s| s.is_running() && s.table_id == *table_id)
        });

        for session in sessions.iter().filter(|s| s.is_running()) {
            let elapsed = session.elapsed_at(now);
            if seen.get(&session.table_id) == Some(&elapsed) {
                continue;
            }
            seen.insert(session.table_id.clone(), elapsed);
            self.manager.emit(SessionEvent::Tick {
                table_id: session.table_id.clone(),
                elapsed_seconds: elapsed,
            });
        }

        Ok(())
    }
}
