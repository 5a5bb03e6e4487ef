//! Background and shutdown syncs.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{SyncEngine, SyncReport};
use crate::remote::RemoteFileApi;
use crate::store::SessionStore;

/// Handle to a running periodic sync loop.
///
/// Dropping the handle also stops the loop at its next wait.
#[derive(Debug)]
pub struct PeriodicSync {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PeriodicSync {
    /// Ask the loop to stop and wait for it.
    ///
    /// A sync already in progress runs to completion first; the loop only
    /// checks for shutdown while waiting for the next tick.
    pub async fn shutdown(self) {
        self.shutdown_tx.send_replace(true);
        if let Err(error) = self.task.await {
            tracing::warn!("Periodic sync task ended abnormally: {}", error);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Run [`SyncEngine::sync`] every `period` until [`PeriodicSync::shutdown`].
///
/// The first sync happens one full period after spawning. Failures are
/// logged and the loop keeps going.
pub fn spawn_periodic_sync<S, A>(engine: SyncEngine<S, A>, period: Duration) -> PeriodicSync
where
    S: SessionStore,
    A: RemoteFileApi,
{
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.changed() => {
                    tracing::debug!("Periodic sync stopping");
                    break;
                }
            }
            tracing::debug!("Periodic sync tick");
            if let Err(error) = engine.sync().await {
                tracing::warn!("Periodic sync failed: {}", error);
            }
        }
    });

    PeriodicSync { shutdown_tx, task }
}

/// Best-effort sync before shutdown. Failure is logged, never returned.
pub async fn final_sync<S, A>(engine: &SyncEngine<S, A>) -> Option<SyncReport>
where
    S: SessionStore,
    A: RemoteFileApi,
{
    match engine.sync().await {
        Ok(report) => Some(report),
        Err(error) => {
            tracing::warn!("Final sync before shutdown failed: {}", error);
            None
        }
    }
}
