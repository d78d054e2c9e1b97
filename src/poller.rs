use crate::snapshot::{
    ContractSnapshot,
    SnapshotSource,
};
use std::{
    sync::Arc,
    time::Duration,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{
        self,
        MissedTickBehavior,
    },
};
use tracing::warn;

/// Shared handle for publishing snapshots. Both the scheduler and the
/// workflow runner's post-confirmation refresh write through this; observers
/// always see the latest completed read, never a partial one.
pub type SnapshotPublisher = Arc<watch::Sender<Option<ContractSnapshot>>>;

pub fn snapshot_channel() -> (SnapshotPublisher, watch::Receiver<Option<ContractSnapshot>>) {
    let (tx, rx) = watch::channel(None);
    (Arc::new(tx), rx)
}

/// Periodically refreshes contract state while mounted.
///
/// A single owned task reads and publishes sequentially, so polls can never
/// overlap and snapshots are published in issue order. A tick that fires
/// while the previous read is still outstanding waits its turn
/// (`MissedTickBehavior::Delay`) instead of racing it. Read failures leave
/// the previous snapshot in place; the next tick retries.
pub struct PollScheduler {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl PollScheduler {
    pub fn spawn<S>(source: Arc<S>, interval: Duration, publisher: SnapshotPublisher) -> Self
    where
        S: SnapshotSource + Send + Sync + 'static,
    {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        match source.read_snapshot().await {
                            Ok(snapshot) => {
                                publisher.send_replace(Some(snapshot));
                            }
                            Err(e) => {
                                warn!(error = %e, "poll tick failed; keeping previous snapshot");
                            }
                        }
                    }
                }
            }
        });
        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Deterministic teardown: signals the task and waits for it to finish
    /// its current poll, leaving no orphaned timer behind.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}
