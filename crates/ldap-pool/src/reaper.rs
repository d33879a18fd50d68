//! Background eviction of stale idle connections.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::connection::DirectoryConnection;
use crate::pool::{Pool, PoolInner};

const MIN_REAP_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a running idle reaper.
///
/// The reaper stops when [`stop`](ReaperHandle::stop) is called, when the
/// pool shuts down, or when the last [`Pool`] handle is dropped. Dropping the
/// handle itself does not stop the task.
#[derive(Debug)]
pub struct ReaperHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Stop the reaper and wait for it to finish.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "idle reaper task failed");
        }
    }

    /// Check if the reaper task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<C: DirectoryConnection> Pool<C> {
    /// Spawn a task that evicts idle connections every `interval`.
    ///
    /// An idle connection is evicted once it has been idle longer than
    /// `idle_timeout` or has lived longer than `max_lifetime`. Checked-out
    /// connections are never touched. Evicted connections are torn down
    /// outside the pool lock and free their capacity once closed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_reaper(&self, interval: Duration) -> ReaperHandle {
        let token = self.inner().shutdown_token().child_token();
        let pool = Arc::downgrade(self.inner());
        let name = self.name().to_owned();
        let interval = interval.max(MIN_REAP_INTERVAL);

        tracing::debug!(pool = %name, ?interval, "starting idle reaper");

        let task = tokio::spawn(run(pool, token.clone(), interval, name));
        ReaperHandle { token, task }
    }
}

async fn run<C: DirectoryConnection>(
    pool: Weak<PoolInner<C>>,
    token: CancellationToken,
    interval: Duration,
    name: String,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            () = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(inner) = pool.upgrade() else {
            break;
        };

        // A stuck teardown must not keep the reaper from stopping.
        tokio::select! {
            () = token.cancelled() => break,
            _ = inner.reap() => {}
        }
    }

    tracing::debug!(pool = %name, "idle reaper stopped");
}
