//! Ctrl-C → stop accepting, end SSE streams, drain background tasks.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long [`ShutdownCoordinator::drain`] waits before aborting stragglers.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// What happened to the tracked tasks during a drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Tasks that finished on their own.
    pub completed: usize,
    /// Tasks still running at the deadline, aborted.
    pub aborted: usize,
}

/// Owns the root cancellation token and the long-lived server tasks.
///
/// The listener and every SSE stream hang off [`token`](Self::token);
/// keep-alive loops use child tokens of the stream's token.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ShutdownCoordinator {
    /// Coordinator with no tracked tasks.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Clone of the root token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel the root token. Idempotent.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Whether [`trigger`](Self::trigger) has run.
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Keep `handle` so [`drain`](Self::drain) waits for it. Finished tasks
    /// are pruned on each call.
    pub fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock();
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }

    /// Trigger, then wait up to `timeout` for tracked tasks; abort the rest.
    pub async fn drain(&self, timeout: Duration) -> DrainReport {
        self.trigger();
        let handles: Vec<_> = std::mem::take(&mut *self.tasks.lock());
        let total = handles.len();
        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
        info!(tasks = total, ?timeout, "draining");

        if tokio::time::timeout(timeout, futures::future::join_all(handles))
            .await
            .is_ok()
        {
            return DrainReport {
                completed: total,
                aborted: 0,
            };
        }

        let mut aborted = 0;
        for handle in aborts.iter().filter(|h| !h.is_finished()) {
            handle.abort();
            aborted += 1;
        }
        warn!(aborted, "drain deadline passed, aborted remaining tasks");
        DrainReport {
            completed: total - aborted,
            aborted,
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
