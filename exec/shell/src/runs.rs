//! Live-run bookkeeping.
//!
//! One entry per in-flight command, keyed by command id. The table is the
//! authority on liveness: `run` envelopes register here (and duplicates are
//! refused), `abort` envelopes cancel through here, and the supervisor
//! removes the entry as the last step before the terminal `exited` frame.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use sandbar_protocol::CommandId;

/// Book entry for one in-flight command.
#[derive(Debug)]
pub struct RunningCommand {
    /// Cancelled on `abort`; the supervisor races it against the work.
    pub cancel: CancellationToken,
    /// When the run was registered.
    pub started_at: Instant,
}

/// All commands currently running, shared between the worker loop and the
/// per-run supervisors.
#[derive(Default)]
pub struct RunTable {
    inner: Mutex<HashMap<CommandId, RunningCommand>>,
}

impl RunTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a run. Returns its cancellation token, or `None` when the
    /// id is already live, in which case the caller must not start it.
    pub fn register(&self, id: &CommandId) -> Option<CancellationToken> {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("lock poisoned");
        if inner.contains_key(id) {
            return None;
        }
        let cancel = CancellationToken::new();
        inner.insert(
            id.clone(),
            RunningCommand {
                cancel: cancel.clone(),
                started_at: Instant::now(),
            },
        );
        Some(cancel)
    }

    /// Cancel a live run. Returns `false` when the id is not live (already
    /// settled, or never started).
    pub fn abort(&self, id: &CommandId) -> bool {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("lock poisoned");
        match inner.get(id) {
            Some(run) => {
                run.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Remove a run from the table once its outcome is decided. After this
    /// call the id can be reused.
    pub fn settle(&self, id: &CommandId) -> Option<RunningCommand> {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.remove(id)
    }

    pub fn is_live(&self, id: &CommandId) -> bool {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("lock poisoned");
        inner.contains_key(id)
    }

    pub fn len(&self) -> usize {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("lock poisoned");
        inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "runs.test.rs"]
mod tests;
