//! Request/response correlation for host round trips.
//!
//! Every side effect a builtin performs travels as a `FsRequest` or
//! `GitRequest` frame and completes when the matching result frame comes
//! back. The bridge mints request ids, parks a one-shot waiter per id, and
//! wakes exactly that waiter when the host answers. Waiters have no
//! timeout of their own; run-level deadlines and aborts cover a host that
//! never replies.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tracing::warn;

use sandbar_protocol::FsOp;
use sandbar_protocol::FsReply;
use sandbar_protocol::GitReply;
use sandbar_protocol::RequestId;
use sandbar_protocol::ShellMessage;

type Waiter<T> = oneshot::Sender<Result<T, String>>;

/// Outbound RPC surface of the shell worker.
pub struct HostBridge {
    tx: mpsc::Sender<ShellMessage>,
    next: AtomicU64,
    pending_fs: Mutex<HashMap<RequestId, Waiter<FsReply>>>,
    pending_git: Mutex<HashMap<RequestId, Waiter<GitReply>>>,
}

impl HostBridge {
    pub fn new(tx: mpsc::Sender<ShellMessage>) -> Self {
        Self {
            tx,
            next: AtomicU64::new(1),
            pending_fs: Mutex::new(HashMap::new()),
            pending_git: Mutex::new(HashMap::new()),
        }
    }

    /// Issue one filesystem operation and wait for the host's verdict.
    pub async fn call_fs(&self, op: FsOp) -> Result<FsReply, String> {
        let id = self.mint();
        let (otx, orx) = oneshot::channel();
        {
            #[allow(clippy::expect_used)]
            let mut pending = self.pending_fs.lock().expect("lock poisoned");
            pending.insert(id, otx);
        }
        let sent = self.tx.send(ShellMessage::FsRequest { id, op }).await;
        if sent.is_err() {
            self.forget_fs(id);
            return Err("host unavailable".to_string());
        }
        match orx.await {
            Ok(outcome) => outcome,
            Err(_) => Err("host dropped the request".to_string()),
        }
    }

    /// Issue one git invocation and wait for the host's verdict.
    pub async fn call_git(&self, args: Vec<String>) -> Result<GitReply, String> {
        let id = self.mint();
        let (otx, orx) = oneshot::channel();
        {
            #[allow(clippy::expect_used)]
            let mut pending = self.pending_git.lock().expect("lock poisoned");
            pending.insert(id, otx);
        }
        let sent = self.tx.send(ShellMessage::GitRequest { id, args }).await;
        if sent.is_err() {
            self.forget_git(id);
            return Err("host unavailable".to_string());
        }
        match orx.await {
            Ok(outcome) => outcome,
            Err(_) => Err("host dropped the request".to_string()),
        }
    }

    /// Deliver a filesystem result to its waiter. Unknown or already
    /// answered ids are logged and dropped.
    pub fn resolve_fs(&self, id: RequestId, outcome: Result<FsReply, String>) {
        let waiter = {
            #[allow(clippy::expect_used)]
            let mut pending = self.pending_fs.lock().expect("lock poisoned");
            pending.remove(&id)
        };
        match waiter {
            Some(otx) => {
                // The caller may have been aborted in the meantime; a dead
                // receiver is fine.
                let _ = otx.send(outcome);
            }
            None => warn!(request = %id, "fs result for unknown request"),
        }
    }

    /// Deliver a git result to its waiter. Unknown or already answered ids
    /// are logged and dropped.
    pub fn resolve_git(&self, id: RequestId, outcome: Result<GitReply, String>) {
        let waiter = {
            #[allow(clippy::expect_used)]
            let mut pending = self.pending_git.lock().expect("lock poisoned");
            pending.remove(&id)
        };
        match waiter {
            Some(otx) => {
                let _ = otx.send(outcome);
            }
            None => warn!(request = %id, "git result for unknown request"),
        }
    }

    fn mint(&self) -> RequestId {
        RequestId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    fn forget_fs(&self, id: RequestId) {
        #[allow(clippy::expect_used)]
        let mut pending = self.pending_fs.lock().expect("lock poisoned");
        pending.remove(&id);
    }

    fn forget_git(&self, id: RequestId) {
        #[allow(clippy::expect_used)]
        let mut pending = self.pending_git.lock().expect("lock poisoned");
        pending.remove(&id);
    }
}

#[cfg(test)]
#[path = "bridge.test.rs"]
mod tests;
