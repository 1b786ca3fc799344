//! Metered output channel for one command invocation.
//!
//! Builtins never talk to the transport directly. They write lines through
//! an [`OutputSink`], which applies the invocation's [`OutputBudget`] and
//! forwards what survives as [`ShellMessage`] frames. The sink is cheap to
//! clone; all clones share the same budget.

use std::sync::Arc;
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::budget::Emit;
use crate::budget::OutputBudget;
use crate::budget::StreamKind;
use sandbar_protocol::CommandId;
use sandbar_protocol::FetchPhase;
use sandbar_protocol::OutputLimits;
use sandbar_protocol::ShellMessage;
use sandbar_protocol::TRUNCATION_MARKER;

struct SinkInner {
    id: CommandId,
    tx: mpsc::Sender<ShellMessage>,
    budget: Mutex<OutputBudget>,
}

/// Shared, budget-aware writer for a single command.
#[derive(Clone)]
pub struct OutputSink {
    inner: Arc<SinkInner>,
}

impl OutputSink {
    pub fn new(id: CommandId, tx: mpsc::Sender<ShellMessage>, limits: &OutputLimits) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                id,
                tx,
                budget: Mutex::new(OutputBudget::new(limits)),
            }),
        }
    }

    /// The command this sink reports for.
    pub fn id(&self) -> &CommandId {
        &self.inner.id
    }

    /// Emit one stdout line (without terminator). Returns `false` once the
    /// stream has been shut by the budget.
    pub async fn stdout_line(&self, text: &str) -> bool {
        self.line(StreamKind::Stdout, text).await
    }

    /// Emit one stderr line (without terminator). Returns `false` once the
    /// stream has been shut by the budget.
    pub async fn stderr_line(&self, text: &str) -> bool {
        self.line(StreamKind::Stderr, text).await
    }

    /// Emit a multi-line chunk on stdout, stopping early when the budget
    /// shuts the stream.
    pub async fn stdout_chunk(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        for line in lines(text) {
            if !self.stdout_line(line).await {
                break;
            }
        }
    }

    /// Emit a supervisor diagnostic on stderr, bypassing the budget. An
    /// abort or timeout must stay visible even after the command's output
    /// tripped truncation.
    pub async fn control_line(&self, text: &str) {
        self.send(StreamKind::Stderr, format!("{text}\n")).await;
    }

    /// Report transfer progress. Progress frames bypass the budget; they
    /// are not command output.
    pub async fn progress(&self, phase: FetchPhase, loaded: u64, total: Option<u64>) {
        let _ = self
            .inner
            .tx
            .send(ShellMessage::Progress {
                id: self.inner.id.clone(),
                phase,
                loaded,
                total,
            })
            .await;
    }

    /// Broadcast a working-directory change.
    pub async fn working_dir(&self, cwd: &str) {
        let _ = self
            .inner
            .tx
            .send(ShellMessage::WorkingDir {
                cwd: cwd.to_string(),
            })
            .await;
    }

    /// Report the final exit code. Never metered; every run emits exactly
    /// one of these.
    pub async fn exited(&self, code: i32) {
        let _ = self
            .inner
            .tx
            .send(ShellMessage::Exited {
                id: self.inner.id.clone(),
                code,
            })
            .await;
    }

    /// Shut both streams without a marker. Called when the run settles so
    /// that stragglers from an aborted task stay invisible.
    pub fn seal(&self) {
        #[allow(clippy::expect_used)]
        self.inner.budget.lock().expect("lock poisoned").seal();
    }

    async fn line(&self, stream: StreamKind, text: &str) -> bool {
        let verdict = {
            #[allow(clippy::expect_used)]
            let mut budget = self.inner.budget.lock().expect("lock poisoned");
            budget.admit(stream, text.len() as i64)
        };
        match verdict {
            Emit::Line => {
                self.send(stream, format!("{text}\n")).await;
                true
            }
            Emit::Marker => {
                self.send(stream, format!("{TRUNCATION_MARKER}\n")).await;
                false
            }
            Emit::Silent => false,
        }
    }

    async fn send(&self, stream: StreamKind, text: String) {
        let id = self.inner.id.clone();
        let message = match stream {
            StreamKind::Stdout => ShellMessage::Stdout { id, text },
            StreamKind::Stderr => ShellMessage::Stderr { id, text },
        };
        let _ = self.inner.tx.send(message).await;
    }
}

/// Split `text` into lines, treating a trailing newline as a terminator
/// rather than the start of an empty final line.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.strip_suffix('\n').unwrap_or(text).split('\n')
}

#[cfg(test)]
#[path = "output.test.rs"]
mod tests;
