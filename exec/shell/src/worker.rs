//! The shell worker: the isolated side's event loop.
//!
//! One task owns the inbound half of the channel and reacts to every
//! [`HostMessage`]: configuration establishes the session, `run` spawns a
//! supervised command task, `abort` cancels one, and result envelopes are
//! routed to the bridge waiter they answer. Commands run concurrently;
//! nothing here blocks the loop on a command's progress.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::bridge::HostBridge;
use crate::builtin;
use crate::context::CommandContext;
use crate::context::SessionHandle;
use crate::output::OutputSink;
use crate::runs::RunTable;
use sandbar_protocol::CommandId;
use sandbar_protocol::HostMessage;
use sandbar_protocol::NoticeSeverity;
use sandbar_protocol::SessionSetup;
use sandbar_protocol::ShellMessage;
use sandbar_protocol::exit;
use sandbar_protocol::path;

/// Minimum deadline for `git` commands when a ceiling is configured.
/// Remote operations legitimately outlive the default command timeout.
const GIT_TIMEOUT_FLOOR_SECS: i64 = 300;

/// Owns the channel endpoints and all per-session state of the isolated
/// side. Constructed once per session; consumed by [`ShellWorker::run`].
pub struct ShellWorker {
    rx: mpsc::Receiver<HostMessage>,
    tx: mpsc::Sender<ShellMessage>,
    bridge: Arc<HostBridge>,
    runs: Arc<RunTable>,
    session: Option<SessionHandle>,
}

impl ShellWorker {
    pub fn new(rx: mpsc::Receiver<HostMessage>, tx: mpsc::Sender<ShellMessage>) -> Self {
        Self {
            rx,
            tx: tx.clone(),
            bridge: Arc::new(HostBridge::new(tx)),
            runs: Arc::new(RunTable::new()),
            session: None,
        }
    }

    /// Process envelopes until the host closes the channel.
    pub async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            match message {
                HostMessage::Configure { setup } => self.on_configure(setup).await,
                HostMessage::Run { id, cwd, line } => self.on_run(id, cwd, line).await,
                HostMessage::Abort { id } => self.on_abort(id),
                HostMessage::FsResult { id, outcome } => self.bridge.resolve_fs(id, outcome),
                HostMessage::GitResult { id, outcome } => self.bridge.resolve_git(id, outcome),
            }
        }
        debug!("host channel closed, shell worker stopping");
    }

    async fn on_configure(&mut self, setup: SessionSetup) {
        if self.session.is_some() {
            self.notice(
                NoticeSeverity::Warning,
                "session already configured; new configuration ignored",
            )
            .await;
            return;
        }
        info!(repo = %setup.repo.name, branch = %setup.repo.branch, "session configured");
        self.session = Some(SessionHandle::new(setup));
    }

    async fn on_run(&mut self, id: CommandId, cwd: String, line: String) {
        let Some(session) = &self.session else {
            // No limits exist yet, so these frames bypass the sink. The id
            // still gets its one terminal exit.
            let _ = self
                .tx
                .send(ShellMessage::Stderr {
                    id: id.clone(),
                    text: "sandbar: session not configured\n".to_string(),
                })
                .await;
            let _ = self
                .tx
                .send(ShellMessage::Exited {
                    id,
                    code: exit::FAILURE,
                })
                .await;
            return;
        };

        let Some(cancel) = self.runs.register(&id) else {
            // The live run owns the id's terminal exit; emitting another
            // here would double it.
            self.notice(
                NoticeSeverity::Warning,
                &format!("run ignored: command {id} is still live"),
            )
            .await;
            return;
        };

        // An empty working directory means "wherever the session is", so a
        // display that only follows `working_dir` broadcasts stays correct.
        let cwd = if cwd.is_empty() {
            session.cwd()
        } else {
            path::resolve("/", &cwd)
        };
        let sink = OutputSink::new(id.clone(), self.tx.clone(), &session.setup().limits);
        let ctx = CommandContext {
            sink: sink.clone(),
            bridge: self.bridge.clone(),
            session: session.clone(),
            cwd,
        };
        let deadline = deadline_for(&line, session.setup().limits.timeout_secs);
        debug!(id = %id, line = %line, ?deadline, "command accepted");

        let work = async move { builtin::dispatch(&ctx, &line).await };
        tokio::spawn(supervise(
            sink,
            id,
            work,
            cancel,
            deadline,
            self.runs.clone(),
        ));
    }

    fn on_abort(&self, id: CommandId) {
        if !self.runs.abort(&id) {
            debug!(id = %id, "abort for unknown command ignored");
        }
    }

    async fn notice(&self, severity: NoticeSeverity, message: &str) {
        let _ = self
            .tx
            .send(ShellMessage::Notice {
                severity,
                message: message.to_string(),
            })
            .await;
    }
}

/// Pick the deadline for one command line. `None` means run unbounded.
fn deadline_for(line: &str, timeout_secs: Option<i64>) -> Option<Duration> {
    let secs = timeout_secs?;
    let is_git = line.split_whitespace().next() == Some("git");
    let secs = if is_git {
        secs.max(GIT_TIMEOUT_FLOOR_SECS)
    } else {
        secs
    };
    Some(Duration::from_secs(secs as u64))
}

/// Drive one command to its single terminal exit.
///
/// The work runs in its own task so a panic inside a builtin is contained
/// and still yields an exit frame. Whichever of {completion, abort,
/// deadline} wins, the sink is sealed, exactly one `exited` goes out, and
/// the run record is removed.
async fn supervise<F>(
    sink: OutputSink,
    id: CommandId,
    work: F,
    cancel: CancellationToken,
    deadline: Option<Duration>,
    runs: Arc<RunTable>,
) where
    F: Future<Output = i32> + Send + 'static,
{
    let mut work = tokio::spawn(work);
    let sleeper = async {
        match deadline {
            Some(deadline) => tokio::time::sleep(deadline).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(sleeper);

    let code = tokio::select! {
        _ = cancel.cancelled() => {
            work.abort();
            sink.control_line("^C").await;
            exit::ABORTED
        }
        _ = &mut sleeper => {
            work.abort();
            let secs = deadline.unwrap_or_default().as_secs();
            sink.control_line(&format!("command timed out after {secs}s")).await;
            exit::TIMED_OUT
        }
        joined = &mut work => match joined {
            Ok(code) => code,
            Err(e) if e.is_panic() => {
                error!(id = %id, "command task panicked");
                sink.stderr_line("internal error: command failed").await;
                exit::FAILURE
            }
            Err(_) => exit::FAILURE,
        },
    };

    sink.seal();
    sink.exited(code).await;
    if let Some(run) = runs.settle(&id) {
        debug!(id = %id, code, elapsed = ?run.started_at.elapsed(), "command settled");
    }
}

#[cfg(test)]
#[path = "worker.test.rs"]
mod tests;
