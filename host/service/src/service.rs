//! The privileged side of a session.
//!
//! One task owns the channel ends; everything the shell is not allowed to
//! touch — the filesystem overlay, the git handler, the session branch —
//! lives behind one async lock. The loop forwards display commands to the
//! shell, relays the shell's output frames to the display, and services
//! fs/git requests in spawned tasks so a slow engine call (a push in
//! flight, say) never stops aborts or unrelated commands from flowing.
//! The lock is fair, so host-side operations still execute one at a time
//! in arrival order; concurrent commands interleave only at request
//! boundaries and each operation is atomic from the shell's perspective.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;
use tracing::warn;

use sandbar_git::CredentialStore;
use sandbar_git::EngineProjection;
use sandbar_git::GitHandler;
use sandbar_git::GitSession;
use sandbar_git::RepoEngine;
use sandbar_overlay::Overlay;
use sandbar_protocol::FsOp;
use sandbar_protocol::FsReply;
use sandbar_protocol::GitReply;
use sandbar_protocol::HostMessage;
use sandbar_protocol::SessionSetup;
use sandbar_protocol::ShellMessage;

/// Per-session state, created by the first `configure`.
struct SessionState {
    overlay: Overlay,
    handler: GitHandler,
    git: GitSession,
}

/// Shared handle to the session state. `None` until `configure` arrives.
type SharedState = Arc<Mutex<Option<SessionState>>>;

/// The host loop. Construct, then `tokio::spawn(service.run())`.
pub struct HostService {
    commands: mpsc::Receiver<HostMessage>,
    shell_tx: mpsc::Sender<HostMessage>,
    shell_rx: mpsc::Receiver<ShellMessage>,
    display_tx: mpsc::Sender<ShellMessage>,
    engine: Arc<dyn RepoEngine>,
    credentials: Arc<dyn CredentialStore>,
    state: SharedState,
}

impl HostService {
    pub fn new(
        engine: Arc<dyn RepoEngine>,
        credentials: Arc<dyn CredentialStore>,
        commands: mpsc::Receiver<HostMessage>,
        shell_tx: mpsc::Sender<HostMessage>,
        shell_rx: mpsc::Receiver<ShellMessage>,
        display_tx: mpsc::Sender<ShellMessage>,
    ) -> Self {
        Self {
            commands,
            shell_tx,
            shell_rx,
            display_tx,
            engine,
            credentials,
            state: Arc::new(Mutex::new(None)),
        }
    }

    /// Serve until both inbound channels close.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    self.on_command(command).await;
                }
                message = self.shell_rx.recv() => {
                    let Some(message) = message else { break };
                    self.on_shell(message).await;
                }
            }
        }
        debug!("host service stopped");
    }

    /// Display commands pass through to the shell; `configure`
    /// additionally builds the host-side session state.
    async fn on_command(&mut self, command: HostMessage) {
        if let HostMessage::Configure { setup } = &command {
            self.configure(setup);
        }
        if self.shell_tx.send(command).await.is_err() {
            warn!("shell channel closed; dropping command");
        }
    }

    fn configure(&mut self, setup: &SessionSetup) {
        // A held lock means an op is mid-flight, which can only happen
        // after the session was configured; this is a repeat and loses to
        // the first configure anyway.
        let Ok(mut state) = self.state.try_lock() else {
            debug!("repeated configure during an operation; ignored");
            return;
        };
        if state.is_some() {
            // The shell emits the warning notice for this case.
            debug!("repeated configure; keeping existing session state");
            return;
        }
        info!(
            repo = %setup.repo.name,
            branch = %setup.repo.branch,
            "configuring session"
        );
        let snapshot = Arc::new(EngineProjection::new(self.engine.clone()));
        *state = Some(SessionState {
            overlay: Overlay::new(snapshot, setup.repo.branch.clone()),
            handler: GitHandler::new(
                self.engine.clone(),
                self.credentials.clone(),
                &setup.repo.remote_url,
            ),
            git: GitSession::new(setup.repo.branch.clone()),
        });
    }

    /// Requests are serviced off the loop so it stays responsive; every
    /// other frame is relayed to the display in arrival order.
    async fn on_shell(&mut self, message: ShellMessage) {
        match message {
            ShellMessage::FsRequest { id, op } => {
                let state = self.state.clone();
                let tx = self.shell_tx.clone();
                tokio::spawn(async move {
                    let outcome = serve_fs(&state, op).await;
                    answer(&tx, HostMessage::FsResult { id, outcome }).await;
                });
            }
            ShellMessage::GitRequest { id, args } => {
                let state = self.state.clone();
                let tx = self.shell_tx.clone();
                tokio::spawn(async move {
                    let outcome = serve_git(&state, &args).await;
                    answer(&tx, HostMessage::GitResult { id, outcome }).await;
                });
            }
            other => {
                if self.display_tx.send(other).await.is_err() {
                    debug!("display channel closed; dropping message");
                }
            }
        }
    }
}

async fn serve_fs(state: &SharedState, op: FsOp) -> Result<FsReply, String> {
    let mut state = state.lock().await;
    let Some(state) = state.as_mut() else {
        return Err("session not configured".to_string());
    };
    state.overlay.apply(op).await.map_err(|e| e.to_string())
}

async fn serve_git(state: &SharedState, args: &[String]) -> Result<GitReply, String> {
    let mut state = state.lock().await;
    let Some(state) = state.as_mut() else {
        return Err("session not configured".to_string());
    };
    Ok(state
        .handler
        .handle(&mut state.git, &mut state.overlay, args)
        .await)
}

async fn answer(tx: &mpsc::Sender<HostMessage>, answer: HostMessage) {
    if tx.send(answer).await.is_err() {
        debug!("shell channel closed; dropping answer");
    }
}

#[cfg(test)]
#[path = "service.test.rs"]
mod tests;
