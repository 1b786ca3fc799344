//! Session wiring.
//!
//! Builds the two-context topology in one call: a shell worker and a host
//! service on their own tasks, joined by ordered channels, with the
//! display-facing ends returned to the caller. No state is shared across
//! the boundary; everything crosses as an envelope.

use std::sync::Arc;

use tokio::sync::mpsc;

use sandbar_git::CredentialStore;
use sandbar_git::RepoEngine;
use sandbar_protocol::HostMessage;
use sandbar_protocol::ShellMessage;
use sandbar_shell::ShellWorker;

use crate::service::HostService;

/// Depth of each session channel.
const CHANNEL_CAPACITY: usize = 128;

/// The display collaborator's ends of a running session.
pub struct SessionHandles {
    /// Configure, run, and abort commands enter here.
    pub commands: mpsc::Sender<HostMessage>,
    /// Stream output, exits, progress, and notices come back here.
    pub events: mpsc::Receiver<ShellMessage>,
}

/// Spawn a full session around the given engine and credential store.
///
/// The spawned tasks stop when the returned command sender is dropped;
/// undelivered events are dropped with it.
pub fn spawn_session(
    engine: Arc<dyn RepoEngine>,
    credentials: Arc<dyn CredentialStore>,
) -> SessionHandles {
    let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (to_shell_tx, to_shell_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (from_shell_tx, from_shell_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let worker = ShellWorker::new(to_shell_rx, from_shell_tx);
    tokio::spawn(worker.run());

    let service = HostService::new(
        engine,
        credentials,
        command_rx,
        to_shell_tx,
        from_shell_rx,
        event_tx,
    );
    tokio::spawn(service.run());

    SessionHandles {
        commands: command_tx,
        events: event_rx,
    }
}
