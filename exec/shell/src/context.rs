//! Per-session and per-command state handed to builtins.

use std::sync::Arc;
use std::sync::Mutex;

use crate::bridge::HostBridge;
use crate::output::OutputSink;
use sandbar_protocol::SessionSetup;
use sandbar_protocol::path;

/// Session-wide state: the setup received at `configure` plus the working
/// directory that outlives individual commands.
#[derive(Clone)]
pub struct SessionHandle {
    setup: Arc<SessionSetup>,
    cwd: Arc<Mutex<String>>,
}

impl SessionHandle {
    pub fn new(setup: SessionSetup) -> Self {
        Self {
            setup: Arc::new(setup),
            cwd: Arc::new(Mutex::new("/".to_string())),
        }
    }

    pub fn setup(&self) -> &SessionSetup {
        &self.setup
    }

    pub fn cwd(&self) -> String {
        #[allow(clippy::expect_used)]
        self.cwd.lock().expect("lock poisoned").clone()
    }

    /// Record a successful `cd`. The caller broadcasts the change.
    pub fn set_cwd(&self, cwd: String) {
        #[allow(clippy::expect_used)]
        let mut guard = self.cwd.lock().expect("lock poisoned");
        *guard = cwd;
    }
}

/// Everything one command invocation needs: its output sink, the host
/// bridge, the session, and the working directory it was launched with.
#[derive(Clone)]
pub struct CommandContext {
    pub sink: OutputSink,
    pub bridge: Arc<HostBridge>,
    pub session: SessionHandle,
    pub cwd: String,
}

impl CommandContext {
    /// Resolve a user-supplied path against this command's working
    /// directory.
    pub fn resolve(&self, arg: &str) -> String {
        path::resolve(&self.cwd, arg)
    }
}
