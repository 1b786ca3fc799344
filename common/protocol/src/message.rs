//! The two envelope sets crossing the host ⇄ shell channel.
//!
//! Both directions are closed tagged enums, exhaustively matched on both
//! sides. Adding a variant is a breaking change by design: an envelope the
//! peer does not know fails deserialization instead of disappearing.

use serde::Deserialize;
use serde::Serialize;

use crate::fs::FsOp;
use crate::fs::FsReply;
use crate::id::CommandId;
use crate::id::RequestId;
use crate::limits::OutputLimits;

/// Severity of an advisory notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    /// Informational.
    Info,
    /// Something was ignored or downgraded.
    Warning,
    /// Something failed outside any command's lifecycle.
    Error,
}

impl NoticeSeverity {
    /// Get the severity as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeSeverity::Info => "info",
            NoticeSeverity::Warning => "warning",
            NoticeSeverity::Error => "error",
        }
    }
}

impl std::fmt::Display for NoticeSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Phase of an outbound fetch, reported in `progress` envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPhase {
    /// Request sent, response headers not yet in.
    Connecting,
    /// Body bytes arriving.
    Downloading,
    /// Transfer finished.
    Complete,
}

/// Reference to the repository a session operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// Short display name.
    pub name: String,
    /// Remote URL, used to derive the credential host for git operations.
    pub remote_url: String,
    /// Branch the read-only projection is pinned to.
    pub branch: String,
}

/// Everything the shell needs before it can run commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSetup {
    /// The repository this session works against.
    pub repo: RepoRef,
    /// Outbound URL prefixes fetches may target. Empty means no allowlist
    /// is configured and only the https-only default policy applies.
    pub allowlist: Vec<String>,
    /// Output and time budgets for every command.
    pub limits: OutputLimits,
}

/// Host response to a routed git command.
///
/// Line-oriented so the display can interleave it with builtin output;
/// carries its own exit code because refusals and failures are part of the
/// command's result, not transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitReply {
    /// Lines for the command's stdout.
    pub stdout: Vec<String>,
    /// Lines for the command's stderr.
    pub stderr: Vec<String>,
    /// Exit code the shell reports for the command.
    pub code: i32,
}

impl GitReply {
    /// A successful reply carrying only stdout lines.
    pub fn ok(stdout: Vec<String>) -> Self {
        Self {
            stdout,
            stderr: Vec::new(),
            code: crate::exit::SUCCESS,
        }
    }

    /// A failed reply carrying only stderr lines.
    pub fn err(stderr: Vec<String>, code: i32) -> Self {
        Self {
            stdout: Vec::new(),
            stderr,
            code,
        }
    }
}

/// Envelopes the host sends to the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostMessage {
    // ========== Session Lifecycle ==========
    /// Establish the session. Sent once, before any `run`; a later
    /// `configure` is answered with a warning notice and ignored.
    Configure {
        /// Repository, allowlist, and budgets for the session.
        setup: SessionSetup,
    },

    // ========== Command Lifecycle ==========
    /// Run one command line.
    Run {
        /// Correlation id for everything this run produces.
        id: CommandId,
        /// Working directory the command starts in.
        cwd: String,
        /// The raw line; the shell tokenizes it.
        line: String,
    },
    /// Ask a live command to stop. Fire-and-forget; the shell always
    /// answers with a terminal `exited` for the id.
    Abort {
        /// The command to stop.
        id: CommandId,
    },

    // ========== RPC Answers ==========
    /// Answer to a filesystem request.
    FsResult {
        /// Echo of the request id.
        id: RequestId,
        /// Success payload or error text.
        outcome: Result<FsReply, String>,
    },
    /// Answer to a git request.
    GitResult {
        /// Echo of the request id.
        id: RequestId,
        /// Reply, or error text for transport-level failure.
        outcome: Result<GitReply, String>,
    },
}

/// Envelopes the shell sends to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShellMessage {
    // ========== Command Output ==========
    /// A stdout chunk.
    Stdout {
        /// Owning command.
        id: CommandId,
        /// Chunk text, newline-terminated lines.
        text: String,
    },
    /// A stderr chunk.
    Stderr {
        /// Owning command.
        id: CommandId,
        /// Chunk text, newline-terminated lines.
        text: String,
    },
    /// Terminal status for a command. Exactly one per run id.
    Exited {
        /// The finished command.
        id: CommandId,
        /// Conventional exit code, see [`crate::exit`].
        code: i32,
    },
    /// Download progress for a fetch in flight.
    Progress {
        /// Owning command.
        id: CommandId,
        /// Where the transfer is.
        phase: FetchPhase,
        /// Bytes received so far.
        loaded: u64,
        /// Total bytes when the server announced a length.
        total: Option<u64>,
    },

    // ========== Session ==========
    /// Advisory not tied to any command.
    Notice {
        /// How serious it is.
        severity: NoticeSeverity,
        /// Human-readable text.
        message: String,
    },
    /// The session working directory changed (successful `cd`).
    WorkingDir {
        /// The new absolute working directory.
        cwd: String,
    },

    // ========== RPC Requests ==========
    /// Filesystem operation to perform on the host.
    FsRequest {
        /// Fresh worker-minted id the host must echo.
        id: RequestId,
        /// The operation.
        op: FsOp,
    },
    /// Git operation to perform on the host.
    GitRequest {
        /// Fresh worker-minted id the host must echo.
        id: RequestId,
        /// Everything after the `git` token.
        args: Vec<String>,
    },
}

impl ShellMessage {
    /// The command id this message belongs to, when it belongs to one.
    pub fn command_id(&self) -> Option<&CommandId> {
        match self {
            ShellMessage::Stdout { id, .. }
            | ShellMessage::Stderr { id, .. }
            | ShellMessage::Exited { id, .. }
            | ShellMessage::Progress { id, .. } => Some(id),
            ShellMessage::Notice { .. }
            | ShellMessage::WorkingDir { .. }
            | ShellMessage::FsRequest { .. }
            | ShellMessage::GitRequest { .. } => None,
        }
    }
}

#[cfg(test)]
#[path = "message.test.rs"]
mod tests;
