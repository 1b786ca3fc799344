//! The repository engine interface.
//!
//! The engine owns real git state: history, trees, the remote. This crate
//! never implements that logic itself; it translates shell-level git
//! commands into these calls and formats the results. [`MemoryEngine`]
//! (see [`crate::memory`]) is the in-process stand-in used by tests and
//! the demo binary.
//!
//! Operations that contact the remote take the credential token as an
//! argument; picking which token to present is the caller's job (see
//! [`crate::credentials`]).

use async_trait::async_trait;
use thiserror::Error;

use sandbar_protocol::DirEntry;

/// Worktree summary for `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkTreeStatus {
    /// Branch the worktree is on.
    pub branch: String,
    /// Paths with uncommitted modifications.
    pub dirty: Vec<String>,
    /// Commits the local branch has that the remote does not.
    pub ahead: i64,
    /// Commits the remote has that the local branch does not.
    pub behind: i64,
}

/// One commit, as shown by `log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full hex commit id.
    pub id: String,
    /// Author line, `Name <email>`.
    pub author: String,
    /// Commit time, preformatted by the engine.
    pub time: String,
    /// Commit message, first line is the subject.
    pub message: String,
}

/// A commit plus the files it touched, as shown by `show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDetail {
    /// The commit itself.
    pub info: CommitInfo,
    /// Paths changed by the commit.
    pub files: Vec<String>,
}

/// Result of a completed push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSummary {
    /// Remote URL the push went to.
    pub remote: String,
    /// Branch that was pushed.
    pub branch: String,
    /// Commits the remote accepted.
    pub commits: i64,
}

/// Result of a completed pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    /// Whether anything changed locally.
    pub updated: bool,
    /// Commits merged into the local branch.
    pub commits: i64,
}

/// Failures the engine reports.
///
/// The first four are deterministic refusals; only [`EngineError::Auth`]
/// justifies retrying with a different credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The remote rejected the presented credential.
    #[error("authentication failed: {reason}")]
    Auth {
        /// What the remote said.
        reason: String,
    },
    /// Push preflight: the worktree has uncommitted changes.
    #[error("uncommitted changes in working tree")]
    DirtyWorkTree,
    /// Push preflight: the local branch is behind its remote.
    #[error("local branch is behind its remote")]
    BranchBehind,
    /// Push preflight: the update would rewrite remote history.
    #[error("push would rewrite remote history")]
    HistoryRewrite,
    /// The revision does not name a commit or branch.
    #[error("unknown revision '{0}'")]
    UnknownRevision(String),
    /// The branch does not exist.
    #[error("unknown branch '{0}'")]
    UnknownBranch(String),
    /// Anything else, already formatted for people.
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Whether a different credential could change the outcome.
    pub fn is_auth(&self) -> bool {
        matches!(self, EngineError::Auth { .. })
    }
}

/// The git domain engine, owned by the host side.
///
/// Every call is one request/response; nothing streams. Branch-shaped
/// `refspec` arguments accept a branch name or a full commit id.
#[async_trait]
pub trait RepoEngine: Send + Sync {
    /// Worktree status on a branch.
    async fn status(&self, branch: &str) -> Result<WorkTreeStatus, EngineError>;

    /// The most recent `depth` commits on a branch, newest first.
    async fn history(&self, branch: &str, depth: usize) -> Result<Vec<CommitInfo>, EngineError>;

    /// Full detail for one revision.
    async fn commit_detail(&self, rev: &str) -> Result<CommitDetail, EngineError>;

    /// Apply a patch on top of a branch, commit it with `message`, and
    /// push the result. Returns the new commit.
    async fn apply_patch_and_push(
        &self,
        branch: &str,
        patch: &str,
        message: &str,
        token: &str,
    ) -> Result<CommitInfo, EngineError>;

    /// Push a branch after preflight (clean worktree, not behind, no
    /// history rewrite unless `force`).
    async fn safe_push(
        &self,
        branch: &str,
        force: bool,
        token: &str,
    ) -> Result<PushSummary, EngineError>;

    /// Bring a branch up to date with its remote.
    async fn sync_with_remote(&self, branch: &str, token: &str)
    -> Result<SyncSummary, EngineError>;

    /// All branch names known to the repository.
    async fn list_branches(&self) -> Result<Vec<String>, EngineError>;

    /// One level of the tree at `refspec`, or `None` when `path` is not a
    /// directory there.
    async fn list_repo_files(
        &self,
        refspec: &str,
        path: &str,
    ) -> Result<Option<Vec<DirEntry>>, EngineError>;

    /// File contents at `refspec`, or `None` when `path` is not a file
    /// there.
    async fn read_repo_file(
        &self,
        refspec: &str,
        path: &str,
    ) -> Result<Option<Vec<u8>>, EngineError>;

    /// Whether `path` exists in the tree of the commit named by `rev`.
    async fn file_exists_at_commit(&self, rev: &str, path: &str) -> Result<bool, EngineError>;
}
