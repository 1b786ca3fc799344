//! Git command handling for the sandboxed shell.
//!
//! The shell forwards everything after the `git` token to the host, and
//! this crate turns that argument vector into calls against the repository
//! domain engine:
//!
//! - [`RepoEngine`] is the engine interface (history, trees, patching,
//!   remote sync); [`MemoryEngine`] is the in-process implementation used
//!   by tests and the demo binary
//! - [`GitHandler`] parses subcommands, tracks the current branch and the
//!   staged set, and formats engine results as porcelain-style lines
//! - [`credentials`] attempts every stored credential for the remote host
//!   in order, keeping per-credential failures for the aggregate error
//! - [`EngineProjection`] exposes the engine's trees as the overlay's
//!   read-only projection, so `ls`/`cat` and `git show` agree on content

pub mod credentials;
pub mod engine;
pub mod handler;
pub mod memory;
pub mod projection;

pub use credentials::Credential;
pub use credentials::CredentialError;
pub use credentials::CredentialStore;
pub use credentials::StaticCredentials;
pub use engine::CommitDetail;
pub use engine::CommitInfo;
pub use engine::EngineError;
pub use engine::PushSummary;
pub use engine::RepoEngine;
pub use engine::SyncSummary;
pub use engine::WorkTreeStatus;
pub use handler::GitHandler;
pub use handler::GitSession;
pub use memory::MemoryEngine;
pub use projection::EngineProjection;
