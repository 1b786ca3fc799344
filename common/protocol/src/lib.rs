//! Wire protocol between the host context and the sandboxed shell.
//!
//! The two contexts share no memory; everything crosses an ordered,
//! reliable message channel. This crate defines both envelope sets:
//!
//! - [`HostMessage`]: host → shell (configure, run, abort, RPC answers)
//! - [`ShellMessage`]: shell → host (output, exits, notices, RPC requests)
//!
//! Envelopes are closed serde-tagged enums. An unrecognized `kind` fails
//! deserialization at the boundary instead of being silently dropped, so
//! protocol drift between the two sides surfaces immediately.
//!
//! Two identifier spaces exist on purpose: [`CommandId`] correlates user
//! commands (minted by the display), while [`RequestId`] correlates
//! individual fs/git round trips (minted by the shell worker). A single
//! command may issue any number of requests.

pub mod exit;
pub mod fs;
pub mod id;
pub mod limits;
pub mod message;
pub mod path;

pub use fs::DirEntry;
pub use fs::FsOp;
pub use fs::FsReply;
pub use fs::NodeInfo;
pub use fs::NodeKind;
pub use id::CommandId;
pub use id::RequestId;
pub use limits::OutputLimits;
pub use limits::TRUNCATION_MARKER;
pub use message::FetchPhase;
pub use message::GitReply;
pub use message::HostMessage;
pub use message::NoticeSeverity;
pub use message::RepoRef;
pub use message::SessionSetup;
pub use message::ShellMessage;
