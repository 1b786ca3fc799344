//! Host-side virtual filesystem for the sandboxed shell.
//!
//! The session filesystem is an overlay: a writable in-memory store layered
//! over a read-only projection of repository content pinned to a branch.
//! Reads fall through to the projection when the local store has no entry;
//! writes only ever touch the local store and require the immediate parent
//! directory to exist there.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sandbar_overlay::MemorySnapshot;
//! use sandbar_overlay::Overlay;
//!
//! # async fn example() -> sandbar_overlay::Result<()> {
//! let mut snapshot = MemorySnapshot::new();
//! snapshot.insert("main", "/README.md", "# demo\n");
//!
//! let mut fs = Overlay::new(Arc::new(snapshot), "main");
//! // Repository content is readable...
//! let readme = fs.read_file("/README.md").await?;
//! // ...but writable paths live in the local store only.
//! fs.mkdir("/notes").await?;
//! fs.write_file("/notes/todo.txt", b"ship it\n".to_vec()).await?;
//! # let _ = readme;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod overlay;
pub mod snapshot;
pub mod store;

pub use error::OverlayError;
pub use error::Result;
pub use overlay::Overlay;
pub use snapshot::MemorySnapshot;
pub use snapshot::RepoSnapshot;
pub use store::LocalStore;
