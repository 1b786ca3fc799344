//! Filesystem operation vocabulary.
//!
//! Every filesystem side effect a shell builtin wants crosses the channel
//! as one of these operations. Paths are always absolute and normalized by
//! the shell before the op ships; the host never resolves relative paths.

use serde::Deserialize;
use serde::Serialize;

/// What kind of node a path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A regular file.
    File,
    /// A directory.
    Dir,
}

impl NodeKind {
    /// Get the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Dir => "dir",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata for a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// File or directory.
    pub kind: NodeKind,
    /// Content length in bytes; zero for directories.
    pub size: u64,
}

/// One entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Base name, no path components.
    pub name: String,
    /// File or directory.
    pub kind: NodeKind,
}

/// A filesystem operation requested by the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FsOp {
    /// Look up node metadata.
    Stat {
        /// Absolute normalized path.
        path: String,
    },
    /// Read a whole file.
    ReadFile {
        /// Absolute normalized path.
        path: String,
    },
    /// Create or replace a file.
    WriteFile {
        /// Absolute normalized path.
        path: String,
        /// New file contents.
        contents: Vec<u8>,
    },
    /// List a directory.
    ReadDir {
        /// Absolute normalized path.
        path: String,
    },
    /// Create a directory.
    Mkdir {
        /// Absolute normalized path.
        path: String,
    },
    /// Delete a file or directory.
    Remove {
        /// Absolute normalized path.
        path: String,
        /// Delete directory contents too.
        recursive: bool,
    },
    /// Move a node to a new path.
    Rename {
        /// Source path.
        from: String,
        /// Destination path.
        to: String,
    },
    /// Copy a file to a new path.
    Copy {
        /// Source path.
        from: String,
        /// Destination path.
        to: String,
    },
    /// Ensure a file exists, creating it empty when absent.
    Touch {
        /// Absolute normalized path.
        path: String,
    },
}

impl FsOp {
    /// The op name as it appears on the wire tag.
    pub fn name(&self) -> &'static str {
        match self {
            FsOp::Stat { .. } => "stat",
            FsOp::ReadFile { .. } => "read_file",
            FsOp::WriteFile { .. } => "write_file",
            FsOp::ReadDir { .. } => "read_dir",
            FsOp::Mkdir { .. } => "mkdir",
            FsOp::Remove { .. } => "remove",
            FsOp::Rename { .. } => "rename",
            FsOp::Copy { .. } => "copy",
            FsOp::Touch { .. } => "touch",
        }
    }
}

/// Success payload for a filesystem operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum FsReply {
    /// Metadata for a `stat`.
    Stat {
        /// The node's metadata.
        info: NodeInfo,
    },
    /// Contents for a `read_file`.
    File {
        /// The file's bytes.
        contents: Vec<u8>,
    },
    /// Listing for a `read_dir`, sorted by name.
    Entries {
        /// The directory's entries.
        entries: Vec<DirEntry>,
    },
    /// Acknowledgement for ops with no payload.
    Unit,
}

#[cfg(test)]
#[path = "fs.test.rs"]
mod tests;
