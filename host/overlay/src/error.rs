//! Error types for overlay operations.
//!
//! The `Display` text of each variant is the wire error: the shell
//! interpolates it directly into `name: path: reason` diagnostics, so the
//! messages stay short and lowercase like conventional errno strings.

use thiserror::Error;

/// Overlay operation error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// No node at the path in either layer.
    #[error("not found")]
    NotFound,

    /// A directory operation hit a path no layer knows as a directory.
    #[error("not a directory")]
    NotADirectory,

    /// A file operation hit a directory.
    #[error("is a directory")]
    IsADirectory,

    /// Creation hit an existing node.
    #[error("file exists")]
    AlreadyExists,

    /// Non-recursive removal of a directory with children.
    #[error("directory not empty")]
    NotEmpty,

    /// A destructive operation targeted content only the read-only
    /// projection knows.
    #[error("read-only repository content")]
    ReadOnly,

    /// A write targeted a path whose immediate parent is not a local
    /// directory.
    #[error("parent directory missing")]
    ParentMissing,

    /// The root, or a move into the moved tree itself.
    #[error("operation not permitted")]
    NotPermitted,

    /// The projection backend failed.
    #[error("repository unavailable: {0}")]
    Snapshot(String),
}

/// Result type alias for overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;
