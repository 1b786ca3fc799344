//! Read-only projection of repository content.
//!
//! The projection is an external collaborator: it answers reads keyed by
//! `{branch, path}` and nothing else. [`MemorySnapshot`] is the in-memory
//! implementation used by tests and the demo binary; production sessions
//! adapt the git domain engine instead.

use std::collections::BTreeMap;
use std::collections::HashMap;

use async_trait::async_trait;
use sandbar_protocol::DirEntry;
use sandbar_protocol::NodeKind;
use sandbar_protocol::path;

use crate::Result;

/// Read-only view into repository content at a branch.
///
/// Both methods answer `Ok(None)` when the branch does not carry the
/// requested node, so the overlay can distinguish "absent" from backend
/// failure.
#[async_trait]
pub trait RepoSnapshot: Send + Sync {
    /// Read a file. `None` when the branch has no file at the path.
    async fn read_file(&self, branch: &str, path: &str) -> Result<Option<Vec<u8>>>;

    /// List a directory, sorted by name. `None` when the branch has no
    /// directory at the path.
    async fn read_dir(&self, branch: &str, path: &str) -> Result<Option<Vec<DirEntry>>>;
}

/// In-memory projection: branch name → file path → contents.
///
/// Directories are implicit, exactly like a git tree: a directory exists
/// iff some file lives underneath it.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    branches: HashMap<String, BTreeMap<String, Vec<u8>>>,
}

impl MemorySnapshot {
    /// An empty projection with no branches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to a branch, creating the branch when absent.
    pub fn insert(&mut self, branch: &str, path: &str, contents: impl Into<Vec<u8>>) {
        self.branches
            .entry(branch.to_string())
            .or_default()
            .insert(path::normalize(path), contents.into());
    }

    fn files(&self, branch: &str) -> Option<&BTreeMap<String, Vec<u8>>> {
        self.branches.get(branch)
    }
}

#[async_trait]
impl RepoSnapshot for MemorySnapshot {
    async fn read_file(&self, branch: &str, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.files(branch).and_then(|files| files.get(path).cloned()))
    }

    async fn read_dir(&self, branch: &str, path: &str) -> Result<Option<Vec<DirEntry>>> {
        let Some(files) = self.files(branch) else {
            return Ok(None);
        };
        if files.contains_key(path) {
            // A file, not a directory.
            return Ok(None);
        }
        let mut seen: BTreeMap<String, NodeKind> = BTreeMap::new();
        for key in files.keys() {
            if !path::is_inside(path, key) {
                continue;
            }
            let rest = if path == "/" {
                &key[1..]
            } else {
                &key[path.len() + 1..]
            };
            match rest.split_once('/') {
                Some((name, _)) => {
                    seen.insert(name.to_string(), NodeKind::Dir);
                }
                None => {
                    seen.entry(rest.to_string()).or_insert(NodeKind::File);
                }
            }
        }
        if seen.is_empty() && path != "/" {
            return Ok(None);
        }
        Ok(Some(
            seen.into_iter()
                .map(|(name, kind)| DirEntry { name, kind })
                .collect(),
        ))
    }
}

#[cfg(test)]
#[path = "snapshot.test.rs"]
mod tests;
