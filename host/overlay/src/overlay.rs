//! Overlay resolution: local store first, projection fallback.
//!
//! Rules, in order of precedence:
//! - Reads consult the local store, then the projection at the session
//!   branch.
//! - Writes only ever touch the local store, and require the immediate
//!   parent to be a local directory. Creating a directory that the
//!   projection already shows is allowed; that is how repository
//!   directories become writable.
//! - Destructive operations on content only the projection knows are
//!   refused as read-only.
//! - The root is never a valid operand for remove or rename.

use std::sync::Arc;

use sandbar_protocol::DirEntry;
use sandbar_protocol::FsOp;
use sandbar_protocol::FsReply;
use sandbar_protocol::NodeInfo;
use sandbar_protocol::NodeKind;
use sandbar_protocol::path;
use tracing::debug;

use crate::OverlayError;
use crate::Result;
use crate::snapshot::RepoSnapshot;
use crate::store::LocalStore;

/// The session filesystem.
pub struct Overlay {
    store: LocalStore,
    snapshot: Arc<dyn RepoSnapshot>,
    branch: String,
}

impl Overlay {
    /// A fresh overlay over `snapshot`, pinned to `branch`, with an empty
    /// local store.
    pub fn new(snapshot: Arc<dyn RepoSnapshot>, branch: impl Into<String>) -> Self {
        Self {
            store: LocalStore::new(),
            snapshot,
            branch: branch.into(),
        }
    }

    /// The branch the projection is pinned to.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Re-pin the projection. Local content is unaffected.
    pub fn set_branch(&mut self, branch: impl Into<String>) {
        self.branch = branch.into();
    }

    /// Execute one wire operation. Paths are normalized again here so the
    /// lookup never depends on the peer's hygiene.
    pub async fn apply(&mut self, op: FsOp) -> Result<FsReply> {
        debug!(op = op.name(), "fs op");
        match op {
            FsOp::Stat { path } => {
                let info = self.stat(&path::normalize(&path)).await?;
                Ok(FsReply::Stat { info })
            }
            FsOp::ReadFile { path } => {
                let contents = self.read_file(&path::normalize(&path)).await?;
                Ok(FsReply::File { contents })
            }
            FsOp::WriteFile { path, contents } => {
                self.write_file(&path::normalize(&path), contents).await?;
                Ok(FsReply::Unit)
            }
            FsOp::ReadDir { path } => {
                let entries = self.read_dir(&path::normalize(&path)).await?;
                Ok(FsReply::Entries { entries })
            }
            FsOp::Mkdir { path } => {
                self.mkdir(&path::normalize(&path)).await?;
                Ok(FsReply::Unit)
            }
            FsOp::Remove { path, recursive } => {
                self.remove(&path::normalize(&path), recursive).await?;
                Ok(FsReply::Unit)
            }
            FsOp::Rename { from, to } => {
                self.rename(&path::normalize(&from), &path::normalize(&to))
                    .await?;
                Ok(FsReply::Unit)
            }
            FsOp::Copy { from, to } => {
                self.copy(&path::normalize(&from), &path::normalize(&to))
                    .await?;
                Ok(FsReply::Unit)
            }
            FsOp::Touch { path } => {
                self.touch(&path::normalize(&path)).await?;
                Ok(FsReply::Unit)
            }
        }
    }

    /// Node metadata, local store first.
    pub async fn stat(&self, path: &str) -> Result<NodeInfo> {
        if let Some(kind) = self.store.kind(path) {
            let size = match kind {
                NodeKind::File => self.store.file(path).map(Vec::len).unwrap_or(0) as u64,
                NodeKind::Dir => 0,
            };
            return Ok(NodeInfo { kind, size });
        }
        if let Some(contents) = self.snapshot.read_file(&self.branch, path).await? {
            return Ok(NodeInfo {
                kind: NodeKind::File,
                size: contents.len() as u64,
            });
        }
        if self.snapshot_dir(path).await? {
            return Ok(NodeInfo {
                kind: NodeKind::Dir,
                size: 0,
            });
        }
        Err(OverlayError::NotFound)
    }

    /// File contents, local store first.
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        match self.store.kind(path) {
            Some(NodeKind::File) => {
                return Ok(self.store.file(path).cloned().unwrap_or_default());
            }
            Some(NodeKind::Dir) => return Err(OverlayError::IsADirectory),
            None => {}
        }
        if let Some(contents) = self.snapshot.read_file(&self.branch, path).await? {
            return Ok(contents);
        }
        if self.snapshot_dir(path).await? {
            return Err(OverlayError::IsADirectory);
        }
        Err(OverlayError::NotFound)
    }

    /// Create or replace a file in the local store.
    pub async fn write_file(&mut self, path: &str, contents: Vec<u8>) -> Result<()> {
        if path == "/" || self.store.is_dir(path) {
            return Err(OverlayError::IsADirectory);
        }
        if self.store.file(path).is_none() && self.snapshot_dir(path).await? {
            return Err(OverlayError::IsADirectory);
        }
        self.check_local_parent(path)?;
        self.store.put_file(path.to_string(), contents);
        Ok(())
    }

    /// Merged directory listing, deduplicated by name with local entries
    /// winning. Fails not-a-directory when the path is visible as a file,
    /// not-found when no layer shows anything there.
    pub async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        if self.store.kind(path) == Some(NodeKind::File) {
            return Err(OverlayError::NotADirectory);
        }
        let local_dir = self.store.is_dir(path);
        let projected = self.snapshot.read_dir(&self.branch, path).await?;
        if !local_dir && projected.is_none() {
            if self
                .snapshot
                .read_file(&self.branch, path)
                .await?
                .is_some()
            {
                return Err(OverlayError::NotADirectory);
            }
            return Err(OverlayError::NotFound);
        }
        let mut merged: std::collections::BTreeMap<String, DirEntry> = std::collections::BTreeMap::new();
        if let Some(entries) = projected {
            for entry in entries {
                merged.insert(entry.name.clone(), entry);
            }
        }
        if local_dir {
            for entry in self.store.children(path) {
                merged.insert(entry.name.clone(), entry);
            }
        }
        Ok(merged.into_values().collect())
    }

    /// Create a local directory. Creating one the projection already shows
    /// materializes it locally.
    pub async fn mkdir(&mut self, path: &str) -> Result<()> {
        if path == "/" || self.store.kind(path).is_some() {
            return Err(OverlayError::AlreadyExists);
        }
        if self
            .snapshot
            .read_file(&self.branch, path)
            .await?
            .is_some()
        {
            return Err(OverlayError::AlreadyExists);
        }
        self.check_local_parent(path)?;
        self.store.put_dir(path.to_string());
        Ok(())
    }

    /// Delete a local node. Directories need `recursive` when they have
    /// local children; content only the projection knows is refused.
    pub async fn remove(&mut self, path: &str, recursive: bool) -> Result<()> {
        if path == "/" {
            return Err(OverlayError::NotPermitted);
        }
        match self.store.kind(path) {
            Some(NodeKind::File) => {
                self.store.remove_file(path);
                Ok(())
            }
            Some(NodeKind::Dir) => {
                if !recursive && self.store.has_children(path) {
                    return Err(OverlayError::NotEmpty);
                }
                self.store.remove_tree(path);
                Ok(())
            }
            None => {
                if self.snapshot_visible(path).await? {
                    Err(OverlayError::ReadOnly)
                } else {
                    Err(OverlayError::NotFound)
                }
            }
        }
    }

    /// Move a local node. Moving onto an existing directory retargets
    /// inside it; moving a file onto an existing file replaces it. A
    /// directory never lands on a path any layer shows as a file; that
    /// would leave one path in both halves of the store.
    pub async fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        if from == "/" {
            return Err(OverlayError::NotPermitted);
        }
        if self.store.kind(from).is_none() {
            if self.snapshot_visible(from).await? {
                return Err(OverlayError::ReadOnly);
            }
            return Err(OverlayError::NotFound);
        }
        let to = self.target_inside_dir(from, to).await?;
        if from == to {
            return Ok(());
        }
        if path::is_inside(from, &to) {
            return Err(OverlayError::NotPermitted);
        }
        if self.visible_dir(&to).await? {
            return Err(OverlayError::AlreadyExists);
        }
        if self.store.is_dir(from) && self.visible_file(&to).await? {
            return Err(OverlayError::NotADirectory);
        }
        self.check_local_parent(&to)?;
        self.store.rebase(from, &to);
        Ok(())
    }

    /// Copy one file. The source may live in either layer; the copy is a
    /// local write.
    pub async fn copy(&mut self, from: &str, to: &str) -> Result<()> {
        let contents = self.read_file(from).await?;
        let to = self.target_inside_dir(from, to).await?;
        if from == to {
            return Err(OverlayError::AlreadyExists);
        }
        self.write_file(&to, contents).await
    }

    /// Succeed quietly when the path is visible anywhere; otherwise create
    /// an empty local file.
    pub async fn touch(&mut self, path: &str) -> Result<()> {
        if path == "/" || self.store.kind(path).is_some() {
            return Ok(());
        }
        if self.snapshot_visible(path).await? {
            return Ok(());
        }
        self.check_local_parent(path)?;
        self.store.put_file(path.to_string(), Vec::new());
        Ok(())
    }

    fn check_local_parent(&self, path: &str) -> Result<()> {
        match path::parent(path) {
            Some(parent) if self.store.is_dir(parent) => Ok(()),
            _ => Err(OverlayError::ParentMissing),
        }
    }

    async fn snapshot_dir(&self, path: &str) -> Result<bool> {
        Ok(self
            .snapshot
            .read_dir(&self.branch, path)
            .await?
            .is_some())
    }

    async fn snapshot_visible(&self, path: &str) -> Result<bool> {
        if self
            .snapshot
            .read_file(&self.branch, path)
            .await?
            .is_some()
        {
            return Ok(true);
        }
        self.snapshot_dir(path).await
    }

    async fn visible_file(&self, path: &str) -> Result<bool> {
        match self.store.kind(path) {
            Some(NodeKind::File) => return Ok(true),
            Some(NodeKind::Dir) => return Ok(false),
            None => {}
        }
        Ok(self
            .snapshot
            .read_file(&self.branch, path)
            .await?
            .is_some())
    }

    async fn visible_dir(&self, path: &str) -> Result<bool> {
        if self.store.kind(path) == Some(NodeKind::Dir) {
            return Ok(true);
        }
        if self.store.kind(path).is_some() {
            return Ok(false);
        }
        self.snapshot_dir(path).await
    }

    /// When `to` names a visible directory, retarget to `to/<basename>`.
    async fn target_inside_dir(&self, from: &str, to: &str) -> Result<String> {
        if self.visible_dir(to).await? {
            match path::file_name(from) {
                Some(name) => Ok(path::join(to, name)),
                None => Err(OverlayError::NotPermitted),
            }
        } else {
            Ok(to.to_string())
        }
    }
}

#[cfg(test)]
#[path = "overlay.test.rs"]
mod tests;
