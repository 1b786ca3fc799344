//! The writable half of the overlay.
//!
//! A path lives in exactly one of the two collections, never both. The
//! root `/` is always a directory. The overlay guarantees that every
//! non-root entry's immediate parent is present as a directory, so listing
//! a directory only needs the entries one level down.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use sandbar_protocol::DirEntry;
use sandbar_protocol::NodeKind;
use sandbar_protocol::path;

/// Session-local writable file tree.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
}

impl LocalStore {
    /// An empty store containing only the root directory.
    pub fn new() -> Self {
        let mut dirs = BTreeSet::new();
        dirs.insert("/".to_string());
        Self {
            dirs,
            files: BTreeMap::new(),
        }
    }

    /// What kind of node the path names here, if any.
    pub fn kind(&self, path: &str) -> Option<NodeKind> {
        if self.dirs.contains(path) {
            Some(NodeKind::Dir)
        } else if self.files.contains_key(path) {
            Some(NodeKind::File)
        } else {
            None
        }
    }

    /// Whether the path is a local directory.
    pub fn is_dir(&self, path: &str) -> bool {
        self.dirs.contains(path)
    }

    /// File contents when the path is a local file.
    pub fn file(&self, path: &str) -> Option<&Vec<u8>> {
        self.files.get(path)
    }

    /// Create or replace a file. The caller has already checked kinds and
    /// the parent chain.
    pub fn put_file(&mut self, path: String, contents: Vec<u8>) {
        self.files.insert(path, contents);
    }

    /// Record a directory. The caller has already checked kinds and the
    /// parent chain.
    pub fn put_dir(&mut self, path: String) {
        self.dirs.insert(path);
    }

    /// Remove a single file entry.
    pub fn remove_file(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    /// Remove a directory marker and everything inside it, in one step.
    pub fn remove_tree(&mut self, path: &str) {
        if path == "/" {
            self.dirs.retain(|d| d == "/");
            self.files.clear();
            return;
        }
        self.dirs
            .retain(|d| d != path && !path::is_inside(path, d));
        self.files.retain(|f, _| !path::is_inside(path, f));
    }

    /// Whether a local directory has any entry one level down.
    pub fn has_children(&self, dir: &str) -> bool {
        self.dirs
            .iter()
            .chain(self.files.keys())
            .any(|p| path::is_inside(dir, p))
    }

    /// Immediate children of a local directory, sorted by name.
    pub fn children(&self, dir: &str) -> Vec<DirEntry> {
        let mut entries = Vec::new();
        for d in &self.dirs {
            if path::parent(d) == Some(dir)
                && let Some(name) = path::file_name(d)
            {
                entries.push(DirEntry {
                    name: name.to_string(),
                    kind: NodeKind::Dir,
                });
            }
        }
        for f in self.files.keys() {
            if path::parent(f) == Some(dir)
                && let Some(name) = path::file_name(f)
            {
                entries.push(DirEntry {
                    name: name.to_string(),
                    kind: NodeKind::File,
                });
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Move a node, and everything inside it when it is a directory, to a
    /// new path. The caller has already checked both endpoints.
    pub fn rebase(&mut self, from: &str, to: &str) {
        if let Some(contents) = self.files.remove(from) {
            self.files.insert(to.to_string(), contents);
            return;
        }
        if self.dirs.remove(from) {
            self.dirs.insert(to.to_string());
            let inside_dirs: Vec<String> = self
                .dirs
                .iter()
                .filter(|d| path::is_inside(from, d))
                .cloned()
                .collect();
            for d in inside_dirs {
                self.dirs.remove(&d);
                self.dirs.insert(format!("{to}{}", &d[from.len()..]));
            }
            let inside_files: Vec<String> = self
                .files
                .keys()
                .filter(|f| path::is_inside(from, f))
                .cloned()
                .collect();
            for f in inside_files {
                if let Some(contents) = self.files.remove(&f) {
                    self.files.insert(format!("{to}{}", &f[from.len()..]), contents);
                }
            }
        }
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "store.test.rs"]
mod tests;
