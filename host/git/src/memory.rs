//! In-memory repository engine.
//!
//! A deterministic stand-in for the real domain engine, used by the
//! handler tests and the demo binary. History, trees, and remote state are
//! plain maps behind a mutex; patches are recorded as touched files, not
//! textually applied. Every token presented to a remote-facing call is
//! logged so tests can assert the retry order.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::engine::CommitDetail;
use crate::engine::CommitInfo;
use crate::engine::EngineError;
use crate::engine::PushSummary;
use crate::engine::RepoEngine;
use crate::engine::SyncSummary;
use crate::engine::WorkTreeStatus;
use sandbar_protocol::DirEntry;
use sandbar_protocol::NodeKind;
use sandbar_protocol::path;

#[derive(Debug, Clone, Default)]
struct BranchState {
    /// Newest first.
    history: Vec<CommitInfo>,
    /// Tree at the branch head.
    tree: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Clone)]
struct CommitRecord {
    detail: CommitDetail,
    /// Tree at this commit.
    tree: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
struct Inner {
    remote_url: String,
    branches: BTreeMap<String, BranchState>,
    commits: BTreeMap<String, CommitRecord>,
    valid_token: Option<String>,
    attempts: Vec<String>,
    dirty: Vec<String>,
    ahead: i64,
    behind: i64,
    diverged: bool,
    seed: u64,
}

/// See the module docs; construct with [`MemoryEngine::new`], seed with
/// the `seed_commit`/`set_*` methods, then hand it out as
/// `Arc<dyn RepoEngine>`.
#[derive(Debug)]
pub struct MemoryEngine {
    inner: Mutex<Inner>,
}

impl MemoryEngine {
    pub fn new(remote_url: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                remote_url: remote_url.into(),
                seed: 0x5eed,
                ..Inner::default()
            }),
        }
    }

    /// Append a commit to a branch (creating the branch when absent),
    /// updating its tree with the given files. Returns the new commit id.
    pub fn seed_commit(
        &self,
        branch: &str,
        author: &str,
        time: &str,
        message: &str,
        files: &[(&str, &str)],
    ) -> String {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("lock poisoned");
        let id = pseudo_sha(&mut inner.seed);
        let state = inner.branches.entry(branch.to_string()).or_default();
        for (file, contents) in files {
            state
                .tree
                .insert(path::normalize(file), contents.as_bytes().to_vec());
        }
        let info = CommitInfo {
            id: id.clone(),
            author: author.to_string(),
            time: time.to_string(),
            message: message.to_string(),
        };
        state.history.insert(0, info.clone());
        let tree = state.tree.clone();
        inner.commits.insert(
            id.clone(),
            CommitRecord {
                detail: CommitDetail {
                    info,
                    files: files
                        .iter()
                        .map(|(file, _)| path::normalize(file))
                        .collect(),
                },
                tree,
            },
        );
        id
    }

    /// The only token the fake remote accepts.
    pub fn set_valid_token(&self, token: &str) {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.valid_token = Some(token.to_string());
    }

    /// Mark worktree paths as modified.
    pub fn set_dirty(&self, paths: &[&str]) {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.dirty = paths.iter().map(|p| p.to_string()).collect();
    }

    /// Pretend the local branch has `n` unpushed commits.
    pub fn set_ahead(&self, n: i64) {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.ahead = n;
    }

    /// Pretend the remote has `n` commits the local branch lacks.
    pub fn set_behind(&self, n: i64) {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.behind = n;
    }

    /// Pretend local and remote histories have diverged, so a push
    /// without force would rewrite remote history.
    pub fn set_diverged(&self, diverged: bool) {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.diverged = diverged;
    }

    /// Every token presented to a remote-facing call, in order.
    pub fn attempted_tokens(&self) -> Vec<String> {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("lock poisoned");
        inner.attempts.clone()
    }
}

fn check_token(inner: &mut Inner, token: &str) -> Result<(), EngineError> {
    inner.attempts.push(token.to_string());
    match &inner.valid_token {
        Some(valid) if valid == token => Ok(()),
        _ => Err(EngineError::Auth {
            reason: "token rejected by remote".to_string(),
        }),
    }
}

fn require_branch<'a>(inner: &'a Inner, branch: &str) -> Result<&'a BranchState, EngineError> {
    inner
        .branches
        .get(branch)
        .ok_or_else(|| EngineError::UnknownBranch(branch.to_string()))
}

/// Resolve a branch name or commit id to the tree it names.
fn resolve_tree<'a>(inner: &'a Inner, refspec: &str) -> Option<&'a BTreeMap<String, Vec<u8>>> {
    if let Some(state) = inner.branches.get(refspec) {
        return Some(&state.tree);
    }
    inner.commits.get(refspec).map(|record| &record.tree)
}

/// 40 hex digits from a counter run through a mixing step, so seeded ids
/// look like commit ids without being random across runs.
fn pseudo_sha(seed: &mut u64) -> String {
    *seed = seed.wrapping_add(1);
    let a = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let b = a.rotate_left(31).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    let c = (b ^ (b >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    format!("{a:016x}{b:016x}{:08x}", (c >> 32) as u32)
}

#[async_trait]
impl RepoEngine for MemoryEngine {
    async fn status(&self, branch: &str) -> Result<WorkTreeStatus, EngineError> {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("lock poisoned");
        require_branch(&inner, branch)?;
        Ok(WorkTreeStatus {
            branch: branch.to_string(),
            dirty: inner.dirty.clone(),
            ahead: inner.ahead,
            behind: inner.behind,
        })
    }

    async fn history(&self, branch: &str, depth: usize) -> Result<Vec<CommitInfo>, EngineError> {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("lock poisoned");
        let state = require_branch(&inner, branch)?;
        Ok(state.history.iter().take(depth).cloned().collect())
    }

    async fn commit_detail(&self, rev: &str) -> Result<CommitDetail, EngineError> {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("lock poisoned");
        if let Some(record) = inner.commits.get(rev) {
            return Ok(record.detail.clone());
        }
        // A branch name resolves to its head commit.
        if let Some(state) = inner.branches.get(rev)
            && let Some(head) = state.history.first()
            && let Some(record) = inner.commits.get(&head.id)
        {
            return Ok(record.detail.clone());
        }
        Err(EngineError::UnknownRevision(rev.to_string()))
    }

    async fn apply_patch_and_push(
        &self,
        branch: &str,
        patch: &str,
        message: &str,
        token: &str,
    ) -> Result<CommitInfo, EngineError> {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("lock poisoned");
        require_branch(&inner, branch)?;
        check_token(&mut inner, token)?;

        let files: Vec<String> = patch
            .lines()
            .filter_map(|line| line.strip_prefix("+++ b/"))
            .map(|file| path::resolve("/", file))
            .collect();
        let id = pseudo_sha(&mut inner.seed);
        let info = CommitInfo {
            id: id.clone(),
            author: "sandbar <sandbar@localhost>".to_string(),
            time: "just now".to_string(),
            message: message.to_string(),
        };
        let Some(state) = inner.branches.get_mut(branch) else {
            return Err(EngineError::UnknownBranch(branch.to_string()));
        };
        state.history.insert(0, info.clone());
        let tree = state.tree.clone();
        inner.commits.insert(
            id,
            CommitRecord {
                detail: CommitDetail {
                    info: info.clone(),
                    files,
                },
                tree,
            },
        );
        Ok(info)
    }

    async fn safe_push(
        &self,
        branch: &str,
        force: bool,
        token: &str,
    ) -> Result<PushSummary, EngineError> {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("lock poisoned");
        require_branch(&inner, branch)?;
        if !inner.dirty.is_empty() {
            return Err(EngineError::DirtyWorkTree);
        }
        if inner.behind > 0 {
            return Err(EngineError::BranchBehind);
        }
        if inner.diverged && !force {
            return Err(EngineError::HistoryRewrite);
        }
        check_token(&mut inner, token)?;
        let commits = inner.ahead;
        inner.ahead = 0;
        inner.diverged = false;
        Ok(PushSummary {
            remote: inner.remote_url.clone(),
            branch: branch.to_string(),
            commits,
        })
    }

    async fn sync_with_remote(
        &self,
        branch: &str,
        token: &str,
    ) -> Result<SyncSummary, EngineError> {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("lock poisoned");
        require_branch(&inner, branch)?;
        check_token(&mut inner, token)?;
        if inner.behind == 0 {
            return Ok(SyncSummary {
                updated: false,
                commits: 0,
            });
        }
        let commits = inner.behind;
        inner.behind = 0;
        Ok(SyncSummary {
            updated: true,
            commits,
        })
    }

    async fn list_branches(&self) -> Result<Vec<String>, EngineError> {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("lock poisoned");
        Ok(inner.branches.keys().cloned().collect())
    }

    async fn list_repo_files(
        &self,
        refspec: &str,
        path: &str,
    ) -> Result<Option<Vec<DirEntry>>, EngineError> {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("lock poisoned");
        let Some(tree) = resolve_tree(&inner, refspec) else {
            return Ok(None);
        };
        if tree.contains_key(path) {
            // A file, not a directory.
            return Ok(None);
        }
        let mut seen: BTreeMap<String, NodeKind> = BTreeMap::new();
        for key in tree.keys() {
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

    async fn read_repo_file(
        &self,
        refspec: &str,
        path: &str,
    ) -> Result<Option<Vec<u8>>, EngineError> {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("lock poisoned");
        Ok(resolve_tree(&inner, refspec).and_then(|tree| tree.get(path).cloned()))
    }

    async fn file_exists_at_commit(&self, rev: &str, path: &str) -> Result<bool, EngineError> {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("lock poisoned");
        match resolve_tree(&inner, rev) {
            Some(tree) => Ok(tree.contains_key(path)),
            None => Err(EngineError::UnknownRevision(rev.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "memory.test.rs"]
mod tests;
