//! Shell-level git commands.
//!
//! [`GitHandler::handle`] takes the argument vector after the `git` token
//! and produces one [`GitReply`]: stdout lines, stderr lines, and the exit
//! code the shell will report. The handler owns no repository logic; it
//! resolves the session's current branch, formats engine results as
//! porcelain-style text, and wraps remote-facing calls in credential
//! retry. Push refusals from the engine's preflight each map to their own
//! message so the user can tell them apart.

use std::sync::Arc;

use tracing::debug;

use crate::credentials::CredentialError;
use crate::credentials::CredentialStore;
use crate::credentials::try_each_credential;
use crate::engine::EngineError;
use crate::engine::RepoEngine;
use sandbar_overlay::Overlay;
use sandbar_protocol::GitReply;
use sandbar_protocol::exit;
use sandbar_protocol::path;

const DEFAULT_LOG_DEPTH: usize = 10;

/// Git state that outlives individual commands.
#[derive(Debug, Clone)]
pub struct GitSession {
    /// Branch subcommands operate on; `checkout` moves it.
    pub branch: String,
    /// Paths staged by `add`, cleared by a successful commit.
    pub staged: Vec<String>,
}

impl GitSession {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            staged: Vec::new(),
        }
    }
}

/// Translates git argument vectors into engine calls.
pub struct GitHandler {
    engine: Arc<dyn RepoEngine>,
    credentials: Arc<dyn CredentialStore>,
    /// Host credentials are selected for, derived from the remote URL.
    remote_host: String,
}

impl GitHandler {
    pub fn new(
        engine: Arc<dyn RepoEngine>,
        credentials: Arc<dyn CredentialStore>,
        remote_url: &str,
    ) -> Self {
        Self {
            engine,
            credentials,
            remote_host: host_of(remote_url),
        }
    }

    /// Run one git command. Paths in git arguments are interpreted
    /// relative to the repository root.
    pub async fn handle(
        &self,
        session: &mut GitSession,
        overlay: &mut Overlay,
        args: &[String],
    ) -> GitReply {
        let Some((sub, rest)) = args.split_first() else {
            return GitReply::err(
                vec!["usage: git <subcommand> [args]".to_string()],
                exit::USAGE,
            );
        };
        debug!(subcommand = %sub, branch = %session.branch, "git command");
        match sub.as_str() {
            "status" => self.status(session).await,
            "log" => self.log(session, rest).await,
            "show" => self.show(session, rest).await,
            "diff" => self.diff(session).await,
            "branch" => self.branch(session).await,
            "checkout" => self.checkout(session, overlay, rest).await,
            "add" => self.add(session, overlay, rest).await,
            "commit" => self.commit(session, overlay, rest).await,
            "push" => self.push(session, rest).await,
            "pull" => self.pull(session).await,
            other => GitReply::ok(vec![format!("git: '{other}' is not yet supported")]),
        }
    }

    async fn status(&self, session: &GitSession) -> GitReply {
        let status = match self.engine.status(&session.branch).await {
            Ok(status) => status,
            Err(e) => return engine_failure(e),
        };
        let mut lines = vec![format!("On branch {}", status.branch)];
        if status.behind > 0 {
            lines.push(format!(
                "Your branch is behind 'origin/{}' by {} commit(s).",
                status.branch, status.behind
            ));
        }
        if status.ahead > 0 {
            lines.push(format!(
                "Your branch is ahead of 'origin/{}' by {} commit(s).",
                status.branch, status.ahead
            ));
        }
        if !session.staged.is_empty() {
            lines.push("Changes to be committed:".to_string());
            for staged in &session.staged {
                lines.push(format!("        {staged}"));
            }
        }
        if !status.dirty.is_empty() {
            lines.push("Changes not staged for commit:".to_string());
            for dirty in &status.dirty {
                lines.push(format!("        modified:   {dirty}"));
            }
        }
        if session.staged.is_empty() && status.dirty.is_empty() {
            lines.push("nothing to commit, working tree clean".to_string());
        }
        GitReply::ok(lines)
    }

    async fn log(&self, session: &GitSession, args: &[String]) -> GitReply {
        let depth = match args {
            [] => DEFAULT_LOG_DEPTH,
            [flag, n] if flag == "-n" => match n.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return GitReply::err(vec!["usage: git log [-n N]".to_string()], exit::USAGE),
            },
            _ => return GitReply::err(vec!["usage: git log [-n N]".to_string()], exit::USAGE),
        };
        let commits = match self.engine.history(&session.branch, depth).await {
            Ok(commits) => commits,
            Err(e) => return engine_failure(e),
        };
        let mut lines = Vec::new();
        for (i, commit) in commits.iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            lines.push(format!("commit {}", commit.id));
            lines.push(format!("Author: {}", commit.author));
            lines.push(format!("Date:   {}", commit.time));
            lines.push(String::new());
            lines.push(format!("    {}", commit.message));
        }
        GitReply::ok(lines)
    }

    async fn show(&self, session: &GitSession, args: &[String]) -> GitReply {
        match args {
            [] => self.show_commit(&session.branch).await,
            [spec] => match spec.split_once(':') {
                Some((rev, file)) => self.show_file(rev, file).await,
                None => self.show_commit(spec).await,
            },
            _ => GitReply::err(
                vec!["usage: git show [<rev> | <rev>:<path>]".to_string()],
                exit::USAGE,
            ),
        }
    }

    async fn show_commit(&self, rev: &str) -> GitReply {
        let detail = match self.engine.commit_detail(rev).await {
            Ok(detail) => detail,
            Err(e) => return engine_failure(e),
        };
        let mut lines = vec![
            format!("commit {}", detail.info.id),
            format!("Author: {}", detail.info.author),
            format!("Date:   {}", detail.info.time),
            String::new(),
            format!("    {}", detail.info.message),
        ];
        if !detail.files.is_empty() {
            lines.push(String::new());
            lines.extend(detail.files.iter().cloned());
        }
        GitReply::ok(lines)
    }

    async fn show_file(&self, rev: &str, file: &str) -> GitReply {
        let repo_path = path::resolve("/", file);
        let exists = match self.engine.file_exists_at_commit(rev, &repo_path).await {
            Ok(exists) => exists,
            Err(e) => return engine_failure(e),
        };
        if !exists {
            return GitReply::err(
                vec![format!("fatal: path '{file}' does not exist in '{rev}'")],
                exit::FAILURE,
            );
        }
        match self.engine.read_repo_file(rev, &repo_path).await {
            Ok(Some(contents)) => GitReply::ok(
                String::from_utf8_lossy(&contents)
                    .lines()
                    .map(|line| line.to_string())
                    .collect(),
            ),
            Ok(None) => GitReply::err(
                vec![format!("fatal: path '{file}' does not exist in '{rev}'")],
                exit::FAILURE,
            ),
            Err(e) => engine_failure(e),
        }
    }

    /// Name-status summary of unstaged changes. Content-level diffs live
    /// in the engine, not here.
    async fn diff(&self, session: &GitSession) -> GitReply {
        let status = match self.engine.status(&session.branch).await {
            Ok(status) => status,
            Err(e) => return engine_failure(e),
        };
        GitReply::ok(
            status
                .dirty
                .iter()
                .map(|dirty| format!("M\t{dirty}"))
                .collect(),
        )
    }

    async fn branch(&self, session: &GitSession) -> GitReply {
        let branches = match self.engine.list_branches().await {
            Ok(branches) => branches,
            Err(e) => return engine_failure(e),
        };
        let mut lines = Vec::new();
        let mut current_listed = false;
        for branch in branches {
            if branch == session.branch {
                current_listed = true;
                lines.push(format!("* {branch}"));
            } else {
                lines.push(format!("  {branch}"));
            }
        }
        if !current_listed {
            lines.insert(0, format!("* {}", session.branch));
        }
        GitReply::ok(lines)
    }

    async fn checkout(
        &self,
        session: &mut GitSession,
        overlay: &mut Overlay,
        args: &[String],
    ) -> GitReply {
        let [target] = args else {
            return GitReply::err(vec!["usage: git checkout <branch>".to_string()], exit::USAGE);
        };
        match self.engine.list_branches().await {
            Ok(branches) if !branches.iter().any(|branch| branch == target) => {
                return GitReply::err(
                    vec![format!(
                        "error: pathspec '{target}' did not match any branch known to the repository"
                    )],
                    exit::FAILURE,
                );
            }
            Ok(_) => {
                session.branch = target.clone();
                overlay.set_branch(target.clone());
                GitReply::ok(vec![format!("Switched to branch '{target}'")])
            }
            Err(e) => {
                // Existence cannot be verified right now; switch anyway
                // and say so.
                session.branch = target.clone();
                overlay.set_branch(target.clone());
                GitReply {
                    stdout: vec![format!("Switched to branch '{target}'")],
                    stderr: vec![format!("warning: could not verify branch '{target}': {e}")],
                    code: exit::SUCCESS,
                }
            }
        }
    }

    async fn add(
        &self,
        session: &mut GitSession,
        overlay: &Overlay,
        args: &[String],
    ) -> GitReply {
        if args.is_empty() {
            return GitReply {
                stdout: Vec::new(),
                stderr: vec!["Nothing specified, nothing added.".to_string()],
                code: exit::SUCCESS,
            };
        }
        for arg in args {
            let repo_path = path::resolve("/", arg);
            if overlay.stat(&repo_path).await.is_err() {
                return GitReply::err(
                    vec![format!("fatal: pathspec '{arg}' did not match any files")],
                    exit::FAILURE,
                );
            }
            if !session.staged.contains(&repo_path) {
                session.staged.push(repo_path);
            }
        }
        GitReply::ok(Vec::new())
    }

    async fn commit(
        &self,
        session: &mut GitSession,
        overlay: &Overlay,
        args: &[String],
    ) -> GitReply {
        let mut patch_file = None;
        let mut message = None;
        let mut rest = args.iter();
        while let Some(arg) = rest.next() {
            match arg.as_str() {
                "--apply-patch" => match rest.next() {
                    Some(file) => patch_file = Some(file.clone()),
                    None => return commit_usage(),
                },
                "-m" => match rest.next() {
                    Some(text) => message = Some(text.clone()),
                    None => return commit_usage(),
                },
                _ => return commit_usage(),
            }
        }
        let (Some(patch_file), Some(message)) = (patch_file, message) else {
            return commit_usage();
        };

        let repo_path = path::resolve("/", &patch_file);
        let patch = match overlay.read_file(&repo_path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                return GitReply::err(
                    vec![format!("error: cannot read patch '{patch_file}': {e}")],
                    exit::FAILURE,
                );
            }
        };

        let engine = self.engine.clone();
        let branch = session.branch.clone();
        let outcome = try_each_credential(self.credentials.as_ref(), &self.remote_host, |token| {
            let engine = engine.clone();
            let branch = branch.clone();
            let patch = patch.clone();
            let message = message.clone();
            async move {
                engine
                    .apply_patch_and_push(&branch, &patch, &message, &token)
                    .await
            }
        })
        .await;
        match outcome {
            Ok(commit) => {
                session.staged.clear();
                let short = &commit.id[..commit.id.len().min(7)];
                GitReply::ok(vec![format!("[{branch} {short}] {message}")])
            }
            Err(e) => credential_failure(e),
        }
    }

    async fn push(&self, session: &GitSession, args: &[String]) -> GitReply {
        let force = match args {
            [] => false,
            [flag] if flag == "--force" || flag == "-f" => true,
            _ => return GitReply::err(vec!["usage: git push [--force]".to_string()], exit::USAGE),
        };
        let engine = self.engine.clone();
        let branch = session.branch.clone();
        let outcome = try_each_credential(self.credentials.as_ref(), &self.remote_host, |token| {
            let engine = engine.clone();
            let branch = branch.clone();
            async move { engine.safe_push(&branch, force, &token).await }
        })
        .await;
        match outcome {
            Ok(summary) => GitReply::ok(vec![
                format!("To {}", summary.remote),
                format!("   {branch} -> {branch}", branch = summary.branch),
            ]),
            Err(e) => credential_failure(e),
        }
    }

    async fn pull(&self, session: &GitSession) -> GitReply {
        let engine = self.engine.clone();
        let branch = session.branch.clone();
        let outcome = try_each_credential(self.credentials.as_ref(), &self.remote_host, |token| {
            let engine = engine.clone();
            let branch = branch.clone();
            async move { engine.sync_with_remote(&branch, &token).await }
        })
        .await;
        match outcome {
            Ok(sync) if !sync.updated => GitReply::ok(vec!["Already up to date.".to_string()]),
            Ok(sync) => GitReply::ok(vec![
                "Fast-forward".to_string(),
                format!(
                    "Updated '{}' with {} new commit(s).",
                    session.branch, sync.commits
                ),
            ]),
            Err(e) => credential_failure(e),
        }
    }
}

fn commit_usage() -> GitReply {
    GitReply::err(
        vec!["usage: git commit --apply-patch <file> -m <message>".to_string()],
        exit::USAGE,
    )
}

/// Push preflight refusals each get their own message and a usage-class
/// exit; everything else is a plain failure.
fn engine_failure(e: EngineError) -> GitReply {
    match e {
        EngineError::DirtyWorkTree => GitReply::err(
            vec![
                "error: uncommitted changes in working tree; commit or discard them before pushing"
                    .to_string(),
            ],
            exit::USAGE,
        ),
        EngineError::BranchBehind => GitReply::err(
            vec!["error: the local branch is behind its remote; pull before pushing".to_string()],
            exit::USAGE,
        ),
        EngineError::HistoryRewrite => GitReply::err(
            vec!["error: push would rewrite remote history; pass --force to confirm".to_string()],
            exit::USAGE,
        ),
        other => GitReply::err(vec![format!("error: {other}")], exit::FAILURE),
    }
}

/// Keeps which-host-had-no-credentials distinct from all-rejected, and
/// preserves each rejection so the user can tell which token failed why.
fn credential_failure(e: CredentialError) -> GitReply {
    match e {
        CredentialError::Engine(e) => engine_failure(e),
        CredentialError::NoCredentials { host } => GitReply::err(
            vec![format!("error: no credentials stored for host '{host}'")],
            exit::FAILURE,
        ),
        CredentialError::AllRejected { host, attempts } => {
            let mut lines = vec![format!(
                "error: all credentials for host '{host}' were rejected"
            )];
            for attempt in attempts {
                lines.push(format!("  {}: {}", attempt.credential_host, attempt.reason));
            }
            GitReply::err(lines, exit::FAILURE)
        }
    }
}

/// The host component of a remote URL. Understands `scheme://` URLs with
/// optional userinfo and port, and scp-style `user@host:path` remotes.
fn host_of(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split(['/', '?']).next().unwrap_or(rest);
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = authority.split_once(':').map_or(authority, |(host, _)| host);
    host.to_string()
}

#[cfg(test)]
#[path = "handler.test.rs"]
mod tests;
