//! End-to-end session tests.
//!
//! These go through [`spawn_session`]: real shell worker, real host
//! service, real channels. The display side of each test sends configure,
//! run, and abort envelopes and asserts on the frames that come back.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use sandbar_git::CommitDetail;
use sandbar_git::CommitInfo;
use sandbar_git::Credential;
use sandbar_git::EngineError;
use sandbar_git::MemoryEngine;
use sandbar_git::PushSummary;
use sandbar_git::RepoEngine;
use sandbar_git::StaticCredentials;
use sandbar_git::SyncSummary;
use sandbar_git::WorkTreeStatus;
use sandbar_host::SessionHandles;
use sandbar_host::spawn_session;
use sandbar_protocol::CommandId;
use sandbar_protocol::DirEntry;
use sandbar_protocol::HostMessage;
use sandbar_protocol::OutputLimits;
use sandbar_protocol::RepoRef;
use sandbar_protocol::SessionSetup;
use sandbar_protocol::ShellMessage;
use sandbar_protocol::TRUNCATION_MARKER;
use sandbar_protocol::exit;

const REMOTE: &str = "https://git.example.com/team/demo.git";

fn setup(max_lines: i64) -> SessionSetup {
    SessionSetup {
        repo: RepoRef {
            name: "demo".to_string(),
            remote_url: REMOTE.to_string(),
            branch: "main".to_string(),
        },
        allowlist: Vec::new(),
        limits: OutputLimits {
            max_output_bytes: 200_000,
            max_output_lines: max_lines,
            timeout_secs: Some(120),
        },
    }
}

fn seeded_engine() -> Arc<MemoryEngine> {
    let engine = Arc::new(MemoryEngine::new(REMOTE));
    engine.seed_commit(
        "main",
        "Ada Example <ada@example.com>",
        "yesterday",
        "Initial import",
        &[("/README.md", "# demo\n")],
    );
    engine
}

fn credentials(tokens: &[&str]) -> Arc<StaticCredentials> {
    Arc::new(StaticCredentials::new(
        tokens
            .iter()
            .map(|token| Credential {
                host: "git.example.com".to_string(),
                token: token.to_string(),
            })
            .collect(),
    ))
}

/// The display side of a running session.
struct Session {
    handles: SessionHandles,
}

impl Session {
    async fn start(
        engine: Arc<dyn RepoEngine>,
        credentials: Arc<dyn sandbar_git::CredentialStore>,
        setup: SessionSetup,
    ) -> Self {
        let handles = spawn_session(engine, credentials);
        handles
            .commands
            .send(HostMessage::Configure { setup })
            .await
            .expect("send configure");
        Self { handles }
    }

    async fn run(&mut self, id: &str, line: &str) -> (Vec<String>, Vec<String>, i32) {
        self.handles
            .commands
            .send(HostMessage::Run {
                id: CommandId::from(id),
                cwd: "/".to_string(),
                line: line.to_string(),
            })
            .await
            .expect("send run");
        self.drain(id).await
    }

    /// Collect the command's stdout and stderr frames until it exits.
    async fn drain(&mut self, id: &str) -> (Vec<String>, Vec<String>, i32) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), self.handles.events.recv())
                .await
                .expect("frame within 5s")
                .expect("session alive");
            match frame {
                ShellMessage::Stdout { id: owner, text } if owner.as_str() == id => {
                    stdout.push(text);
                }
                ShellMessage::Stderr { id: owner, text } if owner.as_str() == id => {
                    stderr.push(text);
                }
                ShellMessage::Exited { id: owner, code } if owner.as_str() == id => {
                    return (stdout, stderr, code);
                }
                _ => {}
            }
        }
    }
}

#[tokio::test]
async fn mkdir_touch_cat_round_trip() {
    let mut session = Session::start(seeded_engine(), credentials(&["good"]), setup(1_000)).await;

    let (_, _, code) = session.run("c1", "mkdir /a").await;
    assert_eq!(code, exit::SUCCESS);
    let (_, _, code) = session.run("c2", "touch /a/b.txt").await;
    assert_eq!(code, exit::SUCCESS);

    let (stdout, stderr, code) = session.run("c3", "cat /a/b.txt").await;
    assert_eq!(code, exit::SUCCESS);
    assert_eq!(stdout, Vec::<String>::new());
    assert_eq!(stderr, Vec::<String>::new());
}

#[tokio::test]
async fn copied_repository_content_reads_back() {
    let mut session = Session::start(seeded_engine(), credentials(&["good"]), setup(1_000)).await;

    let (_, _, code) = session.run("c1", "cp /README.md /copy.md").await;
    assert_eq!(code, exit::SUCCESS);

    let (stdout, _, code) = session.run("c2", "cat /copy.md").await;
    assert_eq!(code, exit::SUCCESS);
    assert_eq!(stdout, vec!["# demo\n".to_string()]);
}

#[tokio::test]
async fn non_recursive_rm_of_a_populated_directory_is_refused() {
    let mut session = Session::start(seeded_engine(), credentials(&["good"]), setup(1_000)).await;
    session.run("c1", "mkdir /a").await;
    session.run("c2", "touch /a/b.txt").await;

    let (_, stderr, code) = session.run("c3", "rm /a").await;
    assert_eq!(code, exit::FAILURE);
    assert_eq!(stderr, vec!["rm: /a: directory not empty\n".to_string()]);

    let (_, _, code) = session.run("c4", "rm -r /a").await;
    assert_eq!(code, exit::SUCCESS);

    // The subtree is gone; listing it now fails.
    let (_, stderr, code) = session.run("c5", "ls /a").await;
    assert_eq!(code, exit::FAILURE);
    assert_eq!(stderr, vec!["ls: /a: not found\n".to_string()]);
}

#[tokio::test]
async fn over_budget_output_is_truncated_once_end_to_end() {
    let engine = Arc::new(MemoryEngine::new(REMOTE));
    let ten_lines = (1..=10).fold(String::new(), |mut s, n| {
        s.push_str(&format!("line {n}\n"));
        s
    });
    engine.seed_commit(
        "main",
        "Ada Example <ada@example.com>",
        "yesterday",
        "Add a long file",
        &[("/long.txt", ten_lines.as_str())],
    );
    let mut session = Session::start(engine, credentials(&["good"]), setup(5)).await;

    let (stdout, _, code) = session.run("c1", "cat /long.txt").await;
    assert_eq!(code, exit::SUCCESS);
    assert_eq!(stdout.len(), 6);
    for (n, line) in stdout.iter().take(5).enumerate() {
        assert_eq!(line, &format!("line {}\n", n + 1));
    }
    assert_eq!(stdout[5], format!("{TRUNCATION_MARKER}\n"));
}

#[tokio::test]
async fn push_tries_every_stored_credential_in_order() {
    let engine = seeded_engine();
    engine.set_valid_token("third");
    engine.set_ahead(1);
    let mut session = Session::start(
        engine.clone(),
        credentials(&["first", "second", "third"]),
        setup(1_000),
    )
    .await;

    let (stdout, _, code) = session.run("c1", "git push").await;
    assert_eq!(code, exit::SUCCESS);
    assert_eq!(stdout[0], format!("To {REMOTE}\n"));
    assert_eq!(
        engine.attempted_tokens(),
        vec![
            "first".to_string(),
            "second".to_string(),
            "third".to_string()
        ]
    );
}

#[tokio::test]
async fn push_with_all_credentials_rejected_reports_each_attempt() {
    let engine = seeded_engine();
    engine.set_valid_token("something-else");
    let mut session = Session::start(
        engine.clone(),
        credentials(&["first", "second"]),
        setup(1_000),
    )
    .await;

    let (_, stderr, code) = session.run("c1", "git push").await;
    assert_eq!(code, exit::FAILURE);
    assert_eq!(
        stderr[0],
        "error: all credentials for host 'git.example.com' were rejected\n"
    );
    // One line per rejected token, in attempt order.
    assert_eq!(stderr.len(), 3);
    assert_eq!(engine.attempted_tokens().len(), 2);
}

/// An engine whose `status` never answers, so a `git status` command
/// stays in flight until the display aborts it.
struct StalledEngine {
    inner: MemoryEngine,
}

#[async_trait]
impl RepoEngine for StalledEngine {
    async fn status(&self, _branch: &str) -> Result<WorkTreeStatus, EngineError> {
        std::future::pending().await
    }

    async fn history(&self, branch: &str, depth: usize) -> Result<Vec<CommitInfo>, EngineError> {
        self.inner.history(branch, depth).await
    }

    async fn commit_detail(&self, rev: &str) -> Result<CommitDetail, EngineError> {
        self.inner.commit_detail(rev).await
    }

    async fn apply_patch_and_push(
        &self,
        branch: &str,
        patch: &str,
        message: &str,
        token: &str,
    ) -> Result<CommitInfo, EngineError> {
        self.inner
            .apply_patch_and_push(branch, patch, message, token)
            .await
    }

    async fn safe_push(
        &self,
        branch: &str,
        force: bool,
        token: &str,
    ) -> Result<PushSummary, EngineError> {
        self.inner.safe_push(branch, force, token).await
    }

    async fn sync_with_remote(
        &self,
        branch: &str,
        token: &str,
    ) -> Result<SyncSummary, EngineError> {
        self.inner.sync_with_remote(branch, token).await
    }

    async fn list_branches(&self) -> Result<Vec<String>, EngineError> {
        self.inner.list_branches().await
    }

    async fn list_repo_files(
        &self,
        refspec: &str,
        path: &str,
    ) -> Result<Option<Vec<DirEntry>>, EngineError> {
        self.inner.list_repo_files(refspec, path).await
    }

    async fn read_repo_file(
        &self,
        refspec: &str,
        path: &str,
    ) -> Result<Option<Vec<u8>>, EngineError> {
        self.inner.read_repo_file(refspec, path).await
    }

    async fn file_exists_at_commit(&self, rev: &str, path: &str) -> Result<bool, EngineError> {
        self.inner.file_exists_at_commit(rev, path).await
    }
}

#[tokio::test]
async fn abort_ends_a_stalled_command_with_130_and_no_stdout() {
    let inner = MemoryEngine::new(REMOTE);
    inner.seed_commit(
        "main",
        "Ada Example <ada@example.com>",
        "yesterday",
        "Initial import",
        &[("/README.md", "# demo\n")],
    );
    let engine = Arc::new(StalledEngine { inner });
    let mut session = Session::start(engine, credentials(&["good"]), setup(1_000)).await;

    let id = CommandId::from("c1");
    session
        .handles
        .commands
        .send(HostMessage::Run {
            id: id.clone(),
            cwd: "/".to_string(),
            line: "git status".to_string(),
        })
        .await
        .expect("send run");
    session
        .handles
        .commands
        .send(HostMessage::Abort { id })
        .await
        .expect("send abort");

    let (stdout, stderr, code) = session.drain("c1").await;
    assert_eq!(code, exit::ABORTED);
    assert_eq!(stdout, Vec::<String>::new());
    assert_eq!(stderr, vec!["^C\n".to_string()]);
}
