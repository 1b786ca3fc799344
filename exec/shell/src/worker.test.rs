use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::ShellWorker;
use super::deadline_for;
use super::supervise;
use crate::output::OutputSink;
use crate::runs::RunTable;
use sandbar_protocol::CommandId;
use sandbar_protocol::FsReply;
use sandbar_protocol::HostMessage;
use sandbar_protocol::NodeInfo;
use sandbar_protocol::NodeKind;
use sandbar_protocol::NoticeSeverity;
use sandbar_protocol::OutputLimits;
use sandbar_protocol::RepoRef;
use sandbar_protocol::SessionSetup;
use sandbar_protocol::ShellMessage;
use sandbar_protocol::TRUNCATION_MARKER;

fn setup(max_lines: i64, timeout_secs: Option<i64>) -> SessionSetup {
    SessionSetup {
        repo: RepoRef {
            name: "demo".to_string(),
            remote_url: "https://git.example.com/demo.git".to_string(),
            branch: "main".to_string(),
        },
        allowlist: Vec::new(),
        limits: OutputLimits {
            max_output_bytes: 100_000,
            max_output_lines: max_lines,
            timeout_secs,
        },
    }
}

struct Harness {
    host_tx: mpsc::Sender<HostMessage>,
    host_rx: mpsc::Receiver<ShellMessage>,
}

impl Harness {
    fn start() -> Self {
        let (host_tx, shell_rx) = mpsc::channel(32);
        let (shell_tx, host_rx) = mpsc::channel(32);
        tokio::spawn(ShellWorker::new(shell_rx, shell_tx).run());
        Self { host_tx, host_rx }
    }

    async fn configure(&self, setup: SessionSetup) {
        self.host_tx
            .send(HostMessage::Configure { setup })
            .await
            .expect("send configure");
    }

    async fn run(&self, id: &str, cwd: &str, line: &str) {
        self.host_tx
            .send(HostMessage::Run {
                id: CommandId::from(id),
                cwd: cwd.to_string(),
                line: line.to_string(),
            })
            .await
            .expect("send run");
    }

    async fn recv(&mut self) -> ShellMessage {
        self.host_rx.recv().await.expect("shell frame")
    }
}

fn stdout_text(message: ShellMessage) -> String {
    match message {
        ShellMessage::Stdout { text, .. } => text,
        other => panic!("expected stdout, got {other:?}"),
    }
}

fn stderr_text(message: ShellMessage) -> String {
    match message {
        ShellMessage::Stderr { text, .. } => text,
        other => panic!("expected stderr, got {other:?}"),
    }
}

fn exit_code(message: ShellMessage) -> i32 {
    match message {
        ShellMessage::Exited { code, .. } => code,
        other => panic!("expected exited, got {other:?}"),
    }
}

#[tokio::test]
async fn echo_emits_output_then_exactly_one_exit() {
    let mut h = Harness::start();
    h.configure(setup(100, Some(120))).await;
    h.run("c1", "/", "echo hello world").await;

    let frame = h.recv().await;
    assert_eq!(stdout_text(frame), "hello world\n");
    let frame = h.recv().await;
    assert_eq!(exit_code(frame), 0);
}

#[tokio::test]
async fn run_before_configure_fails_with_a_terminal_exit() {
    let mut h = Harness::start();
    h.run("c1", "/", "echo hello").await;

    let frame = h.recv().await;
    assert_eq!(stderr_text(frame), "sandbar: session not configured\n");
    let frame = h.recv().await;
    assert_eq!(exit_code(frame), 1);
}

#[tokio::test]
async fn unknown_command_exits_127() {
    let mut h = Harness::start();
    h.configure(setup(100, Some(120))).await;
    h.run("c1", "/", "make all").await;

    let frame = h.recv().await;
    assert_eq!(stderr_text(frame), "make: command not found\n");
    let frame = h.recv().await;
    assert_eq!(exit_code(frame), 127);
}

#[tokio::test]
async fn unterminated_quote_is_a_usage_error() {
    let mut h = Harness::start();
    h.configure(setup(100, Some(120))).await;
    h.run("c1", "/", "echo 'dangling").await;

    let frame = h.recv().await;
    assert!(stderr_text(frame).starts_with("sandbar: "));
    let frame = h.recv().await;
    assert_eq!(exit_code(frame), 2);
}

#[tokio::test]
async fn relative_paths_resolve_against_the_run_cwd() {
    let mut h = Harness::start();
    h.configure(setup(100, Some(120))).await;
    h.run("c1", "/docs", "cat notes.txt").await;

    let (request, op) = match h.recv().await {
        ShellMessage::FsRequest { id, op } => (id, op),
        other => panic!("expected fs request, got {other:?}"),
    };
    assert_eq!(
        op,
        sandbar_protocol::FsOp::ReadFile {
            path: "/docs/notes.txt".to_string()
        }
    );
    h.host_tx
        .send(HostMessage::FsResult {
            id: request,
            outcome: Ok(FsReply::File {
                contents: b"remember\n".to_vec(),
            }),
        })
        .await
        .expect("send result");

    let frame = h.recv().await;
    assert_eq!(stdout_text(frame), "remember\n");
    let frame = h.recv().await;
    assert_eq!(exit_code(frame), 0);
}

#[tokio::test]
async fn cd_broadcasts_the_new_working_directory() {
    let mut h = Harness::start();
    h.configure(setup(100, Some(120))).await;
    h.run("c1", "/", "cd docs").await;

    let request = match h.recv().await {
        ShellMessage::FsRequest { id, .. } => id,
        other => panic!("expected fs request, got {other:?}"),
    };
    h.host_tx
        .send(HostMessage::FsResult {
            id: request,
            outcome: Ok(FsReply::Stat {
                info: NodeInfo {
                    kind: NodeKind::Dir,
                    size: 0,
                },
            }),
        })
        .await
        .expect("send result");

    match h.recv().await {
        ShellMessage::WorkingDir { cwd } => assert_eq!(cwd, "/docs"),
        other => panic!("expected working dir, got {other:?}"),
    }
    let frame = h.recv().await;
    assert_eq!(exit_code(frame), 0);
}

#[tokio::test]
async fn an_empty_run_cwd_uses_the_session_directory() {
    let mut h = Harness::start();
    h.configure(setup(100, Some(120))).await;

    // cd into /docs first.
    h.run("c1", "/", "cd docs").await;
    let request = match h.recv().await {
        ShellMessage::FsRequest { id, .. } => id,
        other => panic!("expected fs request, got {other:?}"),
    };
    h.host_tx
        .send(HostMessage::FsResult {
            id: request,
            outcome: Ok(FsReply::Stat {
                info: NodeInfo {
                    kind: NodeKind::Dir,
                    size: 0,
                },
            }),
        })
        .await
        .expect("send result");
    let _working_dir = h.recv().await;
    assert_eq!(exit_code(h.recv().await), 0);

    // A run with no cwd lands in the directory the session tracked.
    h.run("c2", "", "pwd").await;
    assert_eq!(stdout_text(h.recv().await), "/docs\n");
    assert_eq!(exit_code(h.recv().await), 0);
}

#[tokio::test]
async fn output_over_the_line_budget_is_truncated_once() {
    let mut h = Harness::start();
    h.configure(setup(2, Some(120))).await;
    h.run("c1", "/", "cat big.txt").await;

    let request = match h.recv().await {
        ShellMessage::FsRequest { id, .. } => id,
        other => panic!("expected fs request, got {other:?}"),
    };
    h.host_tx
        .send(HostMessage::FsResult {
            id: request,
            outcome: Ok(FsReply::File {
                contents: b"1\n2\n3\n4\n5\n".to_vec(),
            }),
        })
        .await
        .expect("send result");

    assert_eq!(stdout_text(h.recv().await), "1\n");
    assert_eq!(stdout_text(h.recv().await), "2\n");
    assert_eq!(
        stdout_text(h.recv().await),
        format!("{TRUNCATION_MARKER}\n")
    );
    assert_eq!(exit_code(h.recv().await), 0);
}

#[tokio::test]
async fn abort_interrupts_a_command_stuck_on_the_host() {
    let mut h = Harness::start();
    h.configure(setup(100, Some(120))).await;
    h.run("c1", "/", "cat /never.txt").await;

    // The command is now parked on its fs round trip.
    let request = match h.recv().await {
        ShellMessage::FsRequest { id, .. } => id,
        other => panic!("expected fs request, got {other:?}"),
    };
    h.host_tx
        .send(HostMessage::Abort {
            id: CommandId::from("c1"),
        })
        .await
        .expect("send abort");

    assert_eq!(stderr_text(h.recv().await), "^C\n");
    assert_eq!(exit_code(h.recv().await), 130);

    // The late answer must produce no output; prove it by running another
    // command and seeing only its frames.
    h.host_tx
        .send(HostMessage::FsResult {
            id: request,
            outcome: Ok(FsReply::File {
                contents: b"too late\n".to_vec(),
            }),
        })
        .await
        .expect("send result");
    h.run("c2", "/", "echo after").await;
    assert_eq!(stdout_text(h.recv().await), "after\n");
    assert_eq!(exit_code(h.recv().await), 0);
}

#[tokio::test]
async fn abort_after_truncation_still_shows_the_interrupt() {
    let mut h = Harness::start();
    h.configure(setup(1, Some(120))).await;
    h.run("c1", "/", "cat /a.txt /b.txt").await;

    // The first file spends the whole line budget.
    let request = match h.recv().await {
        ShellMessage::FsRequest { id, .. } => id,
        other => panic!("expected fs request, got {other:?}"),
    };
    h.host_tx
        .send(HostMessage::FsResult {
            id: request,
            outcome: Ok(FsReply::File {
                contents: b"1\n2\n".to_vec(),
            }),
        })
        .await
        .expect("send result");
    assert_eq!(stdout_text(h.recv().await), "1\n");
    assert_eq!(
        stdout_text(h.recv().await),
        format!("{TRUNCATION_MARKER}\n")
    );

    // Now parked on the second file; abort it.
    let _second = h.recv().await;
    h.host_tx
        .send(HostMessage::Abort {
            id: CommandId::from("c1"),
        })
        .await
        .expect("send abort");

    assert_eq!(stderr_text(h.recv().await), "^C\n");
    assert_eq!(exit_code(h.recv().await), 130);
}

#[tokio::test]
async fn duplicate_live_id_is_refused_without_an_exit() {
    let mut h = Harness::start();
    h.configure(setup(100, Some(120))).await;
    h.run("c1", "/", "cat /never.txt").await;
    let _request = h.recv().await;

    h.run("c1", "/", "echo again").await;
    match h.recv().await {
        ShellMessage::Notice { severity, message } => {
            assert_eq!(severity, NoticeSeverity::Warning);
            assert!(message.contains("still live"), "message: {message}");
        }
        other => panic!("expected notice, got {other:?}"),
    }

    // The original run still owns the id and exits exactly once.
    h.host_tx
        .send(HostMessage::Abort {
            id: CommandId::from("c1"),
        })
        .await
        .expect("send abort");
    assert_eq!(stderr_text(h.recv().await), "^C\n");
    assert_eq!(exit_code(h.recv().await), 130);
}

#[tokio::test(start_paused = true)]
async fn deadline_expiry_exits_124() {
    let mut h = Harness::start();
    h.configure(setup(100, Some(1))).await;
    h.run("c1", "/", "cat /never.txt").await;
    let _request = h.recv().await;

    // Nothing answers the fs request; the paused clock runs the deadline
    // down as soon as the runtime goes idle.
    assert_eq!(stderr_text(h.recv().await), "command timed out after 1s\n");
    assert_eq!(exit_code(h.recv().await), 124);
}

#[tokio::test]
async fn insecure_fetch_without_an_allowlist_is_refused() {
    let mut h = Harness::start();
    h.configure(setup(100, Some(120))).await;
    h.run("c1", "/", "curl http://plain.example.com/data").await;

    let text = stderr_text(h.recv().await);
    assert!(text.contains("not permitted"), "text: {text}");
    assert_eq!(exit_code(h.recv().await), 2);
}

#[tokio::test]
async fn repeated_configure_is_ignored_with_a_warning() {
    let mut h = Harness::start();
    h.configure(setup(100, Some(120))).await;
    h.configure(setup(5, Some(1))).await;

    match h.recv().await {
        ShellMessage::Notice { severity, message } => {
            assert_eq!(severity, NoticeSeverity::Warning);
            assert!(message.contains("already configured"), "message: {message}");
        }
        other => panic!("expected notice, got {other:?}"),
    }

    // The original limits still apply.
    h.run("c1", "/", "echo still here").await;
    assert_eq!(stdout_text(h.recv().await), "still here\n");
    assert_eq!(exit_code(h.recv().await), 0);
}

#[tokio::test]
async fn a_panicking_command_still_settles_with_an_exit() {
    let (tx, mut rx) = mpsc::channel(8);
    let limits = OutputLimits {
        max_output_bytes: 100_000,
        max_output_lines: 100,
        timeout_secs: None,
    };
    let id = CommandId::from("boom");
    let sink = OutputSink::new(id.clone(), tx, &limits);
    let runs = Arc::new(RunTable::new());
    runs.register(&id);

    supervise(
        sink,
        id.clone(),
        async { panic!("kaboom") },
        CancellationToken::new(),
        None,
        runs.clone(),
    )
    .await;

    assert_eq!(
        stderr_text(rx.recv().await.expect("frame")),
        "internal error: command failed\n"
    );
    assert_eq!(exit_code(rx.recv().await.expect("frame")), 1);
    assert!(!runs.is_live(&id));
}

#[test]
fn git_commands_get_the_extended_deadline_floor() {
    assert_eq!(
        deadline_for("git push origin", Some(10)),
        Some(Duration::from_secs(300))
    );
    assert_eq!(
        deadline_for("git push origin", Some(900)),
        Some(Duration::from_secs(900))
    );
    assert_eq!(deadline_for("echo hi", Some(10)), Some(Duration::from_secs(10)));
    assert_eq!(deadline_for("git push origin", None), None);
    assert_eq!(deadline_for("echo hi", None), None);
}
